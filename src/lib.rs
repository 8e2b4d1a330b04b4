//! Sentiment Compass: classify text signals with an external LLM, keep them in
//! a session store and fold them into dashboard metrics, chart views and
//! exports.

pub mod api_types;
pub mod controller;
pub mod export;
pub mod ingest;
pub mod llm;
pub mod metrics;
pub mod models;
pub mod normalize;
pub mod prompts;
pub mod render;
pub mod store;
pub mod viz_export;

pub use controller::{Dashboard, InputMode, Outcome, ViewMode};
pub use llm::{AwfulJadeService, ModelError, ModelService};
pub use metrics::DashboardMetrics;
pub use models::{AnalysisRecord, AuthorAge, BatchStats, Sentiment, Source};
pub use store::RecordStore;
