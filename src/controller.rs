//! The dashboard's single state container. Every mutation goes through a
//! named operation; model calls are awaited one at a time behind a busy flag.

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::ingest::{ingest_batch, ingest_pulse, parse_upload, split_manual_input};
use crate::llm::ModelService;
use crate::metrics::DashboardMetrics;
use crate::models::{AnalysisRecord, Source};
use crate::normalize::{parse_response, validate, ValidatedResult};
use crate::prompts::{user_analyze, user_social_pulse};
use crate::store::RecordStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Landscape,
    Grid,
    Compare,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Manual,
    Social,
}

/// What a request did to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Blank input; nothing was sent.
    Skipped,
    /// Another request is still in flight.
    Busy,
    /// The model call or its response failed; the store is unchanged.
    Failed(String),
    /// Number of records prepended (may be 0).
    Ingested(usize),
}

/// Holds the busy flag for the lifetime of one model call. Dropping it clears
/// the flag, including when the request future itself is dropped mid-await.
struct BusyGuard<'a> {
    flag: &'a mut bool,
}

impl<'a> BusyGuard<'a> {
    fn claim(flag: &'a mut bool) -> Self {
        *flag = true;
        Self { flag }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        *self.flag = false;
    }
}

pub struct Dashboard {
    store: RecordStore,
    selected: Option<String>,
    view_mode: ViewMode,
    input_mode: InputMode,
    platforms: Vec<Source>,
    in_flight: bool,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::with_store(RecordStore::new())
    }
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(store: RecordStore) -> Self {
        Self {
            store,
            selected: None,
            view_mode: ViewMode::default(),
            input_mode: InputMode::default(),
            platforms: vec![Source::X, Source::TikTok],
            in_flight: false,
        }
    }

    /* ------------------------------ accessors ------------------------------ */

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn records(&self) -> &[AnalysisRecord] {
        self.store.records()
    }

    pub fn metrics(&self) -> DashboardMetrics {
        DashboardMetrics::compute(self.store.records())
    }

    pub fn selected(&self) -> Option<&AnalysisRecord> {
        self.selected.as_deref().and_then(|id| self.store.get(id))
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn input_mode(&self) -> InputMode {
        self.input_mode
    }

    pub fn platforms(&self) -> &[Source] {
        &self.platforms
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight
    }

    /* ------------------------------ view state ----------------------------- */

    /// Returns false (and keeps the current selection) for an unknown id.
    pub fn select_record(&mut self, id: &str) -> bool {
        if self.store.get(id).is_some() {
            self.selected = Some(id.to_string());
            true
        } else {
            debug!("Select ignored - unknown id={}", id);
            false
        }
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.view_mode = mode;
    }

    pub fn set_input_mode(&mut self, mode: InputMode) {
        self.input_mode = mode;
    }

    pub fn set_platforms(&mut self, platforms: Vec<Source>) {
        self.platforms = platforms;
    }

    /// Add the platform if absent, remove it if present.
    pub fn toggle_platform(&mut self, platform: Source) {
        if let Some(pos) = self.platforms.iter().position(|p| *p == platform) {
            self.platforms.remove(pos);
        } else {
            self.platforms.push(platform);
        }
    }

    /* ------------------------------- requests ------------------------------ */

    /// Classify a manual submission (one text per substantive line).
    pub async fn analyze_text<S: ModelService + ?Sized>(&mut self, service: &S, input: &str) -> Outcome {
        let texts = split_manual_input(input);
        if texts.is_empty() {
            return Outcome::Skipped;
        }
        self.analyze_texts(service, texts).await
    }

    /// Classify the usable lines of an uploaded text file.
    pub async fn upload<S: ModelService + ?Sized>(&mut self, service: &S, contents: &str) -> Outcome {
        let lines = parse_upload(contents);
        if lines.is_empty() {
            info!("Upload contained no usable lines");
            return Outcome::Skipped;
        }
        self.analyze_texts(service, lines).await
    }

    async fn analyze_texts<S: ModelService + ?Sized>(&mut self, service: &S, texts: Vec<String>) -> Outcome {
        let source = Source::Manual;
        let prompt = user_analyze(&texts, &source);
        match self.request(service, &prompt).await {
            Ok(results) => {
                let batch = ingest_batch(results, &texts, &source, Utc::now().timestamp_millis());
                self.commit(batch)
            }
            Err(outcome) => outcome,
        }
    }

    /// Fetch and classify a synthetic batch of posts about `keyword` from the
    /// selected platforms.
    pub async fn social_pulse<S: ModelService + ?Sized>(&mut self, service: &S, keyword: &str) -> Outcome {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Outcome::Skipped;
        }
        let fallback = self.platforms.first().cloned().unwrap_or(Source::Web);
        let prompt = user_social_pulse(keyword, &self.platforms);
        match self.request(service, &prompt).await {
            Ok(results) => {
                let batch = ingest_pulse(results, keyword, &fallback, Utc::now().timestamp_millis());
                self.commit(batch)
            }
            Err(outcome) => outcome,
        }
    }

    /// One guarded round trip to the model. The busy flag is cleared on every
    /// exit, cancellation included.
    async fn request<S: ModelService + ?Sized>(
        &mut self,
        service: &S,
        prompt: &str,
    ) -> Result<Vec<ValidatedResult>, Outcome> {
        if self.in_flight {
            warn!("Request refused - another analysis is in flight");
            return Err(Outcome::Busy);
        }
        let start = std::time::Instant::now();
        let response = {
            let _busy = BusyGuard::claim(&mut self.in_flight);
            service.generate(prompt).await
        };

        let raw = match response {
            Ok(raw) => raw,
            Err(e) => {
                error!("Analysis request failed - error={}", e);
                return Err(Outcome::Failed(e.to_string()));
            }
        };

        match parse_response(&raw) {
            Ok(results) => {
                info!(
                    "Analysis response received - duration={:.2}s, results={}",
                    start.elapsed().as_secs_f32(),
                    results.len()
                );
                Ok(results.into_iter().map(validate).collect())
            }
            Err(e) => {
                error!("Malformed model response - error={}, response_length={} chars", e, raw.len());
                Err(Outcome::Failed(e.to_string()))
            }
        }
    }

    fn commit(&mut self, batch: Vec<AnalysisRecord>) -> Outcome {
        let first_id = batch.first().map(|r| r.id.clone());
        let added = self.store.prepend_batch(batch);
        if let Some(id) = first_id {
            self.selected = Some(id);
        }
        if added == 0 {
            info!("Empty result batch - store unchanged, total={}", self.store.len());
        } else {
            info!("Batch ingested - added={}, total={}", added, self.store.len());
        }
        Outcome::Ingested(added)
    }

    /// Claim the busy flag without issuing a request. Returns false when a
    /// request is already in flight.
    pub fn begin_request(&mut self) -> bool {
        if self.in_flight {
            return false;
        }
        self.in_flight = true;
        true
    }

    pub fn end_request(&mut self) {
        self.in_flight = false;
    }
}
