use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Envelope returned by the model service. `results` is optional here so the
/// normalizer can tell a missing key apart from an empty batch. Entries stay
/// untyped so one badly shaped result cannot sink its siblings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    #[serde(default)]
    pub results: Option<Vec<Value>>,
}

/// One raw classification. Every field is optional and loosely typed: the
/// model is trusted but not guaranteed to honor the schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiResult {
    pub text: Option<Value>, // only present on pulse responses
    pub sentiment: Option<Value>,
    pub confidence_score: Option<Value>,
    pub code_switched: Option<Value>,
    pub key_emotive_phrases: Option<Value>,
    pub explanation: Option<Value>,
    pub business_insight: Option<Value>,
    pub author_age: Option<Value>,
    pub source: Option<Value>,
}

impl ApiResult {
    /// Non-object entries become an all-missing result so positions still
    /// line up with the submitted texts.
    pub fn from_entry(entry: Value) -> Self {
        match entry {
            Value::Object(_) => serde_json::from_value(entry).unwrap_or_default(),
            _ => Self::default(),
        }
    }
}
