//! Validation boundary between raw model output and the record model.
//!
//! `parse_response` decides whether a response body is usable at all;
//! `validate` patches each raw result into a fully-typed payload, recording
//! a [`Flag`] for every fallback it had to apply.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::api_types::{ApiResponse, ApiResult};
use crate::models::{AuthorAge, Sentiment, Source};

/// Bucket assigned when the model omits or garbles `author_age`.
pub const FALLBACK_AGE: AuthorAge = AuthorAge::From35To44;

#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("response is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("response has no `results` key")]
    MissingResults,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Flag {
    ConfidenceMissing,
    ConfidenceOutOfRange(f64),
    SentimentUnrecognized(Option<String>),
    AgeUnrecognized(Option<String>),
    CodeSwitchedMissing,
    PhrasesMissing,
    ExplanationMissing,
    InsightMissing,
    /// Field had the wrong JSON type but a usable value was recovered.
    Coerced(&'static str),
    /// Field had the wrong JSON type and fell back to its default.
    WrongType(&'static str),
}

/// A raw result after fallbacks. `text` and `source` stay optional: their
/// fallbacks depend on the request (input text, default source tag).
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedResult {
    pub text: Option<String>,
    pub sentiment: Sentiment,
    pub confidence_score: f64,
    pub code_switched: bool,
    pub key_emotive_phrases: Vec<String>,
    pub explanation: String,
    pub business_insight: String,
    pub author_age: AuthorAge,
    pub source: Option<Source>,
    pub flags: Vec<Flag>,
}

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^\s*```[A-Za-z]*\s*\n?(.*?)\s*```\s*$").expect("code fence pattern is valid")
});

/// Models often wrap JSON in a Markdown fence even when told not to.
pub fn strip_code_fence(raw: &str) -> &str {
    match CODE_FENCE.captures(raw).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str(),
        None => raw.trim(),
    }
}

pub fn parse_response(raw: &str) -> Result<Vec<ApiResult>, ResponseError> {
    let body = strip_code_fence(raw);
    if body.is_empty() {
        debug!("Empty model response - treating as empty batch");
        return Ok(Vec::new());
    }
    let parsed: ApiResponse = serde_json::from_str(body)?;
    let entries = parsed.results.ok_or(ResponseError::MissingResults)?;
    Ok(entries
        .into_iter()
        .enumerate()
        .map(|(i, entry)| {
            if !entry.is_object() {
                warn!("Result entry is not an object - index={}, entry={}", i, entry);
            }
            ApiResult::from_entry(entry)
        })
        .collect())
}

fn confidence_from(v: Option<&Value>, flags: &mut Vec<Flag>) -> f64 {
    let n = match v {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match n {
        None => {
            flags.push(Flag::ConfidenceMissing);
            0.0
        }
        Some(x) if x.is_finite() && (0.0..=1.0).contains(&x) => x,
        Some(x) => {
            flags.push(Flag::ConfidenceOutOfRange(x));
            0.0
        }
    }
}

/// Strings pass through; numbers and booleans are rendered as text.
fn scalar_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn text_field(v: Option<Value>, field: &'static str, missing: Flag, flags: &mut Vec<Flag>) -> String {
    match v {
        None => {
            flags.push(missing);
            String::new()
        }
        Some(Value::String(s)) => s,
        Some(other) => match scalar_text(&other) {
            Some(s) => {
                flags.push(Flag::Coerced(field));
                s
            }
            None => {
                flags.push(Flag::WrongType(field));
                String::new()
            }
        },
    }
}

fn code_switched_from(v: Option<Value>, flags: &mut Vec<Flag>) -> bool {
    let coerced = match v {
        None => {
            flags.push(Flag::CodeSwitchedMissing);
            return false;
        }
        Some(Value::Bool(b)) => return b,
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" => Some(true),
            "false" | "no" => Some(false),
            _ => None,
        },
        Some(Value::Number(n)) => match n.as_f64() {
            Some(x) if x == 0.0 => Some(false),
            Some(x) if x == 1.0 => Some(true),
            _ => None,
        },
        Some(_) => None,
    };
    match coerced {
        Some(b) => {
            flags.push(Flag::Coerced("code_switched"));
            b
        }
        None => {
            flags.push(Flag::WrongType("code_switched"));
            false
        }
    }
}

fn phrases_from(v: Option<Value>, flags: &mut Vec<Flag>) -> Vec<String> {
    let items: Vec<String> = match v {
        None => {
            flags.push(Flag::PhrasesMissing);
            return Vec::new();
        }
        Some(Value::Array(items)) => {
            let total = items.len();
            let kept: Vec<String> = items.iter().filter_map(scalar_text).collect();
            if kept.len() != total {
                flags.push(Flag::WrongType("key_emotive_phrases"));
            }
            kept
        }
        Some(Value::String(s)) => {
            flags.push(Flag::Coerced("key_emotive_phrases"));
            vec![s]
        }
        Some(_) => {
            flags.push(Flag::WrongType("key_emotive_phrases"));
            return Vec::new();
        }
    };
    items.into_iter().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect()
}

pub fn validate(raw: ApiResult) -> ValidatedResult {
    let mut flags = Vec::new();

    let confidence_score = confidence_from(raw.confidence_score.as_ref(), &mut flags);

    let sentiment_raw = raw.sentiment.as_ref().and_then(scalar_text);
    let sentiment = match sentiment_raw.as_deref().and_then(Sentiment::parse) {
        Some(s) => s,
        None => {
            flags.push(Flag::SentimentUnrecognized(sentiment_raw));
            Sentiment::Neutral
        }
    };

    let age_raw = raw.author_age.as_ref().and_then(scalar_text);
    let author_age = match age_raw.as_deref().and_then(AuthorAge::parse) {
        Some(a) => a,
        None => {
            flags.push(Flag::AgeUnrecognized(age_raw));
            FALLBACK_AGE
        }
    };

    let code_switched = code_switched_from(raw.code_switched, &mut flags);
    let key_emotive_phrases = phrases_from(raw.key_emotive_phrases, &mut flags);
    let explanation = text_field(raw.explanation, "explanation", Flag::ExplanationMissing, &mut flags);
    let business_insight = text_field(raw.business_insight, "business_insight", Flag::InsightMissing, &mut flags);

    let source = non_blank(raw.source.as_ref().and_then(scalar_text)).map(|s| Source::parse(&s));

    if !flags.is_empty() {
        warn!("Model result patched with fallbacks - flags={:?}", flags);
    }

    ValidatedResult {
        text: non_blank(raw.text.as_ref().and_then(scalar_text)),
        sentiment,
        confidence_score,
        code_switched,
        key_emotive_phrases,
        explanation,
        business_insight,
        author_age,
        source,
        flags,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(v: Value) -> ApiResult {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn fenced_json_is_unwrapped() {
        let body = "```json\n{\"results\": []}\n```";
        assert_eq!(strip_code_fence(body), "{\"results\": []}");
        assert!(parse_response(body).unwrap().is_empty());
    }

    #[test]
    fn blank_response_is_an_empty_batch() {
        assert!(parse_response("   ").unwrap().is_empty());
    }

    #[test]
    fn malformed_and_keyless_responses_are_errors() {
        assert!(matches!(parse_response("not json"), Err(ResponseError::Malformed(_))));
        assert!(matches!(parse_response("{\"items\": []}"), Err(ResponseError::MissingResults)));
    }

    #[test]
    fn complete_result_passes_without_flags() {
        let v = validate(raw(json!({
            "sentiment": "Positive",
            "confidence_score": 0.92,
            "code_switched": true,
            "key_emotive_phrases": ["lekker", " sharp sharp "],
            "explanation": "Upbeat slang.",
            "business_insight": "Lean into local tone.",
            "author_age": "18-24",
            "source": "Reddit"
        })));
        assert!(v.flags.is_empty());
        assert_eq!(v.sentiment, Sentiment::Positive);
        assert_eq!(v.confidence_score, 0.92);
        assert_eq!(v.key_emotive_phrases, vec!["lekker", "sharp sharp"]);
        assert_eq!(v.author_age, AuthorAge::From18To24);
        assert_eq!(v.source, Some(Source::Reddit));
    }

    #[test]
    fn out_of_range_confidence_is_zeroed_and_flagged() {
        let v = validate(raw(json!({ "sentiment": "Negative", "confidence_score": 87 })));
        assert_eq!(v.confidence_score, 0.0);
        assert!(v.flags.contains(&Flag::ConfidenceOutOfRange(87.0)));

        let v = validate(raw(json!({ "sentiment": "Negative" })));
        assert_eq!(v.confidence_score, 0.0);
        assert!(v.flags.contains(&Flag::ConfidenceMissing));

        let v = validate(raw(json!({ "confidence_score": "0.4" })));
        assert_eq!(v.confidence_score, 0.4);
    }

    #[test]
    fn missing_fields_fall_back() {
        let v = validate(ApiResult::default());
        assert_eq!(v.sentiment, Sentiment::Neutral);
        assert_eq!(v.author_age, FALLBACK_AGE);
        assert!(!v.code_switched);
        assert!(v.key_emotive_phrases.is_empty());
        assert_eq!(v.source, None);
        assert_eq!(v.text, None);
        assert!(v.flags.contains(&Flag::SentimentUnrecognized(None)));
    }

    #[test]
    fn wrong_typed_fields_are_coerced_or_defaulted() {
        let v = validate(raw(json!({
            "sentiment": "Positive",
            "confidence_score": 0.6,
            "code_switched": "false",
            "key_emotive_phrases": "eish",
            "explanation": 42,
            "business_insight": { "nested": true },
            "author_age": "25-34"
        })));
        assert!(!v.code_switched);
        assert_eq!(v.key_emotive_phrases, vec!["eish"]);
        assert_eq!(v.explanation, "42");
        assert_eq!(v.business_insight, "");
        assert!(v.flags.contains(&Flag::Coerced("code_switched")));
        assert!(v.flags.contains(&Flag::WrongType("business_insight")));
        assert_eq!(v.sentiment, Sentiment::Positive);
    }

    #[test]
    fn one_bad_result_does_not_sink_the_batch() {
        let body = json!({
            "results": [
                { "sentiment": "Positive", "confidence_score": 0.9, "code_switched": true },
                { "sentiment": "Negative", "confidence_score": 0.4, "code_switched": "false",
                  "key_emotive_phrases": [1, "ugh", null] },
                "not an object"
            ]
        })
        .to_string();
        let results: Vec<ValidatedResult> = parse_response(&body).unwrap().into_iter().map(validate).collect();
        assert_eq!(results.len(), 3);
        assert!(results[0].code_switched);
        assert_eq!(results[1].sentiment, Sentiment::Negative);
        assert_eq!(results[1].key_emotive_phrases, vec!["1", "ugh"]);
        assert!(results[1].flags.contains(&Flag::WrongType("key_emotive_phrases")));
        assert_eq!(results[2].sentiment, Sentiment::Neutral);
        assert!(results[2].flags.contains(&Flag::ConfidenceMissing));
    }
}
