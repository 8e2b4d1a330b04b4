use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result};

use tracing::{debug, warn};
use unicode_normalization::UnicodeNormalization;
use xxhash_rust::xxh3::xxh3_64;

use crate::models::{AnalysisRecord, Source};
use crate::normalize::ValidatedResult;

/// Lines of an uploaded file considered per upload.
pub const MAX_UPLOAD_LINES: usize = 10;
/// Lines this short (in chars, after trimming) are treated as noise.
pub const MIN_SIGNAL_CHARS: usize = 5;

static RECORD_SEQ: AtomicU64 = AtomicU64::new(0);

/// Collision-tolerant id: hash of timestamp, a process-wide sequence and the text.
pub fn make_record_id(timestamp: i64, text: &str) -> String {
    let seq = RECORD_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("{:016x}", xxh3_64(format!("{}|{}|{}", timestamp, seq, text).as_bytes()))
}

pub fn normalize_text(s: &str) -> String {
    s.nfc().collect::<String>().trim().to_string()
}

fn is_signal(line: &str) -> bool {
    line.chars().count() > MIN_SIGNAL_CHARS
}

/// Split a manual submission into texts. Each substantive line is its own
/// text; when no line qualifies the whole input is submitted as one.
/// Blank input yields nothing.
pub fn split_manual_input(input: &str) -> Vec<String> {
    let whole = normalize_text(input);
    if whole.is_empty() {
        return Vec::new();
    }
    let texts: Vec<String> = input
        .lines()
        .map(normalize_text)
        .filter(|l| is_signal(l))
        .collect();
    if texts.is_empty() {
        vec![whole]
    } else {
        texts
    }
}

/// Lines of an uploaded text file: trimmed, noise dropped, capped at
/// [`MAX_UPLOAD_LINES`].
pub fn parse_upload(contents: &str) -> Vec<String> {
    let lines: Vec<String> = contents
        .lines()
        .map(normalize_text)
        .filter(|l| is_signal(l))
        .take(MAX_UPLOAD_LINES)
        .collect();
    debug!("Upload parsed - usable_lines={}", lines.len());
    lines
}

/// Read an upload as text. Invalid UTF-8 is replaced rather than rejected.
pub fn read_upload(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).with_context(|| format!("Reading upload {}", path.display()))?;
    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            warn!("Upload is not valid UTF-8, substituting invalid bytes - path={}", path.display());
            Ok(String::from_utf8_lossy(e.as_bytes()).into_owned())
        }
    }
}

fn build_record(r: ValidatedResult, text: String, default_source: &Source, now_ms: i64) -> AnalysisRecord {
    AnalysisRecord {
        id: make_record_id(now_ms, &text),
        timestamp: now_ms,
        text,
        sentiment: r.sentiment,
        confidence_score: r.confidence_score,
        code_switched: r.code_switched,
        key_emotive_phrases: r.key_emotive_phrases,
        explanation: r.explanation,
        business_insight: r.business_insight,
        author_age: r.author_age,
        source: r.source.unwrap_or_else(|| default_source.clone()),
    }
}

/// Pair result `i` with input text `i`. Results past the end of `texts`
/// have nothing to describe and are dropped.
pub fn ingest_batch(
    results: Vec<ValidatedResult>,
    texts: &[String],
    default_source: &Source,
    now_ms: i64,
) -> Vec<AnalysisRecord> {
    if results.len() > texts.len() {
        warn!(
            "Model returned more results than texts - results={}, texts={}, dropped={}",
            results.len(),
            texts.len(),
            results.len() - texts.len()
        );
    }
    results
        .into_iter()
        .zip(texts.iter())
        .map(|(r, t)| build_record(r, normalize_text(t), default_source, now_ms))
        .collect()
}

/// Pulse results carry their own post text; missing text gets a placeholder
/// naming the keyword.
pub fn ingest_pulse(
    results: Vec<ValidatedResult>,
    keyword: &str,
    default_source: &Source,
    now_ms: i64,
) -> Vec<AnalysisRecord> {
    results
        .into_iter()
        .map(|mut r| {
            let text = r
                .text
                .take()
                .map(|t| normalize_text(&t))
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| format!("Recent pulse on {}...", keyword.trim()));
            build_record(r, text, default_source, now_ms)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_types::ApiResult;
    use crate::models::Sentiment;
    use crate::normalize::validate;

    fn result(sentiment: &str, source: Option<&str>) -> ValidatedResult {
        validate(ApiResult {
            sentiment: Some(sentiment.into()),
            confidence_score: Some(serde_json::json!(0.5)),
            source: source.map(|s| s.into()),
            ..Default::default()
        })
    }

    #[test]
    fn upload_with_invalid_utf8_is_still_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reviews.txt");
        std::fs::write(&path, b"Great coffee at the stall\n\xff\xfe broken bytes here\n").unwrap();

        let contents = read_upload(&path).unwrap();
        let lines = parse_upload(&contents);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "Great coffee at the stall");
        assert!(lines[1].ends_with("broken bytes here"));
        assert!(lines[1].contains('\u{FFFD}'));
    }

    #[test]
    fn manual_input_splits_on_substantive_lines() {
        let texts = split_manual_input("Great service today\nok\n  Terrible queue at the branch  \n");
        assert_eq!(texts, vec!["Great service today", "Terrible queue at the branch"]);
    }

    #[test]
    fn manual_input_without_long_lines_is_one_text() {
        assert_eq!(split_manual_input(" eish \n"), vec!["eish"]);
        assert!(split_manual_input(" \n\t ").is_empty());
    }

    #[test]
    fn upload_caps_and_filters_lines() {
        let mut body = String::from("tiny\r\n\r\n");
        for i in 0..12 {
            body.push_str(&format!("  signal line number {}  \r\n", i));
        }
        let lines = parse_upload(&body);
        assert_eq!(lines.len(), MAX_UPLOAD_LINES);
        assert_eq!(lines[0], "signal line number 0");
        assert_eq!(lines[9], "signal line number 9");
    }

    #[test]
    fn five_char_lines_are_noise() {
        assert_eq!(parse_upload("abcde\nabcdef"), vec!["abcdef"]);
    }

    #[test]
    fn batch_pairs_by_index_and_falls_back_to_default_source() {
        let texts = vec!["first text".to_string(), "second text".to_string()];
        let records = ingest_batch(
            vec![result("Positive", None), result("Negative", Some("Reddit"))],
            &texts,
            &Source::Manual,
            1_700_000_000_000,
        );
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].text, "first text");
        assert_eq!(records[0].source, Source::Manual);
        assert_eq!(records[1].sentiment, Sentiment::Negative);
        assert_eq!(records[1].source, Source::Reddit);
        assert!(records.iter().all(|r| r.timestamp == 1_700_000_000_000));
        assert_ne!(records[0].id, records[1].id);
    }

    #[test]
    fn extra_results_are_dropped() {
        let texts = vec!["only text".to_string()];
        let records = ingest_batch(
            vec![result("Positive", None), result("Neutral", None)],
            &texts,
            &Source::Manual,
            0,
        );
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn empty_results_yield_empty_batch() {
        assert!(ingest_batch(Vec::new(), &["text here".into()], &Source::Manual, 0).is_empty());
    }

    #[test]
    fn pulse_uses_placeholder_text_when_missing() {
        let mut with_text = result("Positive", Some("TikTok"));
        with_text.text = Some("Loving the new flavour!".into());
        let records = ingest_pulse(vec![with_text, result("Neutral", None)], "rooibos", &Source::X, 5);
        assert_eq!(records[0].text, "Loving the new flavour!");
        assert_eq!(records[0].source, Source::TikTok);
        assert_eq!(records[1].text, "Recent pulse on rooibos...");
        assert_eq!(records[1].source, Source::X);
    }

    #[test]
    fn ids_differ_for_identical_inputs() {
        assert_ne!(make_record_id(1, "same"), make_record_id(1, "same"));
    }
}
