use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use itertools::Itertools;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

use crate::models::AnalysisRecord;
use crate::render::render_report_markdown;

pub const CSV_HEADER: [&str; 7] = ["ID", "Text", "Sentiment", "Confidence", "Language", "Insight", "Timestamp"];

/* ---------------------------------- JSON ---------------------------------- */

pub fn to_json(records: &[AnalysisRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

pub fn from_json(s: &str) -> Result<Vec<AnalysisRecord>> {
    serde_json::from_str(s).context("Decoding exported records")
}

/* ---------------------------------- CSV ----------------------------------- */

/// Free-text field: always quoted, embedded quotes doubled.
pub fn csv_quote(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

pub fn iso_timestamp(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| ms.to_string())
}

fn csv_row(r: &AnalysisRecord) -> String {
    [
        r.id.clone(),
        csv_quote(&r.text),
        r.sentiment.to_string(),
        r.confidence_score.to_string(),
        if r.code_switched { "Multilingual" } else { "Primary" }.to_string(),
        csv_quote(&r.business_insight),
        iso_timestamp(r.timestamp),
    ]
    .iter()
    .join(",")
}

pub fn to_csv(records: &[AnalysisRecord]) -> String {
    std::iter::once(CSV_HEADER.join(","))
        .chain(records.iter().map(csv_row))
        .join("\n")
}

/* --------------------------------- files ---------------------------------- */

#[derive(Debug, Clone)]
pub struct ExportPaths {
    pub json: PathBuf,
    pub csv: PathBuf,
    pub report: PathBuf,
}

pub fn export_file_names(stamp_ms: i64) -> (String, String, String) {
    (
        format!("sentiment_compass_audit_{}.json", stamp_ms),
        format!("sentiment_compass_audit_{}.csv", stamp_ms),
        format!("sentiment_compass_report_{}.md", stamp_ms),
    )
}

/// Write the JSON dump, the CSV sheet and the Markdown report into `out_dir`.
pub fn write_all_exports(out_dir: &Path, stamp_ms: i64, records: &[AnalysisRecord]) -> Result<ExportPaths> {
    let start = std::time::Instant::now();
    fs::create_dir_all(out_dir).with_context(|| format!("create {:?}", out_dir))?;

    let (json_name, csv_name, report_name) = export_file_names(stamp_ms);
    let paths = ExportPaths {
        json: out_dir.join(json_name),
        csv: out_dir.join(csv_name),
        report: out_dir.join(report_name),
    };

    fs::write(&paths.json, to_json(records)?).with_context(|| format!("write {:?}", paths.json))?;
    debug!("Wrote {}", paths.json.display());

    fs::write(&paths.csv, to_csv(records)).with_context(|| format!("write {:?}", paths.csv))?;
    debug!("Wrote {}", paths.csv.display());

    fs::write(&paths.report, render_report_markdown(records, stamp_ms))
        .with_context(|| format!("write {:?}", paths.report))?;
    debug!("Wrote {}", paths.report.display());

    info!(
        "Exports written - duration={:.2}s, records={}, directory={}",
        start.elapsed().as_secs_f32(),
        records.len(),
        out_dir.display()
    );
    Ok(paths)
}
