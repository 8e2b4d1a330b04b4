// src/render.rs
use chrono::{DateTime, Utc};

use crate::metrics::{DashboardMetrics, ReachSeries, TrendSeries};
use crate::models::AnalysisRecord;

pub const REPORT_TEXT_MAX: usize = 80;

/// Clip to [`REPORT_TEXT_MAX`] chars, ending in "..." when clipped.
pub fn truncate_for_report(s: &str) -> String {
    if s.chars().count() > REPORT_TEXT_MAX {
        let head: String = s.chars().take(REPORT_TEXT_MAX - 3).collect();
        format!("{}...", head)
    } else {
        s.to_string()
    }
}

fn table_cell(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', " ")
}

pub fn render_report_markdown(records: &[AnalysisRecord], stamp_ms: i64) -> String {
    let m = DashboardMetrics::compute(records);
    let audit_date = DateTime::<Utc>::from_timestamp_millis(stamp_ms)
        .map(|t| t.format("%Y-%m-%d").to_string())
        .unwrap_or_default();

    let mut md = String::new();
    md.push_str("# Sentiment Compass Report\n\n");
    md.push_str(&format!("Audit Date: {}\n\n", audit_date));
    md.push_str(&format!("Total Signals Analyzed: {}\n\n", records.len()));

    md.push_str("## Summary\n");
    md.push_str(&format!(
        "- Positive: {}\n- Neutral: {}\n- Negative: {}\n\n",
        m.stats.positive_count, m.stats.neutral_count, m.stats.negative_count
    ));

    if !records.is_empty() {
        md.push_str("## Signals\n");
        md.push_str("| Sentiment | Signal Content | Confidence |\n");
        md.push_str("|---|---|---|\n");
        for r in records {
            md.push_str(&format!(
                "| {} | {} | {:.0}% |\n",
                r.sentiment,
                table_cell(&truncate_for_report(&r.text)),
                r.confidence_score * 100.0
            ));
        }
    }

    md
}

fn bar(percent: u32) -> String {
    "#".repeat((percent / 5) as usize)
}

/// Plain-text dashboard for the terminal.
pub fn render_dashboard_text(records: &[AnalysisRecord], selected: Option<&AnalysisRecord>) -> String {
    let m = DashboardMetrics::compute(records);
    let mut out = String::new();

    out.push_str(&format!(
        "Signals: {} | avg confidence {:.0}%\n",
        m.stats.total,
        m.stats.avg_confidence * 100.0
    ));
    for s in &m.shares {
        out.push_str(&format!("  {:<8} {:>3} {:>3}% {}\n", s.sentiment.as_str(), s.count, s.percent, bar(s.percent)));
    }

    out.push_str("\nTrend:\n");
    match &m.trend {
        TrendSeries::Insufficient { .. } => out.push_str("  Additional signals required for trend analysis...\n"),
        TrendSeries::Line(points) => {
            let line: Vec<String> = points.iter().map(|p| p.value.to_string()).collect();
            out.push_str(&format!("  {}\n", line.join(" → ")));
        }
    }

    let (label, values) = match &m.reach {
        ReachSeries::Baseline(v) => ("baseline", v),
        ReachSeries::Live(v) => ("live", v),
    };
    let vals: Vec<String> = values.iter().map(|v| format!("{:.0}", v)).collect();
    out.push_str(&format!("\nReach ({}): {}\n", label, vals.join(" ")));

    out.push_str("\nAuthor age:\n");
    for a in &m.ages {
        out.push_str(&format!("  {:<6} {:>3}% {}\n", a.range.as_str(), a.percent, bar(a.percent)));
    }

    if !m.sources.is_empty() {
        out.push_str("\nSources:\n");
        for s in &m.sources {
            out.push_str(&format!("  {:<11} {:>3}% {}\n", s.source.as_str(), s.percent, s.color));
        }
    }

    if let Some(r) = selected {
        out.push_str(&format!(
            "\nSpotlight [{}] {} • {:.0}% confidence\n",
            r.source,
            r.sentiment,
            r.confidence_score * 100.0
        ));
        out.push_str(&format!("  \"{}\"\n", r.text));
        if r.code_switched {
            out.push_str("  Code-switched\n");
        }
        if !r.key_emotive_phrases.is_empty() {
            out.push_str(&format!("  Emotive phrases: {}\n", r.key_emotive_phrases.join(", ")));
        }
        if !r.explanation.trim().is_empty() {
            out.push_str(&format!("  Why: {}\n", r.explanation.trim()));
        }
        if !r.business_insight.trim().is_empty() {
            out.push_str(&format!("  Insight: {}\n", r.business_insight.trim()));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AuthorAge, Sentiment, Source};

    fn rec(text: &str, sentiment: Sentiment) -> AnalysisRecord {
        AnalysisRecord {
            id: "id".into(),
            timestamp: 0,
            text: text.into(),
            sentiment,
            confidence_score: 0.876,
            code_switched: false,
            key_emotive_phrases: vec![],
            explanation: String::new(),
            business_insight: String::new(),
            author_age: AuthorAge::From45To54,
            source: Source::Web,
        }
    }

    #[test]
    fn long_text_is_clipped_to_eighty_chars() {
        let long = "a".repeat(120);
        let t = truncate_for_report(&long);
        assert_eq!(t.chars().count(), REPORT_TEXT_MAX);
        assert!(t.ends_with("..."));
        assert_eq!(truncate_for_report(&"b".repeat(80)), "b".repeat(80));
    }

    #[test]
    fn report_lists_counts_and_rows() {
        let md = render_report_markdown(
            &[rec("Great | value", Sentiment::Positive), rec("Meh", Sentiment::Neutral)],
            1_700_000_000_000,
        );
        assert!(md.contains("Audit Date: 2023-11-14"));
        assert!(md.contains("Total Signals Analyzed: 2"));
        assert!(md.contains("- Positive: 1"));
        assert!(md.contains("- Neutral: 1"));
        assert!(md.contains("| Positive | Great \\| value | 88% |"));
    }

    #[test]
    fn dashboard_flags_insufficient_trend() {
        let one = [rec("Only one signal", Sentiment::Positive)];
        let text = render_dashboard_text(&one, Some(&one[0]));
        assert!(text.contains("Additional signals required"));
        assert!(text.contains("Reach (baseline)"));
        assert!(text.contains("Spotlight [Web] Positive"));
    }
}
