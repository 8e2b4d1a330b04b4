// src/viz_export.rs
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::json;
use std::{fs, path::Path};

use crate::metrics::{
    AgeBucket, DashboardMetrics, ReachSeries, SentimentShare, SourceBucket, TrendPoint, TrendSeries,
};
use crate::models::{AnalysisRecord, BatchStats};

pub const VIZ_FILES: [&str; 5] = [
    "viz.stats.json",
    "viz.trend.json",
    "viz.reach.json",
    "viz.ages.json",
    "viz.sources.json",
];

/* -------------------------------------------------------------------------- */
/* Entry point                                                                */
/* -------------------------------------------------------------------------- */

/// Write the chart-ready JSON views of the current store into `out_dir`.
pub fn write_all_viz(out_dir: &Path, stamp_ms: i64, records: &[AnalysisRecord]) -> Result<()> {
    fs::create_dir_all(out_dir).with_context(|| format!("create {:?}", out_dir))?;

    let m = DashboardMetrics::compute(records);

    // 1) Totals + pie shares
    write_json(out_dir.join(VIZ_FILES[0]), &build_stats(&m))?;

    // 2) Sentiment trend
    write_json(out_dir.join(VIZ_FILES[1]), &build_trend(&m.trend))?;

    // 3) Reach / confidence curve
    write_json(out_dir.join(VIZ_FILES[2]), &build_reach(&m.reach))?;

    // 4) Audience
    write_json(out_dir.join(VIZ_FILES[3]), &VAges { buckets: &m.ages })?;
    write_json(out_dir.join(VIZ_FILES[4]), &VSources { buckets: &m.sources })?;

    // 5) Index
    let idx = json!({
        "generated_at": stamp_ms,
        "version": 1,
        "counts": {
            "records": m.stats.total,
            "sources": m.sources.len(),
        },
        "files": VIZ_FILES,
    });
    write_json(out_dir.join("viz.index.json"), &idx)?;

    Ok(())
}

fn write_json<P: AsRef<Path>, T: ?Sized + Serialize>(path: P, value: &T) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, serde_json::to_vec_pretty(value)?).with_context(|| format!("write {:?}", path))
}

/* -------------------------------------------------------------------------- */
/* Views                                                                      */
/* -------------------------------------------------------------------------- */

#[derive(Serialize)]
struct VStats<'a> {
    summary: BatchStats,
    shares: &'a [SentimentShare],
}

fn build_stats(m: &DashboardMetrics) -> VStats<'_> {
    VStats { summary: m.stats, shares: &m.shares }
}

#[derive(Serialize)]
struct VTrend<'a> {
    sufficient: bool, // false => do not draw a path
    points: &'a [TrendPoint],
}

fn build_trend(t: &TrendSeries) -> VTrend<'_> {
    VTrend { sufficient: t.is_drawable(), points: t.points() }
}

#[derive(Serialize)]
struct VReach<'a> {
    mode: &'static str, // baseline | live
    values: &'a [f64],
}

fn build_reach(r: &ReachSeries) -> VReach<'_> {
    let mode = match r {
        ReachSeries::Baseline(_) => "baseline",
        ReachSeries::Live(_) => "live",
    };
    VReach { mode, values: r.values() }
}

#[derive(Serialize)]
struct VAges<'a> {
    buckets: &'a [AgeBucket],
}

#[derive(Serialize)]
struct VSources<'a> {
    buckets: &'a [SourceBucket],
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AuthorAge, Sentiment, Source};
    use serde_json::Value;

    fn rec(s: Sentiment, source: Source) -> AnalysisRecord {
        AnalysisRecord {
            id: "r".into(),
            timestamp: 0,
            text: "some text".into(),
            sentiment: s,
            confidence_score: 0.5,
            code_switched: false,
            key_emotive_phrases: vec![],
            explanation: String::new(),
            business_insight: String::new(),
            author_age: AuthorAge::From18To24,
            source,
        }
    }

    fn read(dir: &Path, name: &str) -> Value {
        serde_json::from_slice(&fs::read(dir.join(name)).unwrap()).unwrap()
    }

    #[test]
    fn writes_every_view_and_the_index() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![rec(Sentiment::Positive, Source::X), rec(Sentiment::Negative, Source::Other("Threads".into()))];
        write_all_viz(dir.path(), 99, &records).unwrap();

        let idx = read(dir.path(), "viz.index.json");
        assert_eq!(idx["counts"]["records"], 2);
        for f in VIZ_FILES {
            assert!(dir.path().join(f).exists(), "missing {f}");
        }

        let stats = read(dir.path(), "viz.stats.json");
        assert_eq!(stats["summary"]["positiveCount"], 1);

        let trend = read(dir.path(), "viz.trend.json");
        assert_eq!(trend["sufficient"], true);
        assert_eq!(trend["points"][0]["value"], 0);

        let ages = read(dir.path(), "viz.ages.json");
        assert_eq!(ages["buckets"].as_array().unwrap().len(), 5);
        assert_eq!(ages["buckets"][0]["range"], "18-24");

        let sources = read(dir.path(), "viz.sources.json");
        assert_eq!(sources["buckets"][1]["source"], "Threads");
        assert_eq!(sources["buckets"][1]["color"], "#CBD5E1");
    }

    #[test]
    fn empty_store_marks_trend_insufficient() {
        let dir = tempfile::tempdir().unwrap();
        write_all_viz(dir.path(), 1, &[]).unwrap();
        let trend = read(dir.path(), "viz.trend.json");
        assert_eq!(trend["sufficient"], false);
        assert_eq!(read(dir.path(), "viz.reach.json")["mode"], "baseline");
    }
}
