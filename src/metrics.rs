//! Derived views over the record store. Every function here is pure and takes
//! the store's newest-first slice; nothing is cached.

use serde::Serialize;
use std::collections::HashMap;

use crate::models::{AnalysisRecord, AuthorAge, BatchStats, Sentiment, Source};

/// Fewer records than this and the reach chart shows a decorative baseline.
pub const REACH_MIN_RECORDS: usize = 5;
/// Most recent records plotted on the reach chart.
pub const REACH_WINDOW: usize = 10;
pub const REACH_BASELINE: [f64; 5] = [0.0, 20.0, 45.0, 30.0, 80.0];

pub const FALLBACK_SOURCE_COLOR: &str = "#CBD5E1";

/* -------------------------------------------------------------------------- */
/* Sentiment totals                                                           */
/* -------------------------------------------------------------------------- */

pub fn batch_stats(records: &[AnalysisRecord]) -> BatchStats {
    let total = records.len();
    if total == 0 {
        return BatchStats::default();
    }
    let mut stats = BatchStats { total, ..Default::default() };
    let mut conf_sum = 0.0;
    for r in records {
        match r.sentiment {
            Sentiment::Positive => stats.positive_count += 1,
            Sentiment::Negative => stats.negative_count += 1,
            Sentiment::Neutral => stats.neutral_count += 1,
        }
        conf_sum += r.confidence_score;
    }
    stats.avg_confidence = conf_sum / total as f64;
    stats
}

/// `round(count / total * 100)`, or 0 for an empty population. Buckets are
/// rounded independently, so a distribution may not sum to exactly 100.
pub fn percent(count: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (count as f64 / total as f64 * 100.0).round() as u32
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentShare {
    pub sentiment: Sentiment,
    pub count: usize,
    pub percent: u32,
    pub color: &'static str,
}

pub fn sentiment_shares(stats: &BatchStats) -> Vec<SentimentShare> {
    Sentiment::ALL
        .into_iter()
        .map(|s| {
            let count = stats.count_for(s);
            SentimentShare {
                sentiment: s,
                count,
                percent: percent(count, stats.total),
                color: s.color(),
            }
        })
        .collect()
}

/* -------------------------------------------------------------------------- */
/* Trend                                                                      */
/* -------------------------------------------------------------------------- */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    pub index: usize,
    pub value: u8,
}

/// A line needs two points; below that the renderer gets `Insufficient`
/// and must not draw a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrendSeries {
    Insufficient { points: Vec<TrendPoint> },
    Line(Vec<TrendPoint>),
}

impl TrendSeries {
    pub fn points(&self) -> &[TrendPoint] {
        match self {
            TrendSeries::Insufficient { points } | TrendSeries::Line(points) => points,
        }
    }

    pub fn is_drawable(&self) -> bool {
        matches!(self, TrendSeries::Line(_))
    }
}

pub fn trend_series(records: &[AnalysisRecord]) -> TrendSeries {
    let points: Vec<TrendPoint> = records
        .iter()
        .rev()
        .enumerate()
        .map(|(index, r)| TrendPoint { index, value: r.sentiment.trend_value() })
        .collect();
    if points.len() < 2 {
        TrendSeries::Insufficient { points }
    } else {
        TrendSeries::Line(points)
    }
}

/* -------------------------------------------------------------------------- */
/* Reach (confidence) series                                                  */
/* -------------------------------------------------------------------------- */

#[derive(Debug, Clone, PartialEq)]
pub enum ReachSeries {
    /// Placeholder curve shown until enough signals exist.
    Baseline(Vec<f64>),
    /// `confidence * 100` of the most recent records, oldest first.
    Live(Vec<f64>),
}

impl ReachSeries {
    pub fn values(&self) -> &[f64] {
        match self {
            ReachSeries::Baseline(v) | ReachSeries::Live(v) => v,
        }
    }
}

pub fn reach_series(records: &[AnalysisRecord]) -> ReachSeries {
    if records.len() < REACH_MIN_RECORDS {
        return ReachSeries::Baseline(REACH_BASELINE.to_vec());
    }
    let recent = &records[..records.len().min(REACH_WINDOW)];
    ReachSeries::Live(recent.iter().rev().map(|r| r.confidence_score * 100.0).collect())
}

/* -------------------------------------------------------------------------- */
/* Audience distributions                                                     */
/* -------------------------------------------------------------------------- */

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgeBucket {
    pub range: AuthorAge,
    pub count: usize,
    pub percent: u32,
}

/// All five brackets, in fixed order, including empty ones.
pub fn age_distribution(records: &[AnalysisRecord]) -> Vec<AgeBucket> {
    let total = records.len();
    AuthorAge::ALL
        .into_iter()
        .map(|range| {
            let count = records.iter().filter(|r| r.author_age == range).count();
            AgeBucket { range, count, percent: percent(count, total) }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceBucket {
    pub source: Source,
    pub count: usize,
    pub percent: u32,
    pub color: &'static str,
}

pub fn source_color(source: &Source) -> &'static str {
    match source {
        Source::Manual => "#C8A2C8",
        Source::X => "#0F1419",
        Source::Facebook => "#1877F2",
        Source::Instagram => "#E4405F",
        Source::TikTok => "#000000",
        Source::Reddit => "#FF4500",
        Source::Web => "#0DACF1",
        Source::NewsBlogs => "#71F6D2",
        Source::Video => "#F5A3E0",
        Source::Other(_) => FALLBACK_SOURCE_COLOR,
    }
}

/// One bucket per distinct tag present, largest share first. Equal shares
/// keep the order in which tags were first seen walking the store.
pub fn source_distribution(records: &[AnalysisRecord]) -> Vec<SourceBucket> {
    let total = records.len();
    let mut order: Vec<&Source> = Vec::new();
    let mut counts: HashMap<&Source, usize> = HashMap::new();
    for r in records {
        let c = counts.entry(&r.source).or_insert(0);
        if *c == 0 {
            order.push(&r.source);
        }
        *c += 1;
    }

    let mut buckets: Vec<SourceBucket> = order
        .into_iter()
        .map(|s| {
            let count = counts.get(s).copied().unwrap_or(0);
            SourceBucket {
                source: s.clone(),
                count,
                percent: percent(count, total),
                color: source_color(s),
            }
        })
        .collect();
    // stable sort keeps first-seen order among ties
    buckets.sort_by(|a, b| b.percent.cmp(&a.percent));
    buckets
}

/* -------------------------------------------------------------------------- */
/* Bundle                                                                     */
/* -------------------------------------------------------------------------- */

/// Everything the dashboard draws, computed in one pass over a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardMetrics {
    pub stats: BatchStats,
    pub shares: Vec<SentimentShare>,
    pub trend: TrendSeries,
    pub reach: ReachSeries,
    pub ages: Vec<AgeBucket>,
    pub sources: Vec<SourceBucket>,
}

impl DashboardMetrics {
    pub fn compute(records: &[AnalysisRecord]) -> Self {
        let stats = batch_stats(records);
        Self {
            shares: sentiment_shares(&stats),
            stats,
            trend: trend_series(records),
            reach: reach_series(records),
            ages: age_distribution(records),
            sources: source_distribution(records),
        }
    }
}
