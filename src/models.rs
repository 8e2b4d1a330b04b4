use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub const ALL: [Sentiment; 3] = [Sentiment::Positive, Sentiment::Negative, Sentiment::Neutral];

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" => Some(Sentiment::Positive),
            "negative" => Some(Sentiment::Negative),
            "neutral" => Some(Sentiment::Neutral),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "Positive",
            Sentiment::Negative => "Negative",
            Sentiment::Neutral => "Neutral",
        }
    }

    /// Position on the trend chart: Positive=100, Neutral=50, Negative=0.
    pub fn trend_value(&self) -> u8 {
        match self {
            Sentiment::Positive => 100,
            Sentiment::Neutral => 50,
            Sentiment::Negative => 0,
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Sentiment::Positive => "#10B981",
            Sentiment::Negative => "#EF4444",
            Sentiment::Neutral => "#94A3B8",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthorAge {
    #[serde(rename = "18-24")]
    From18To24,
    #[serde(rename = "25-34")]
    From25To34,
    #[serde(rename = "35-44")]
    From35To44,
    #[serde(rename = "45-54")]
    From45To54,
    #[serde(rename = "55+")]
    Over55,
}

impl AuthorAge {
    /// Fixed bucket order used by the age distribution.
    pub const ALL: [AuthorAge; 5] = [
        AuthorAge::From18To24,
        AuthorAge::From25To34,
        AuthorAge::From35To44,
        AuthorAge::From45To54,
        AuthorAge::Over55,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == s.trim())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AuthorAge::From18To24 => "18-24",
            AuthorAge::From25To34 => "25-34",
            AuthorAge::From35To44 => "35-44",
            AuthorAge::From45To54 => "45-54",
            AuthorAge::Over55 => "55+",
        }
    }
}

impl fmt::Display for AuthorAge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Channel a signal came from. Tags outside the known set are kept verbatim
/// in `Other` so that no record ever loses its source bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Source {
    Manual,
    X,
    Facebook,
    Instagram,
    TikTok,
    Reddit,
    Web,
    NewsBlogs,
    Video,
    Other(String),
}

impl Source {
    pub const KNOWN: [Source; 9] = [
        Source::Manual,
        Source::X,
        Source::Facebook,
        Source::Instagram,
        Source::TikTok,
        Source::Reddit,
        Source::Web,
        Source::NewsBlogs,
        Source::Video,
    ];

    pub fn parse(s: &str) -> Self {
        let tag = s.trim();
        Self::KNOWN
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(tag))
            .unwrap_or_else(|| Source::Other(tag.to_string()))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Source::Manual => "Manual",
            Source::X => "X",
            Source::Facebook => "Facebook",
            Source::Instagram => "Instagram",
            Source::TikTok => "TikTok",
            Source::Reddit => "Reddit",
            Source::Web => "Web",
            Source::NewsBlogs => "News/Blogs",
            Source::Video => "Video",
            Source::Other(tag) => tag,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Source::Other(_))
    }
}

impl From<String> for Source {
    fn from(s: String) -> Self {
        Source::parse(&s)
    }
}

impl From<Source> for String {
    fn from(s: Source) -> Self {
        s.as_str().to_string()
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: String,
    pub timestamp: i64, // ms since epoch
    pub text: String,
    pub sentiment: Sentiment,
    pub confidence_score: f64, // [0.0, 1.0]
    pub code_switched: bool,
    pub key_emotive_phrases: Vec<String>,
    pub explanation: String,
    pub business_insight: String,
    pub author_age: AuthorAge,
    pub source: Source,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchStats {
    pub total: usize,
    pub positive_count: usize,
    pub negative_count: usize,
    pub neutral_count: usize,
    pub avg_confidence: f64,
}

impl BatchStats {
    pub fn count_for(&self, s: Sentiment) -> usize {
        match s {
            Sentiment::Positive => self.positive_count,
            Sentiment::Negative => self.negative_count,
            Sentiment::Neutral => self.neutral_count,
        }
    }
}
