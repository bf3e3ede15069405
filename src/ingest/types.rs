// src/ingest/types.rs
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// Title used when an item carries no `<title>`.
pub const UNTITLED: &str = "No title";

/// One ingested feed item after parsing and scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub title: String,
    pub url: String,      // dedup key
    pub topic: String,    // topic it was fetched under, not derived from content
    pub content: String,  // normalized description, may be empty
    pub published_at: Option<DateTime<FixedOffset>>,
    pub summary: Option<String>, // filled in by the summarizer only
    pub relevance_score: f64,
}

impl Entry {
    pub fn new(title: impl Into<String>, url: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            topic: topic.into(),
            content: String::new(),
            published_at: None,
            summary: None,
            relevance_score: 0.0,
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_published_at(mut self, at: DateTime<FixedOffset>) -> Self {
        self.published_at = Some(at);
        self
    }
}

/// Why a raw item did not make it into the result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingLink,
    DuplicateUrl,
    /// Published more than 24h before the evaluation instant.
    Stale,
    NonPositiveScore,
    /// Item structure could not be extracted (bad escapes, broken markup).
    Malformed(String),
    /// Only produced under [`super::parser::DatePolicy::Discard`].
    UnparseableDate,
}

impl SkipReason {
    /// Short, stable label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            SkipReason::MissingLink => "missing_link",
            SkipReason::DuplicateUrl => "duplicate_url",
            SkipReason::Stale => "stale",
            SkipReason::NonPositiveScore => "non_positive_score",
            SkipReason::Malformed(_) => "malformed",
            SkipReason::UnparseableDate => "unparseable_date",
        }
    }
}

/// Result of running one raw item through the parse loop.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    Accepted(Entry),
    Skipped(SkipReason),
}

/// Everything one feed payload produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedParse {
    /// Sorted by `relevance_score` descending, stable on ties.
    pub entries: Vec<Entry>,
    pub skipped: Vec<SkipReason>,
    /// Items whose pubDate could not be parsed and were dated "now".
    pub date_fallbacks: usize,
}

impl FeedParse {
    pub fn stats(&self) -> FeedStats {
        FeedStats {
            items: self.entries.len() + self.skipped.len(),
            accepted: self.entries.len(),
            skipped: self.skipped.len(),
            date_fallbacks: self.date_fallbacks,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedStats {
    pub items: usize,
    pub accepted: usize,
    pub skipped: usize,
    pub date_fallbacks: usize,
}

/// Per-feed outcome inside one topic run.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedReport {
    pub url: String,
    pub outcome: Result<FeedStats, FetchError>,
}

/// Merged, ranked result for one topic plus what happened along the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopicReport {
    pub topic: String,
    pub entries: Vec<Entry>,
    pub feeds: Vec<FeedReport>,
    /// Topic was not in the feed map; no feeds were attempted.
    pub unknown_topic: bool,
}

impl TopicReport {
    pub fn failed_feeds(&self) -> impl Iterator<Item = &FetchError> {
        self.feeds.iter().filter_map(|f| f.outcome.as_ref().err())
    }
}
