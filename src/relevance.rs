// src/relevance.rs
//! Relevance scoring: recency + content length + authority keywords.
//!
//! total = recency (0..=5) + content (0..=2) + authority (0..=3), rounded to 2 decimals.
//!
//! Pure and deterministic for a given evaluation instant; no I/O.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::ingest::types::Entry;

pub const RECENCY_MAX: f64 = 5.0;
pub const RECENCY_WINDOW_HOURS: f64 = 24.0;
pub const CONTENT_MAX: f64 = 2.0;
pub const CONTENT_SATURATION_CHARS: f64 = 500.0;
pub const AUTHORITY_PER_HIT: f64 = 0.5;
pub const AUTHORITY_MAX: f64 = 3.0;
pub const SCORE_MAX: f64 = RECENCY_MAX + CONTENT_MAX + AUTHORITY_MAX;

/// Prestige organizations and institutions.
pub const DEFAULT_AUTHORITY_KEYWORDS: &[&str] = &[
    "MIT",
    "Stanford",
    "Harvard",
    "Berkeley",
    "Carnegie Mellon",
    "Oxford",
    "Cambridge",
    "ETH Zurich",
    "DeepMind",
    "OpenAI",
    "Google Research",
    "Microsoft Research",
    "NVIDIA",
    "IEEE",
    "NeurIPS",
    "CVPR",
];

/// Per-term breakdown, handy in logs and tests.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub recency: f64,
    pub content: f64,
    pub authority: f64,
    pub total: f64,
}

#[derive(Debug, Clone)]
pub struct RelevanceScorer {
    keywords: Vec<String>, // lowercased, distinct
}

impl Default for RelevanceScorer {
    fn default() -> Self {
        Self::with_keywords(DEFAULT_AUTHORITY_KEYWORDS.iter().copied())
    }
}

impl RelevanceScorer {
    /// Build from any keyword list. Blank entries and case-insensitive
    /// duplicates are dropped.
    pub fn with_keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for k in keywords {
            let k = k.as_ref().trim().to_lowercase();
            if !k.is_empty() && !out.contains(&k) {
                out.push(k);
            }
        }
        Self { keywords: out }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn score(&self, entry: &Entry, now: DateTime<Utc>) -> f64 {
        self.breakdown(entry, now).total
    }

    pub fn breakdown(&self, entry: &Entry, now: DateTime<Utc>) -> ScoreBreakdown {
        let recency = recency_term(entry, now);
        let content = content_term(&entry.content);
        let authority = self.authority_term(&entry.title, &entry.content);
        ScoreBreakdown {
            recency,
            content,
            authority,
            total: round2(recency + content + authority),
        }
    }

    /// Number of distinct keywords found as case-insensitive substrings of
    /// title + content.
    pub fn keyword_hits(&self, title: &str, content: &str) -> usize {
        let hay = format!("{title} {content}").to_lowercase();
        self.keywords.iter().filter(|k| hay.contains(k.as_str())).count()
    }

    fn authority_term(&self, title: &str, content: &str) -> f64 {
        (self.keyword_hits(title, content) as f64 * AUTHORITY_PER_HIT).min(AUTHORITY_MAX)
    }
}

/// `max(0, 5 - hours_old/24*5)`, capped at 5 for future-dated items; 0 when undated.
pub fn recency_term(entry: &Entry, now: DateTime<Utc>) -> f64 {
    let Some(published) = entry.published_at else {
        return 0.0;
    };
    let age = now.signed_duration_since(published.with_timezone(&Utc));
    let hours_old = age.num_milliseconds() as f64 / 3_600_000.0;
    (RECENCY_MAX - (hours_old / RECENCY_WINDOW_HOURS) * RECENCY_MAX).clamp(0.0, RECENCY_MAX)
}

/// Linear in character count, reaching the 2.0 cap at 500 characters.
pub fn content_term(content: &str) -> f64 {
    let fill = (content.chars().count() as f64 / CONTENT_SATURATION_CHARS).min(1.0);
    fill * CONTENT_MAX
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
