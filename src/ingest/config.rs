// src/ingest/config.rs
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::relevance::DEFAULT_AUTHORITY_KEYWORDS;

const ENV_PATH: &str = "FEEDS_CONFIG_PATH";

/// Topic label → ordered feed URLs, plus the authority keyword list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedMap {
    topics: BTreeMap<String, Vec<String>>,
    keywords: Vec<String>,
}

impl Default for FeedMap {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FeedMap {
    /// Keys are normalised, URL lists trimmed and deduplicated in order.
    pub fn new<K, U>(topics: impl IntoIterator<Item = (K, U)>, keywords: Vec<String>) -> Self
    where
        K: AsRef<str>,
        U: IntoIterator,
        U::Item: AsRef<str>,
    {
        let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (k, urls) in topics {
            let key = normalize_topic(k.as_ref());
            if key.is_empty() {
                continue;
            }
            let slot = map.entry(key).or_default();
            for u in urls {
                let u = u.as_ref().trim();
                if !u.is_empty() && !slot.iter().any(|s| s == u) {
                    slot.push(u.to_string());
                }
            }
        }
        Self {
            topics: map,
            keywords,
        }
    }

    /// The two topics the service ships with.
    pub fn builtin() -> Self {
        Self::new(
            [
                (
                    "computer vision",
                    vec![
                        "https://arxiv.org/rss/cs.CV",
                        "https://medium.com/feed/tag/computer-vision",
                    ],
                ),
                (
                    "ai robotics",
                    vec!["https://arxiv.org/rss/cs.RO", "https://robotics.news/feed"],
                ),
            ],
            default_keywords(),
        )
    }

    /// Case-insensitive, trimmed lookup.
    pub fn feeds_for(&self, topic: &str) -> Option<&[String]> {
        self.topics.get(&normalize_topic(topic)).map(Vec::as_slice)
    }

    pub fn contains(&self, topic: &str) -> bool {
        self.feeds_for(topic).is_some()
    }

    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.topics.keys().map(String::as_str)
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

pub fn normalize_topic(t: &str) -> String {
    t.trim().to_lowercase()
}

fn default_keywords() -> Vec<String> {
    DEFAULT_AUTHORITY_KEYWORDS.iter().map(|s| s.to_string()).collect()
}

/// Load a feed map from an explicit path. Supports TOML or JSON formats.
pub fn load_feeds_from(path: &Path) -> Result<FeedMap> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading feed map from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_feeds(&content, ext.as_str())
        .with_context(|| format!("parsing feed map {}", path.display()))
}

/// Load the feed map using env var + fallbacks:
/// 1) $FEEDS_CONFIG_PATH
/// 2) config/feeds.toml
/// 3) config/feeds.json
/// 4) built-in map
pub fn load_feeds_default() -> Result<FeedMap> {
    if let Ok(p) = std::env::var(ENV_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_feeds_from(&pb);
        } else {
            return Err(anyhow!("FEEDS_CONFIG_PATH points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from("config/feeds.toml");
    if toml_p.exists() {
        return load_feeds_from(&toml_p);
    }
    let json_p = PathBuf::from("config/feeds.json");
    if json_p.exists() {
        return load_feeds_from(&json_p);
    }
    Ok(FeedMap::builtin())
}

#[derive(Deserialize)]
struct RawFeedMap {
    topics: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    keywords: Option<Vec<String>>,
}

impl From<RawFeedMap> for FeedMap {
    fn from(raw: RawFeedMap) -> Self {
        let keywords = raw.keywords.unwrap_or_else(default_keywords);
        FeedMap::new(raw.topics, keywords)
    }
}

fn parse_feeds(s: &str, hint_ext: &str) -> Result<FeedMap> {
    if hint_ext == "json" {
        return Ok(serde_json::from_str::<RawFeedMap>(s)?.into());
    }
    if hint_ext == "toml" {
        return Ok(toml::from_str::<RawFeedMap>(s)?.into());
    }
    // Unknown extension: sniff.
    if let Ok(v) = serde_json::from_str::<RawFeedMap>(s) {
        return Ok(v.into());
    }
    if let Ok(v) = toml::from_str::<RawFeedMap>(s) {
        return Ok(v.into());
    }
    Err(anyhow!("unsupported feed map format"))
}
