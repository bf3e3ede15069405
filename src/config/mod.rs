// src/config/mod.rs
//! Process configuration, read from the environment (and `.env` via dotenvy
//! in `main`).

pub mod llm;

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveTime;
use tracing::warn;

use crate::ingest::config::{normalize_topic, FeedMap};
use crate::ingest::fetch::DEFAULT_FETCH_TIMEOUT_SECS;
use crate::ingest::parser::DatePolicy;
use crate::ingest::pipeline::DEFAULT_FETCH_CONCURRENCY;
use crate::scheduler::parse_schedule_times;

pub use llm::{LlmConfig, LlmProvider};

pub const DEFAULT_MAX_ARTICLES: usize = 3;

/// Twilio credentials and phone numbers for SMS delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from_phone: String,
    pub to_phone: String,
}

impl TwilioConfig {
    /// `None` unless all four variables are set.
    pub fn from_env() -> Option<Self> {
        Some(Self {
            account_sid: non_empty_var("TWILIO_ACCOUNT_SID")?,
            auth_token: non_empty_var("TWILIO_AUTH_TOKEN")?,
            from_phone: non_empty_var("TWILIO_FROM_PHONE")?,
            to_phone: non_empty_var("TWILIO_TO_PHONE")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub llm: LlmConfig,
    pub twilio: Option<TwilioConfig>,
    /// Normalised and restricted to topics present in the feed map.
    pub topics: Vec<String>,
    pub schedule_times: Vec<NaiveTime>,
    pub max_articles: usize,
    pub feed_timeout: Duration,
    pub fetch_concurrency: usize,
    pub date_policy: DatePolicy,
    pub metrics_addr: Option<SocketAddr>,
}

impl Config {
    pub fn from_env(feeds: &FeedMap) -> Result<Self> {
        let llm = LlmConfig::from_env()?;
        let twilio = TwilioConfig::from_env();

        let requested = split_list(&env::var("TOPICS").unwrap_or_default());
        let topics = if requested.is_empty() {
            feeds.topics().map(str::to_string).collect()
        } else {
            select_topics(requested, feeds)
        };

        let schedule_times = parse_schedule_times(&split_list_raw(
            &env::var("SCHEDULE_TIMES").unwrap_or_default(),
        ))
        .context("SCHEDULE_TIMES")?;

        let max_articles = parse_var("MAX_ARTICLES", DEFAULT_MAX_ARTICLES)?;
        let feed_timeout =
            Duration::from_secs(parse_var("FEED_TIMEOUT_SECS", DEFAULT_FETCH_TIMEOUT_SECS)?);
        let fetch_concurrency =
            parse_var("FETCH_CONCURRENCY", DEFAULT_FETCH_CONCURRENCY)?.max(1);

        let date_policy = match non_empty_var("UNPARSEABLE_DATE_POLICY") {
            Some(s) => s.parse().context("UNPARSEABLE_DATE_POLICY")?,
            None => DatePolicy::default(),
        };

        let metrics_addr = match non_empty_var("METRICS_ADDR") {
            Some(s) => Some(
                s.parse()
                    .with_context(|| format!("METRICS_ADDR is not a socket address: {s}"))?,
            ),
            None => None,
        };

        Ok(Self {
            llm,
            twilio,
            topics,
            schedule_times,
            max_articles,
            feed_timeout,
            fetch_concurrency,
            date_policy,
            metrics_addr,
        })
    }

    /// Replace the topic list (e.g. from `--topic`), applying the same
    /// normalisation and filtering as `TOPICS`.
    pub fn override_topics(&mut self, topics: Vec<String>, feeds: &FeedMap) {
        let cleaned: Vec<String> = topics
            .iter()
            .map(|t| normalize_topic(t))
            .filter(|t| !t.is_empty())
            .collect();
        self.topics = select_topics(cleaned, feeds);
    }
}

/// Keep topics the feed map knows about, warning about the rest.
fn select_topics(requested: Vec<String>, feeds: &FeedMap) -> Vec<String> {
    let (valid, invalid): (Vec<String>, Vec<String>) =
        requested.into_iter().partition(|t| feeds.contains(t));
    if !invalid.is_empty() {
        let available: Vec<&str> = feeds.topics().collect();
        warn!(
            invalid = %invalid.join(", "),
            available = %available.join(", "),
            "ignoring unknown topics"
        );
    }
    let mut out: Vec<String> = Vec::with_capacity(valid.len());
    for t in valid {
        if !out.contains(&t) {
            out.push(t);
        }
    }
    out
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(normalize_topic)
        .filter(|t| !t.is_empty())
        .collect()
}

fn split_list_raw(s: &str) -> Vec<String> {
    s.split(',')
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match non_empty_var(key) {
        Some(v) => v
            .parse()
            .with_context(|| format!("{key} has invalid value `{v}`")),
        None => Ok(default),
    }
}
