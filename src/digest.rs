// src/digest.rs
//! The scheduled job: scrape each topic, summarize the best entries, deliver.

use serde::Serialize;
use tracing::{error, info, warn};

use crate::ingest::pipeline::TopicPipeline;
use crate::ingest::types::Entry;
use crate::notify::Notifier;
use crate::summarize::Summarizer;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DigestReport {
    /// Entries selected across topics (after the per-topic cap).
    pub fetched: usize,
    pub summarized: usize,
    /// Whether the notifier accepted the digest.
    pub delivered: bool,
}

/// Entries taken per topic so the digest stays near `max_articles` overall.
pub fn per_topic_limit(max_articles: usize, topics: usize) -> usize {
    if topics == 0 {
        return 0;
    }
    (max_articles / topics).max(1)
}

pub async fn run_digest(
    topics: &[String],
    max_articles: usize,
    pipeline: &TopicPipeline,
    summarizer: &dyn Summarizer,
    notifier: &dyn Notifier,
) -> DigestReport {
    let mut report = DigestReport::default();
    if topics.is_empty() {
        warn!("no topics configured; nothing to do");
        return report;
    }
    let limit = per_topic_limit(max_articles, topics.len());

    let mut ready: Vec<Entry> = Vec::new();
    for topic in topics {
        let mut entries = pipeline.articles_for_topic(topic).await;
        entries.truncate(limit);
        report.fetched += entries.len();

        for mut entry in entries {
            match summarizer.summarize(&entry).await {
                Ok(summary) => {
                    entry.summary = Some(summary);
                    ready.push(entry);
                }
                Err(e) => {
                    warn!(%topic, url = %entry.url, title = %entry.title, error = %e, "summarize failed; skipping article");
                }
            }
        }
    }
    report.summarized = ready.len();

    match notifier.send(&ready).await {
        Ok(()) => report.delivered = true,
        Err(e) => error!(error = %e, "sending notifications failed"),
    }

    info!(
        fetched = report.fetched,
        summarized = report.summarized,
        delivered = report.delivered,
        "digest finished"
    );
    report
}
