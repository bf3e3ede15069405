// tests/digest_job.rs
mod common;

use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use common::*;
use news_digest::digest::{run_digest, DigestReport};
use news_digest::ingest::config::FeedMap;
use news_digest::notify::Notifier;
use news_digest::summarize::Summarizer;
use news_digest::{Entry, FixedClock, TopicPipeline};

/// Summarizes everything except URLs containing `fail_on`.
struct StubSummarizer {
    fail_on: Option<&'static str>,
}

#[async_trait]
impl Summarizer for StubSummarizer {
    async fn summarize(&self, entry: &Entry) -> Result<String> {
        if let Some(pat) = self.fail_on {
            if entry.url.contains(pat) {
                return Err(anyhow!("model overloaded"));
            }
        }
        Ok(format!("Summary of {}", entry.title))
    }

    fn provider_name(&self) -> &'static str {
        "stub"
    }
}

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<Vec<Entry>>>,
    fail: bool,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, entries: &[Entry]) -> Result<()> {
        self.sent.lock().unwrap().push(entries.to_vec());
        if self.fail {
            return Err(anyhow!("twilio down"));
        }
        Ok(())
    }
}

fn pipeline() -> TopicPipeline {
    let fetcher = MockFetcher::new()
        .page(CV_URL, CV_FEED)
        .page(ROBOTICS_URL, ROBOTICS_FEED)
        .into_arc();
    let map = FeedMap::new(
        [("computer vision", vec![CV_URL]), ("ai robotics", vec![ROBOTICS_URL])],
        FeedMap::builtin().keywords().to_vec(),
    );
    TopicPipeline::new(map, fetcher).with_clock(Arc::new(FixedClock::at(eval_instant())))
}

fn topics() -> Vec<String> {
    vec!["computer vision".to_string(), "ai robotics".to_string()]
}

#[tokio::test]
async fn takes_top_entries_per_topic_and_delivers() {
    let notifier = RecordingNotifier::default();
    let report = run_digest(
        &topics(),
        4,
        &pipeline(),
        &StubSummarizer { fail_on: None },
        &notifier,
    )
    .await;

    assert_eq!(
        report,
        DigestReport {
            fetched: 4,
            summarized: 4,
            delivered: true
        }
    );
    let sent = notifier.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    let urls: Vec<&str> = sent[0].iter().map(|e| e.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            "https://arxiv.org/abs/2403.00005",
            "https://arxiv.org/abs/2403.00002",
            "https://robotics.news/2024/03/15/humanoid-laundry",
            "https://robotics.news/2024/03/15/warehouse-safety",
        ]
    );
    assert!(sent[0]
        .iter()
        .all(|e| e.summary.as_deref() == Some(&*format!("Summary of {}", e.title))));
}

#[tokio::test]
async fn small_budget_still_gives_each_topic_one() {
    let notifier = RecordingNotifier::default();
    let report = run_digest(
        &topics(),
        1,
        &pipeline(),
        &StubSummarizer { fail_on: None },
        &notifier,
    )
    .await;
    assert_eq!(report.fetched, 2);
    assert_eq!(notifier.sent.lock().unwrap()[0].len(), 2);
}

#[tokio::test]
async fn summarize_failure_skips_only_that_article() {
    let notifier = RecordingNotifier::default();
    let report = run_digest(
        &topics(),
        4,
        &pipeline(),
        &StubSummarizer {
            fail_on: Some("humanoid"),
        },
        &notifier,
    )
    .await;
    assert_eq!(report.fetched, 4);
    assert_eq!(report.summarized, 3);
    assert!(report.delivered);
    let sent = notifier.sent.lock().unwrap();
    assert!(sent[0].iter().all(|e| !e.url.contains("humanoid")));
}

#[tokio::test]
async fn notifier_failure_is_reported_not_raised() {
    let notifier = RecordingNotifier {
        fail: true,
        ..Default::default()
    };
    let report = run_digest(
        &topics(),
        2,
        &pipeline(),
        &StubSummarizer { fail_on: None },
        &notifier,
    )
    .await;
    assert_eq!(report.summarized, 2);
    assert!(!report.delivered);
}

#[tokio::test]
async fn no_topics_is_a_no_op() {
    let notifier = RecordingNotifier::default();
    let report = run_digest(&[], 3, &pipeline(), &StubSummarizer { fail_on: None }, &notifier).await;
    assert_eq!(report, DigestReport::default());
    assert!(notifier.sent.lock().unwrap().is_empty());
}
