// src/ingest/pipeline.rs
//! Topic → feeds → merged, ranked entries.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use metrics::{counter, gauge};
use tracing::{info, warn};

use crate::clock::{Clock, SystemClock};
use crate::ingest::config::{normalize_topic, FeedMap};
use crate::ingest::ensure_metrics_described;
use crate::ingest::fetch::FeedFetcher;
use crate::ingest::parser::{rank, DatePolicy, FeedParser};
use crate::ingest::seen::SeenUrls;
use crate::ingest::types::{Entry, FeedReport, TopicReport};
use crate::relevance::RelevanceScorer;

pub const DEFAULT_FETCH_CONCURRENCY: usize = 4;

pub struct TopicPipeline {
    feeds: FeedMap,
    fetcher: Arc<dyn FeedFetcher>,
    clock: Arc<dyn Clock>,
    seen: Arc<SeenUrls>,
    scorer: RelevanceScorer,
    policy: DatePolicy,
    concurrency: usize,
}

impl TopicPipeline {
    /// Uses the system clock, a new seen-set and the feed map's keywords.
    pub fn new(feeds: FeedMap, fetcher: Arc<dyn FeedFetcher>) -> Self {
        let scorer = RelevanceScorer::with_keywords(feeds.keywords());
        Self {
            feeds,
            fetcher,
            clock: Arc::new(SystemClock),
            seen: Arc::new(SeenUrls::new()),
            scorer,
            policy: DatePolicy::default(),
            concurrency: DEFAULT_FETCH_CONCURRENCY,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Share a seen-set with other pipelines or keep one across runs.
    pub fn with_seen(mut self, seen: Arc<SeenUrls>) -> Self {
        self.seen = seen;
        self
    }

    /// Start over with an empty seen-set.
    pub fn with_fresh_seen(mut self) -> Self {
        self.seen = Arc::new(SeenUrls::new());
        self
    }

    pub fn with_scorer(mut self, scorer: RelevanceScorer) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn with_date_policy(mut self, policy: DatePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    pub fn seen(&self) -> &Arc<SeenUrls> {
        &self.seen
    }

    pub fn topics(&self) -> Vec<String> {
        self.feeds.topics().map(str::to_string).collect()
    }

    /// Merged, ranked entries for `topic`. Unknown topics and feed failures
    /// yield fewer (or no) entries, never an error.
    pub async fn articles_for_topic(&self, topic: &str) -> Vec<Entry> {
        self.run_topic(topic).await.entries
    }

    pub async fn run_topic(&self, topic: &str) -> TopicReport {
        ensure_metrics_described();
        let key = normalize_topic(topic);

        let Some(urls) = self.feeds.feeds_for(&key) else {
            warn!(target: "ingest", topic = %key, "unknown topic; no feeds configured");
            return TopicReport {
                topic: key,
                unknown_topic: true,
                ..TopicReport::default()
            };
        };

        let now = self.clock.now();
        let parser = FeedParser::new(&self.scorer, &self.seen).with_date_policy(self.policy);

        // Fetch concurrently; consume in configured order.
        let fetcher = &self.fetcher;
        let mut fetched = stream::iter(urls.iter())
            .map(|url| async move { (url, fetcher.fetch(url).await) })
            .buffered(self.concurrency);

        let mut entries = Vec::new();
        let mut feeds = Vec::with_capacity(urls.len());
        while let Some((url, result)) = fetched.next().await {
            let outcome = match result {
                Ok(payload) => {
                    let parsed = parser.parse(&payload, &key, now);
                    let stats = parsed.stats();
                    info!(
                        target: "ingest",
                        topic = %key,
                        %url,
                        items = stats.items,
                        accepted = stats.accepted,
                        skipped = stats.skipped,
                        date_fallbacks = stats.date_fallbacks,
                        "feed parsed"
                    );
                    entries.extend(parsed.entries);
                    Ok(stats)
                }
                Err(e) => {
                    warn!(target: "ingest", topic = %key, %url, error = %e, "feed fetch failed; continuing");
                    counter!("feed_fetch_errors_total").increment(1);
                    Err(e)
                }
            };
            feeds.push(FeedReport {
                url: url.clone(),
                outcome,
            });
        }

        rank(&mut entries);
        gauge!("pipeline_last_run_ts").set(now.timestamp() as f64);

        let report = TopicReport {
            topic: key,
            entries,
            feeds,
            unknown_topic: false,
        };
        info!(
            target: "ingest",
            topic = %report.topic,
            entries = report.entries.len(),
            failed_feeds = report.failed_feeds().count(),
            "topic run finished"
        );
        report
    }
}
