// src/ingest/fetch.rs
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{FetchCause, FetchError};

pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;
const USER_AGENT: &str = concat!("news-digest/", env!("CARGO_PKG_VERSION"));

/// Retrieves the raw payload behind one feed URL.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Plain HTTP(S) GET with a whole-request timeout.
#[derive(Debug, Clone)]
pub struct HttpFeedFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpFeedFetcher {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl FeedFetcher for HttpFeedFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let t0 = std::time::Instant::now();
        let result = async {
            let resp = self
                .client
                .get(url)
                .timeout(self.timeout)
                .send()
                .await
                .map_err(|e| FetchError::from_reqwest(url, &e))?;

            let status = resp.status();
            if !status.is_success() {
                return Err(FetchError::new(url, FetchCause::Status(status.as_u16())));
            }
            resp.text()
                .await
                .map_err(|e| FetchError::from_reqwest(url, &e))
        }
        .await;

        match &result {
            Ok(body) => debug!(
                target: "ingest",
                %url,
                bytes = body.len(),
                elapsed_ms = t0.elapsed().as_millis() as u64,
                "feed fetched"
            ),
            Err(e) => debug!(
                target: "ingest",
                %url,
                error = %e,
                elapsed_ms = t0.elapsed().as_millis() as u64,
                "feed fetch failed"
            ),
        }
        result
    }
}
