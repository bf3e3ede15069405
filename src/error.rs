// src/error.rs
//! Error types at the feed boundary. Item-level problems are not errors; see
//! [`crate::ingest::types::SkipReason`].

use thiserror::Error;

/// Why a single feed could not be retrieved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchCause {
    #[error("request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Connect(String),
    #[error("non-success status {0}")]
    Status(u16),
    #[error("failed reading body: {0}")]
    Body(String),
}

/// Transport failure for one feed URL. Recoverable at the topic level.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to fetch feed {url}: {cause}")]
pub struct FetchError {
    pub url: String,
    pub cause: FetchCause,
}

impl FetchError {
    pub fn new(url: impl Into<String>, cause: FetchCause) -> Self {
        Self {
            url: url.into(),
            cause,
        }
    }

    pub fn timeout(url: impl Into<String>) -> Self {
        Self::new(url, FetchCause::Timeout)
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self.cause, FetchCause::Timeout)
    }

    /// Map a reqwest error into our taxonomy.
    pub fn from_reqwest(url: &str, e: &reqwest::Error) -> Self {
        let cause = if e.is_timeout() {
            FetchCause::Timeout
        } else if let Some(status) = e.status() {
            FetchCause::Status(status.as_u16())
        } else if e.is_body() || e.is_decode() {
            FetchCause::Body(e.to_string())
        } else {
            FetchCause::Connect(e.to_string())
        };
        Self::new(url, cause)
    }
}
