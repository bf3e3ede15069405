// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod cli;
pub mod clock;
pub mod config;
pub mod digest;
pub mod error;
pub mod ingest;
pub mod metrics;
pub mod notify;
pub mod relevance;
pub mod scheduler;
pub mod summarize;

// ---- Re-exports for stable public API ----
pub use crate::clock::{Clock, FixedClock, SystemClock};
pub use crate::error::{FetchCause, FetchError};
pub use crate::ingest::pipeline::TopicPipeline;
pub use crate::ingest::types::{Entry, ItemOutcome, SkipReason, TopicReport};
