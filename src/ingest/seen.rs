// src/ingest/seen.rs
//! URLs already admitted by a pipeline instance.
//!
//! The set only grows. Whoever owns the `Arc<SeenUrls>` decides its lifetime:
//! build a fresh one per run to reset, or share one across runs for process-wide
//! dedup (and recycle it with [`SeenUrls::clear`] when memory matters).

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
pub struct SeenUrls {
    inner: Mutex<HashSet<String>>,
}

impl SeenUrls {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        // Poisoning cannot leave the set inconsistent.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn contains(&self, url: &str) -> bool {
        self.lock().contains(url)
    }

    /// Record `url` as admitted. Returns `false` if someone got there first.
    pub fn admit(&self, url: &str) -> bool {
        self.lock().insert(url.to_string())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}
