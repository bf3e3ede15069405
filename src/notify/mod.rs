// src/notify/mod.rs
pub mod sms;

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use crate::ingest::types::Entry;

pub use sms::SmsNotifier;

/// SMS bodies are kept at or under this many characters.
pub const MAX_MESSAGE_CHARS: usize = 1500;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a digest. An empty slice sends nothing.
    async fn send(&self, entries: &[Entry]) -> Result<()>;
}

/// One text block per entry.
pub fn format_entry(e: &Entry) -> String {
    format!(
        "[{}]\nTitle: {}\nSummary: {}\nLink: {}\n\n",
        e.topic,
        e.title,
        e.summary.as_deref().unwrap_or(""),
        e.url
    )
}

/// Pack entry blocks into messages of at most [`MAX_MESSAGE_CHARS`]
/// characters. A block longer than the limit goes out on its own.
pub fn format_messages(entries: &[Entry]) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for e in entries {
        let block = format_entry(e);
        let len = block.chars().count();
        if current_len + len > MAX_MESSAGE_CHARS && !current.is_empty() {
            out.push(std::mem::take(&mut current));
            current_len = 0;
        }
        current.push_str(&block);
        current_len += len;
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// Logs the digest instead of sending it (dry runs, missing credentials).
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, entries: &[Entry]) -> Result<()> {
        for (i, msg) in format_messages(entries).iter().enumerate() {
            info!(target: "notify", part = i + 1, chars = msg.chars().count(), "digest message:\n{msg}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(title: &str, summary: &str) -> Entry {
        let mut e = Entry::new(title, "http://example.com", "AI");
        e.summary = Some(summary.to_string());
        e
    }

    #[test]
    fn single_entry_single_message() {
        let msgs = format_messages(&[entry("Test Article", "This is a test summary.")]);
        assert_eq!(msgs.len(), 1);
        assert_eq!(
            msgs[0],
            "[AI]\nTitle: Test Article\nSummary: This is a test summary.\nLink: http://example.com\n\n"
        );
    }

    #[test]
    fn empty_input_gives_no_messages() {
        assert!(format_messages(&[]).is_empty());
    }

    #[test]
    fn chunks_respect_limit() {
        let entries: Vec<Entry> = (0..20).map(|i| entry(&format!("T{i}"), &"s".repeat(200))).collect();
        let msgs = format_messages(&entries);
        assert!(msgs.len() > 1);
        assert!(msgs.iter().all(|m| m.chars().count() <= MAX_MESSAGE_CHARS));
        let joined: String = msgs.concat();
        let expected: String = entries.iter().map(format_entry).collect();
        assert_eq!(joined, expected);
    }

    #[test]
    fn oversize_entry_stands_alone_without_empty_chunks() {
        let entries = vec![entry("big", &"x".repeat(2_000)), entry("small", "ok")];
        let msgs = format_messages(&entries);
        assert_eq!(msgs.len(), 2);
        assert!(msgs[0].contains("Title: big"));
        assert!(msgs[1].contains("Title: small"));
        assert!(msgs.iter().all(|m| !m.is_empty()));
    }
}
