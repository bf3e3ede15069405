// src/ingest/parser.rs
//! Feed payload → ranked, deduplicated, recency-filtered entries.
//!
//! Items are pulled out of the XML with a streaming reader so one broken item
//! does not take its siblings down. Each raw item then goes through the
//! admission steps (link, dedup, date, recency, score) and ends as an
//! [`ItemOutcome`].

use chrono::{DateTime, Duration, Utc};
use metrics::{counter, histogram};
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use tracing::{debug, warn};

use crate::ingest::dates::{fallback_now, parse_pub_date};
use crate::ingest::seen::SeenUrls;
use crate::ingest::types::{Entry, FeedParse, ItemOutcome, SkipReason, UNTITLED};
use crate::ingest::{normalize_text, scrub_html_entities_for_xml};
use crate::relevance::RelevanceScorer;

/// Entries older than this (relative to the evaluation instant) are dropped.
pub const MAX_AGE_HOURS: i64 = 24;

/// What to do with a pubDate no known layout understands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DatePolicy {
    /// Date the item at the evaluation instant and keep going.
    #[default]
    TreatAsNow,
    /// Skip the item.
    Discard,
}

impl std::str::FromStr for DatePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "now" | "treat_as_now" => Ok(DatePolicy::TreatAsNow),
            "discard" | "drop" => Ok(DatePolicy::Discard),
            other => anyhow::bail!("unknown date policy `{other}` (expected `now` or `discard`)"),
        }
    }
}

/// Fields of one `<item>` as found in the payload, before any validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawItem {
    pub title: Option<String>,
    pub link: Option<String>,
    pub description: Option<String>,
    pub pub_date: Option<String>,
    /// Set when some part of the item could not be decoded.
    pub malformed: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Link,
    Description,
    PubDate,
}

impl Field {
    fn from_tag(name: &[u8]) -> Option<Self> {
        match name {
            b"title" => Some(Field::Title),
            b"link" => Some(Field::Link),
            b"description" => Some(Field::Description),
            b"pubDate" => Some(Field::PubDate),
            _ => None,
        }
    }
}

impl RawItem {
    fn slot(&mut self, f: Field) -> &mut Option<String> {
        match f {
            Field::Title => &mut self.title,
            Field::Link => &mut self.link,
            Field::Description => &mut self.description,
            Field::PubDate => &mut self.pub_date,
        }
    }

    fn push_text(&mut self, f: Field, text: &str) {
        let slot = self.slot(f);
        match slot {
            Some(existing) => {
                existing.push(' ');
                existing.push_str(text);
            }
            None => *slot = Some(text.to_string()),
        }
    }
}

/// Pull every `<item>` out of an RSS payload.
///
/// Never fails: a payload with no recognisable items yields an empty vector.
/// Damage inside one item (a bad escape, a mismatched close tag, a reader
/// error) flags that item as malformed and extraction carries on with the next
/// one. Reading stops only when the reader cannot make progress.
pub fn extract_items(payload: &str) -> Vec<RawItem> {
    let xml = scrub_html_entities_for_xml(payload);
    let mut reader = Reader::from_str(&xml);
    // Close tags are matched against `open` below, per item.
    reader.config_mut().check_end_names = false;
    reader.config_mut().trim_text(true);

    let mut items = Vec::new();
    let mut current: Option<RawItem> = None;
    let mut field: Option<Field> = None;
    // Elements opened inside the current item and not yet closed.
    let mut open: Vec<Vec<u8>> = Vec::new();
    let mut last_error_at = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.name();
                if name.as_ref() == b"item" {
                    if let Some(mut unclosed) = current.take() {
                        mark_malformed(&mut unclosed, "item not closed before the next one".into());
                        items.push(unclosed);
                    }
                    current = Some(RawItem::default());
                    field = None;
                    open.clear();
                } else if current.is_some() {
                    if open.is_empty() {
                        field = Field::from_tag(name.as_ref());
                    }
                    open.push(name.as_ref().to_vec());
                }
            }
            Ok(Event::End(e)) => {
                let name = e.name();
                if name.as_ref() == b"item" {
                    if let Some(mut item) = current.take() {
                        if let Some(tag) = open.first() {
                            let why = format!("<{}> not closed", String::from_utf8_lossy(tag));
                            mark_malformed(&mut item, why);
                        }
                        items.push(item);
                    }
                    field = None;
                    open.clear();
                } else if let Some(item) = current.as_mut() {
                    match open.pop() {
                        Some(tag) if tag == name.as_ref() => {}
                        expected => {
                            let why = format!(
                                "expected </{}>, found </{}>",
                                expected.as_deref().map(String::from_utf8_lossy).unwrap_or_default(),
                                String::from_utf8_lossy(name.as_ref()),
                            );
                            mark_malformed(item, why);
                        }
                    }
                    if open.is_empty() {
                        field = None;
                    }
                }
            }
            Ok(Event::Text(t)) => {
                if let (Some(item), Some(f)) = (current.as_mut(), field) {
                    match t.unescape() {
                        Ok(text) => item.push_text(f, &text),
                        Err(err) => mark_malformed(item, err.to_string()),
                    }
                }
            }
            Ok(Event::CData(c)) => {
                if let (Some(item), Some(f)) = (current.as_mut(), field) {
                    let text = String::from_utf8_lossy(c.as_ref()).into_owned();
                    item.push_text(f, &text);
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => {
                let pos = reader.buffer_position();
                if let Some(item) = current.as_mut() {
                    mark_malformed(item, format!("xml error at byte {pos}: {err}"));
                }
                if last_error_at == Some(pos) {
                    warn!(target: "ingest", error = %err, position = pos, "feed xml reader stuck; stopping extraction");
                    break;
                }
                warn!(target: "ingest", error = %err, position = pos, "feed xml broken; resuming");
                last_error_at = Some(pos);
            }
            _ => {}
        }
    }

    if let Some(mut truncated) = current.take() {
        mark_malformed(&mut truncated, "payload ended inside an item".into());
        items.push(truncated);
    }
    items
}

fn mark_malformed(item: &mut RawItem, why: String) {
    item.malformed.get_or_insert(why);
}

/// Parses payloads for one topic against a shared seen-set.
#[derive(Debug, Clone, Copy)]
pub struct FeedParser<'a> {
    scorer: &'a RelevanceScorer,
    seen: &'a SeenUrls,
    policy: DatePolicy,
}

impl<'a> FeedParser<'a> {
    pub fn new(scorer: &'a RelevanceScorer, seen: &'a SeenUrls) -> Self {
        Self {
            scorer,
            seen,
            policy: DatePolicy::default(),
        }
    }

    pub fn with_date_policy(mut self, policy: DatePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Parse a whole payload. Entries come back ranked by score, stable on ties.
    pub fn parse(&self, payload: &str, topic: &str, now: DateTime<Utc>) -> FeedParse {
        let t0 = std::time::Instant::now();
        let raw = extract_items(payload);
        counter!("feed_items_total").increment(raw.len() as u64);

        let mut out = FeedParse::default();
        for item in raw {
            let (outcome, fell_back) = self.evaluate(item, topic, now);
            if fell_back {
                out.date_fallbacks += 1;
            }
            match outcome {
                ItemOutcome::Accepted(entry) => out.entries.push(entry),
                ItemOutcome::Skipped(reason) => {
                    counter!("feed_items_skipped_total", "reason" => reason.label()).increment(1);
                    out.skipped.push(reason);
                }
            }
        }
        rank(&mut out.entries);

        counter!("feed_items_accepted_total").increment(out.entries.len() as u64);
        counter!("feed_date_fallbacks_total").increment(out.date_fallbacks as u64);
        histogram!("feed_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        out
    }

    /// Run one raw item through admission. The flag reports a date fallback.
    pub fn evaluate(&self, item: RawItem, topic: &str, now: DateTime<Utc>) -> (ItemOutcome, bool) {
        if let Some(why) = item.malformed {
            warn!(target: "ingest", %topic, reason = %why, "skipping malformed item");
            return (ItemOutcome::Skipped(SkipReason::Malformed(why)), false);
        }

        let url = match item.link.as_deref().map(str::trim) {
            Some(u) if !u.is_empty() => u.to_string(),
            _ => return (ItemOutcome::Skipped(SkipReason::MissingLink), false),
        };
        if self.seen.contains(&url) {
            debug!(target: "ingest", %url, "duplicate url");
            return (ItemOutcome::Skipped(SkipReason::DuplicateUrl), false);
        }

        let title = item
            .title
            .as_deref()
            .map(normalize_text)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| UNTITLED.to_string());
        let content = item.description.as_deref().map(normalize_text).unwrap_or_default();

        let mut fell_back = false;
        let published_at = match item.pub_date.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => match parse_pub_date(raw) {
                Some(dt) => Some(dt),
                None => match self.policy {
                    DatePolicy::TreatAsNow => {
                        warn!(target: "ingest", %url, pub_date = raw, "unparseable pubDate; dating at evaluation instant");
                        fell_back = true;
                        Some(fallback_now(now))
                    }
                    DatePolicy::Discard => {
                        warn!(target: "ingest", %url, pub_date = raw, "unparseable pubDate; discarding");
                        return (ItemOutcome::Skipped(SkipReason::UnparseableDate), false);
                    }
                },
            },
        };

        if let Some(p) = published_at {
            if now.signed_duration_since(p.with_timezone(&Utc)) > Duration::hours(MAX_AGE_HOURS) {
                debug!(target: "ingest", %url, "stale item");
                return (ItemOutcome::Skipped(SkipReason::Stale), fell_back);
            }
        }

        let mut entry = Entry {
            title,
            url,
            topic: topic.to_string(),
            content,
            published_at,
            summary: None,
            relevance_score: 0.0,
        };
        entry.relevance_score = self.scorer.score(&entry, now);
        if entry.relevance_score <= 0.0 {
            debug!(target: "ingest", url = %entry.url, "zero score");
            return (ItemOutcome::Skipped(SkipReason::NonPositiveScore), fell_back);
        }

        // Another feed may have admitted the same url since the check above.
        if !self.seen.admit(&entry.url) {
            return (ItemOutcome::Skipped(SkipReason::DuplicateUrl), fell_back);
        }
        debug!(target: "ingest", url = %entry.url, score = entry.relevance_score, "accepted");
        (ItemOutcome::Accepted(entry), fell_back)
    }
}

/// Sort by score descending; equal scores keep their order.
pub fn rank(entries: &mut [Entry]) {
    entries.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
}
