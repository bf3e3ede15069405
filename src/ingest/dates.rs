// src/ingest/dates.rs
//! Publication-date normalization. Feeds in the wild mix RFC 822 and ISO 8601
//! flavours; each known layout is tried in a fixed order and the first hit wins.
//! Values without an explicit offset are taken as UTC. Failure is reported, never
//! guessed: the fallback policy belongs to the caller.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};

/// Known layouts, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    /// `Fri, 15 Mar 2024 10:30:00 +0200`
    Rfc822Offset,
    /// `Fri, 15 Mar 2024 10:30:00 GMT`
    Rfc822Gmt,
    /// `2024-03-15T10:30:00+02:00`
    Iso8601Offset,
    /// `2024-03-15T10:30:00Z`
    Iso8601Zulu,
    /// `Fri, 15 Mar 2024 10:30:00`
    Rfc822Naive,
    /// Anything else chrono's RFC 2822 parser accepts (`UT`, `EST`, no weekday, ...).
    Rfc2822Lenient,
    /// RFC 3339 with fractional seconds.
    Rfc3339,
    /// RFC 822 whose weekday name disagrees with the date (`Mon, 12 Mar 2024 ...`,
    /// a Tuesday). The weekday is dropped and the date itself trusted.
    Rfc822AnyWeekday,
}

pub const FORMATS: [DateFormat; 8] = [
    DateFormat::Rfc822Offset,
    DateFormat::Rfc822Gmt,
    DateFormat::Iso8601Offset,
    DateFormat::Iso8601Zulu,
    DateFormat::Rfc822Naive,
    DateFormat::Rfc2822Lenient,
    DateFormat::Rfc3339,
    DateFormat::Rfc822AnyWeekday,
];

impl DateFormat {
    fn try_parse(self, s: &str) -> Option<DateTime<FixedOffset>> {
        match self {
            DateFormat::Rfc822Offset => {
                DateTime::parse_from_str(s, "%a, %d %b %Y %H:%M:%S %z").ok()
            }
            DateFormat::Rfc822Gmt => naive_as_utc(s, "%a, %d %b %Y %H:%M:%S GMT"),
            DateFormat::Iso8601Offset => DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%z").ok(),
            DateFormat::Iso8601Zulu => naive_as_utc(s, "%Y-%m-%dT%H:%M:%SZ"),
            DateFormat::Rfc822Naive => naive_as_utc(s, "%a, %d %b %Y %H:%M:%S"),
            DateFormat::Rfc2822Lenient => DateTime::parse_from_rfc2822(s).ok(),
            DateFormat::Rfc3339 => DateTime::parse_from_rfc3339(s).ok(),
            DateFormat::Rfc822AnyWeekday => {
                let rest = strip_weekday(s)?;
                DateTime::parse_from_str(rest, "%d %b %Y %H:%M:%S %z")
                    .ok()
                    .or_else(|| naive_as_utc(rest, "%d %b %Y %H:%M:%S GMT"))
                    .or_else(|| naive_as_utc(rest, "%d %b %Y %H:%M:%S"))
            }
        }
    }
}

/// `"Mon, 12 Mar 2024 ..."` → `"12 Mar 2024 ..."`; `None` without a weekday prefix.
fn strip_weekday(s: &str) -> Option<&str> {
    let (day, rest) = s.split_once(',')?;
    let day = day.trim();
    (day.len() >= 3 && day.chars().all(|c| c.is_ascii_alphabetic())).then(|| rest.trim_start())
}

fn naive_as_utc(s: &str, fmt: &str) -> Option<DateTime<FixedOffset>> {
    NaiveDateTime::parse_from_str(s, fmt)
        .ok()
        .map(|n| n.and_utc().fixed_offset())
}

/// Parse and also report which layout matched.
pub fn parse_with_format(raw: &str) -> Option<(DateTime<FixedOffset>, DateFormat)> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    FORMATS
        .iter()
        .find_map(|f| f.try_parse(s).map(|dt| (dt, *f)))
}

/// Parse a publication date, `None` when no known layout matches.
pub fn parse_pub_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    parse_with_format(raw).map(|(dt, _)| dt)
}

/// The fallback timestamp for an unparseable date: the evaluation instant.
pub fn fallback_now(now: DateTime<Utc>) -> DateTime<FixedOffset> {
    now.fixed_offset()
}
