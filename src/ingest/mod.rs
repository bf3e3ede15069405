// src/ingest/mod.rs
pub mod config;
pub mod dates;
pub mod fetch;
pub mod parser;
pub mod pipeline;
pub mod seen;
pub mod types;

use metrics::{describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;

static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)</?[a-z!][^>]*>").expect("tag regex"));
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("feed_items_total", "Raw items found in feed payloads.");
        describe_counter!(
            "feed_items_accepted_total",
            "Items scored and admitted to a result set."
        );
        describe_counter!(
            "feed_items_skipped_total",
            "Items skipped, labelled by reason."
        );
        describe_counter!(
            "feed_date_fallbacks_total",
            "Items whose pubDate was unparseable and dated at the evaluation instant."
        );
        describe_counter!("feed_fetch_errors_total", "Feed fetch failures.");
        describe_histogram!("feed_parse_ms", "Feed parse time in milliseconds.");
        describe_gauge!(
            "pipeline_last_run_ts",
            "Unix ts when a topic pipeline last ran."
        );
    });
}

/// Normalize feed text: decode entities, strip tags, fold quotes, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    out = RE_TAGS.replace_all(&out, " ").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    out = RE_WS.replace_all(&out, " ").to_string();
    out.trim().to_string()
}

/// Replace HTML-only entities that are not legal XML before handing the
/// payload to the XML reader.
pub(crate) fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&hellip;", "...")
}
