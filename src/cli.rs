// src/cli.rs
use clap::Parser;

/// Fetch topic feeds, summarize the most relevant articles and text them out
/// on a daily schedule.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Run a single digest now and exit instead of following SCHEDULE_TIMES
    #[arg(long)]
    pub once: bool,

    /// Topic to include (repeatable); overrides TOPICS
    #[arg(short, long = "topic", value_name = "TOPIC")]
    pub topics: Vec<String>,

    /// Log the digest instead of sending SMS
    #[arg(long)]
    pub dry_run: bool,
}
