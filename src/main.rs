//! News digest: binary entrypoint.
//! Loads configuration, wires the topic pipeline to the summarizer and the
//! notifier, then runs once or on the daily schedule.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use news_digest::cli::Cli;
use news_digest::config::Config;
use news_digest::digest::run_digest;
use news_digest::ingest::config::load_feeds_default;
use news_digest::ingest::fetch::HttpFeedFetcher;
use news_digest::notify::{LogNotifier, Notifier, SmsNotifier};
use news_digest::summarize::build_summarizer;
use news_digest::TopicPipeline;

/// `RUST_LOG` filter (default `news_digest=info,ingest=info,notify=info,warn`);
/// `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("news_digest=info,ingest=info,notify=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();

    let feeds = load_feeds_default().context("loading feed map")?;
    let mut cfg = Config::from_env(&feeds).context("loading configuration")?;
    if !cli.topics.is_empty() {
        cfg.override_topics(cli.topics.clone(), &feeds);
    }

    if let Some(addr) = cfg.metrics_addr {
        news_digest::metrics::install_exporter(addr)?;
    }

    let fetcher = Arc::new(HttpFeedFetcher::new(cfg.feed_timeout)?);
    let pipeline = TopicPipeline::new(feeds, fetcher)
        .with_date_policy(cfg.date_policy)
        .with_concurrency(cfg.fetch_concurrency);

    let summarizer = build_summarizer(&cfg).context("building summarizer")?;
    let notifier: Arc<dyn Notifier> = match (&cfg.twilio, cli.dry_run) {
        (_, true) => Arc::new(LogNotifier),
        (Some(tw), false) => Arc::new(SmsNotifier::new(tw.clone())),
        (None, false) => {
            warn!("Twilio credentials missing; digest will only be logged");
            Arc::new(LogNotifier)
        }
    };

    info!(
        topics = %cfg.topics.join(", "),
        max_articles = cfg.max_articles,
        provider = summarizer.provider_name(),
        "news digest starting"
    );

    if cli.once {
        run_digest(
            &cfg.topics,
            cfg.max_articles,
            &pipeline,
            summarizer.as_ref(),
            notifier.as_ref(),
        )
        .await;
        return Ok(());
    }

    // Each scheduled run starts from an empty seen-set.
    let pipeline = Arc::new(pipeline);
    news_digest::scheduler::run_daily(cfg.schedule_times.clone(), || {
        let pipeline = pipeline.clone();
        let summarizer = summarizer.clone();
        let notifier = notifier.clone();
        let topics = cfg.topics.clone();
        let max_articles = cfg.max_articles;
        async move {
            pipeline.seen().clear();
            run_digest(
                &topics,
                max_articles,
                &pipeline,
                summarizer.as_ref(),
                notifier.as_ref(),
            )
            .await;
        }
    })
    .await
}
