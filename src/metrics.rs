// src/metrics.rs
use std::net::SocketAddr;

use anyhow::{Context, Result};
use metrics::gauge;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and serve `/metrics` on `addr`.
/// Must run inside a Tokio runtime.
pub fn install_exporter(addr: SocketAddr) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .with_context(|| format!("prometheus: install exporter on {addr}"))?;

    crate::ingest::ensure_metrics_described();
    gauge!("news_digest_build_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
    tracing::info!(%addr, "metrics exporter listening");
    Ok(())
}
