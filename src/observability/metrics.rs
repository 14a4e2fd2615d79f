//! Metrics collection and exposition.
//!
//! # Metrics
//! - `hmac_proxy_requests_total` (counter): requests by mode and outcome
//!
//! The Prometheus exporter is only installed when an address is configured;
//! without it the counters are no-ops.

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::config::Mode;

/// Counter name for handled requests.
pub const REQUESTS_TOTAL: &str = "hmac_proxy_requests_total";

/// Install the Prometheus exporter listening on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Count one request for `mode` with the given outcome label.
pub fn record_request(mode: Mode, outcome: &'static str) {
    ::metrics::counter!(REQUESTS_TOTAL, "mode" => mode.as_str(), "outcome" => outcome).increment(1);
}
