//! Prometheus metrics recorder and `/metrics` rendering.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::{info, warn};

/// Install the global Prometheus recorder.
///
/// Returns `None` if a recorder is already installed (e.g. a second server in
/// the same process); metrics then go to the existing recorder.
pub fn install_recorder() -> Option<PrometheusHandle> {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            info!("prometheus metrics recorder installed");
            Some(handle)
        }
        Err(e) => {
            warn!(error = %e, "metrics recorder not installed");
            None
        }
    }
}

/// Render Prometheus text format.
pub fn render(handle: &PrometheusHandle) -> String {
    handle.render()
}

// Metric names. Cache and upstream counters are recorded in vox-cache and vox-engine.

/// Cache lookups (counter, labels: cache, outcome).
pub const CACHE_REQUESTS_TOTAL: &str = "cache_requests_total";
/// Upstream calls (counter, labels: service, outcome).
pub const UPSTREAM_REQUESTS_TOTAL: &str = "upstream_requests_total";
/// Pronunciation requests (counter, labels: status).
pub const PRONUNCIATION_REQUESTS_TOTAL: &str = "pronunciation_requests_total";
/// Pronunciation latency in seconds (histogram).
pub const PRONUNCIATION_REQUEST_DURATION_SECONDS: &str = "pronunciation_request_duration_seconds";
