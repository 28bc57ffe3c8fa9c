//! `/health` endpoint.

use std::time::Instant;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

/// Health check response body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Always `"ok"` when the server is running.
    pub status: &'static str,
    /// Current time, RFC 3339.
    pub timestamp: String,
    /// Seconds since the server started.
    pub uptime_secs: u64,
}

/// Build a health response.
pub fn health_check(start_time: Instant, now: DateTime<Utc>) -> HealthResponse {
    HealthResponse {
        status: "ok",
        timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        uptime_secs: start_time.elapsed().as_secs(),
    }
}
