//! Route handlers.

use std::time::Instant;

use axum::Json;
use axum::body::{Body, Bytes};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};
use vox_cache::validator_matches;
use vox_core::PronunciationRequest;
use vox_engine::{CacheStatus, Pronunciation};

use crate::errors::ApiError;
use crate::health::{self, HealthResponse};
use crate::metrics::{PRONUNCIATION_REQUESTS_TOTAL, PRONUNCIATION_REQUEST_DURATION_SECONDS};
use crate::server::AppState;

/// `Cache-Control` on pronunciation responses.
pub const PRONUNCIATION_CACHE_CONTROL: &str = "private, max-age=86400";
/// `Cache-Control` on letter shards.
pub const SHARD_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";
/// Cache outcome header.
pub const X_CACHE: &str = "x-cache";

// ─────────────────────────────────────────────────────────────────────────────
// POST /get-pronunciation
// ─────────────────────────────────────────────────────────────────────────────

/// Wire shape of the pronunciation request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PronunciationBody {
    /// Word to pronounce.
    pub word: Option<String>,
    /// Accent tag.
    pub accent: Option<String>,
    /// Male voice when true.
    pub is_male: Option<bool>,
    /// `slow`, `normal` or `fast`.
    pub speed: Option<String>,
}

/// POST /get-pronunciation
pub async fn get_pronunciation(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let started = Instant::now();
    let result = pronounce(&state, &headers, &body).await;
    let elapsed = started.elapsed();

    let response = match result {
        Ok(served) => pronunciation_response(&served, elapsed.as_secs_f64() * 1000.0),
        Err(err) => {
            if err.status().is_server_error() {
                warn!(error = %err, "pronunciation failed");
            }
            err.into_response()
        }
    };

    metrics::counter!(PRONUNCIATION_REQUESTS_TOTAL, "status" => response.status().as_str().to_owned())
        .increment(1);
    metrics::histogram!(PRONUNCIATION_REQUEST_DURATION_SECONDS).record(elapsed.as_secs_f64());
    response
}

async fn pronounce(state: &AppState, headers: &HeaderMap, body: &[u8]) -> Result<Pronunciation, ApiError> {
    let body: PronunciationBody =
        serde_json::from_slice(body).map_err(|e| ApiError::MalformedBody(e.to_string()))?;
    let request = PronunciationRequest::parse(
        body.word.as_deref(),
        body.accent.as_deref(),
        body.is_male,
        body.speed.as_deref(),
        &state.engine.voices,
    )?;

    let if_none_match = headers.get(header::IF_NONE_MATCH).and_then(|v| v.to_str().ok());
    state
        .engine
        .pronunciations
        .pronounce(&request, if_none_match)
        .await
        .map_err(|source| ApiError::Pronunciation {
            source,
            word: request.word.clone(),
        })
}

fn pronunciation_response(served: &Pronunciation, elapsed_ms: f64) -> Response {
    let entry = &served.entry;
    let mut response = if served.status == CacheStatus::NotModified {
        StatusCode::NOT_MODIFIED.into_response()
    } else {
        info!(word = %entry.value.word, cache = served.status.as_str(), "pronunciation served");
        Json(&entry.value).into_response()
    };

    let headers = response.headers_mut();
    insert_header(headers, header::ETAG, &entry.fingerprint);
    insert_header(headers, header::CACHE_CONTROL, PRONUNCIATION_CACHE_CONTROL);
    insert_header(
        headers,
        header::LAST_MODIFIED,
        &entry.stored_at.format("%a, %d %b %Y %H:%M:%S GMT").to_string(),
    );
    insert_header(headers, "server-timing", &format!("total;dur={elapsed_ms:.1}"));
    insert_header(headers, X_CACHE, served.status.as_str());
    response
}

fn insert_header<K: header::IntoHeaderName>(headers: &mut HeaderMap, name: K, value: &str) {
    if let Ok(value) = HeaderValue::from_str(value) {
        drop(headers.insert(name, value));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// GET /data/{letter}.json
// ─────────────────────────────────────────────────────────────────────────────

/// GET /data/{letter}.json: serves a cached letter shard verbatim.
pub async fn get_shard(State(state): State<AppState>, Path(file): Path<String>, headers: HeaderMap) -> Response {
    let Some(stem) = file.strip_suffix(".json") else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let letter = match parse_letter(stem) {
        Ok(letter) => letter,
        Err(err) => return err.into_response(),
    };

    let shard = match state.engine.datasets.shard(letter).await {
        Ok(shard) => shard,
        Err(e) => {
            warn!(%letter, error = %e, "shard proxy fetch failed");
            return ApiError::ShardUnavailable(e).into_response();
        }
    };

    let matched = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| validator_matches(v, &shard.fingerprint));

    let mut response = if matched {
        StatusCode::NOT_MODIFIED.into_response()
    } else {
        let mut response = Response::new(Body::from(shard.raw.clone()));
        insert_header(response.headers_mut(), header::CONTENT_TYPE, "application/json");
        response
    };
    let headers = response.headers_mut();
    insert_header(headers, header::ETAG, &shard.fingerprint);
    insert_header(headers, header::CACHE_CONTROL, SHARD_CACHE_CONTROL);
    response
}

fn parse_letter(stem: &str) -> Result<char, ApiError> {
    let mut chars = stem.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_lowercase() => Ok(c),
        _ => Err(ApiError::InvalidLetter(stem.to_string())),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Operational routes
// ─────────────────────────────────────────────────────────────────────────────

/// GET /reload-phonetics: drop and reload the bulk phonetic table.
pub async fn reload_phonetics(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let table = state.engine.reload_phonetics().await.map_err(ApiError::Reload)?;
    info!(entries = table.len(), "phonetic table reloaded");
    Ok(Json(json!({ "status": "success", "entries": table.len() })))
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(health::health_check(state.start_time, Utc::now()))
}

/// GET /metrics
pub async fn metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => crate::metrics::render(handle).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
