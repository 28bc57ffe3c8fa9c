//! HTTP error responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use vox_cache::LoadError;
use vox_core::ValidationError;
use vox_engine::EngineError;

/// Suggestion attached to shard proxy failures.
const RETRY_SUGGESTION: &str = "The dictionary data host is unavailable. Please try again later.";

/// Every way a handler can fail, mapped to a status and JSON body.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request fields failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The body was not valid JSON of the expected shape.
    #[error("Invalid request body: {0}")]
    MalformedBody(String),

    /// `/data/{letter}.json` with something other than `a..=z`.
    #[error("Invalid letter: {0}. Expected a single letter a-z")]
    InvalidLetter(String),

    /// Assembling a pronunciation failed.
    #[error("{source}")]
    Pronunciation {
        /// Underlying failure.
        source: EngineError,
        /// Normalized word, echoed back.
        word: String,
    },

    /// The shard could not be fetched for the proxy route.
    #[error("Failed to load dictionary data: {0}")]
    ShardUnavailable(LoadError),

    /// Reloading the phonetic table failed.
    #[error("Failed to reload phonetic data: {0}")]
    Reload(LoadError),

    /// A handler panicked.
    #[error("Internal server error")]
    Panic,
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::MalformedBody(_) | Self::InvalidLetter(_) => StatusCode::BAD_REQUEST,
            Self::ShardUnavailable(_) => StatusCode::BAD_GATEWAY,
            Self::Pronunciation { .. } | Self::Reload(_) | Self::Panic => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Pronunciation { source, word } => json!({
                "error": "Failed to generate pronunciation",
                "details": source.to_string(),
                "suggestion": source.suggestion(),
                "word": word,
            }),
            Self::ShardUnavailable(_) => json!({
                "error": self.to_string(),
                "suggestion": RETRY_SUGGESTION,
            }),
            Self::Reload(_) => json!({
                "status": "error",
                "message": self.to_string(),
            }),
            _ => json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use vox_core::{Service, UpstreamError};

    use super::*;

    async fn body_of(err: ApiError) -> (StatusCode, serde_json::Value) {
        let resp = err.into_response();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), 10_000).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn validation_is_400_with_message() {
        let (status, body) = body_of(ValidationError::MissingWord.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Word is required");
    }

    #[tokio::test]
    async fn pronunciation_failure_shape() {
        let err = ApiError::Pronunciation {
            source: EngineError::Synthesis(UpstreamError::status(Service::Synthesis, 503, "down")),
            word: "echo".into(),
        };
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["word"], "echo");
        assert!(body["error"].is_string());
        assert!(body["suggestion"].as_str().unwrap().contains("try again"));
    }

    #[tokio::test]
    async fn shard_failure_is_502() {
        let err = ApiError::ShardUnavailable(LoadError::Upstream(UpstreamError::Network {
            service: Service::Dataset,
            message: "refused".into(),
        }));
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["suggestion"].is_string());
    }

    #[tokio::test]
    async fn reload_failure_shape() {
        let err = ApiError::Reload(LoadError::Malformed {
            key: "phonetics.json".into(),
            message: "expected map".into(),
        });
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["status"], "error");
        assert!(body["message"].as_str().unwrap().contains("phonetics.json"));
    }
}
