//! Error taxonomy shared across the vox crates.
//!
//! - [`ValidationError`]: bad client input, surfaced as `400` and never retried
//! - [`UpstreamError`]: a failed call to one of the external services
//!
//! Whether an upstream failure is fatal or degraded is decided by the caller,
//! not by the error itself: a dictionary timeout degrades to placeholders while
//! a synthesis timeout fails the request.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

// ─────────────────────────────────────────────────────────────────────────────
// Validation
// ─────────────────────────────────────────────────────────────────────────────

/// Client input that cannot be turned into a [`crate::PronunciationRequest`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The word was absent, empty, or whitespace only.
    #[error("Word is required")]
    MissingWord,

    /// The word exceeds the accepted length.
    #[error("Word is too long ({actual} characters, max {max})")]
    WordTooLong {
        /// Maximum accepted length in characters.
        max: usize,
        /// Length of the submitted word.
        actual: usize,
    },

    /// The accent is not in the voice table.
    #[error("Unsupported accent: {accent}. Supported accents: {}", supported.join(", "))]
    UnsupportedAccent {
        /// The rejected accent tag.
        accent: String,
        /// Accent tags the server can synthesize.
        supported: Vec<String>,
    },

    /// The speed is not one of `slow`, `normal`, `fast`.
    #[error("Unsupported speed: {0}. Supported speeds: slow, normal, fast")]
    UnsupportedSpeed(String),
}

// ─────────────────────────────────────────────────────────────────────────────
// Upstream
// ─────────────────────────────────────────────────────────────────────────────

/// External collaborator an [`UpstreamError`] came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Service {
    /// Hosted phonetic table and letter shards.
    Dataset,
    /// Third-party definition API.
    Dictionary,
    /// Text-to-speech provider.
    Synthesis,
}

impl Service {
    /// Label used in logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dataset => "dataset",
            Self::Dictionary => "dictionary",
            Self::Synthesis => "synthesis",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed call to an external service.
#[derive(Clone, Debug, Error)]
pub enum UpstreamError {
    /// No response within the configured bound.
    #[error("{service} timed out after {after:?}")]
    Timeout {
        /// Which service timed out.
        service: Service,
        /// The bound that was exceeded.
        after: Duration,
    },

    /// The service answered with a non-success status.
    #[error("{service} returned {status}: {body}")]
    Status {
        /// Which service answered.
        service: Service,
        /// HTTP status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },

    /// Connection-level failure.
    #[error("{service} request failed: {message}")]
    Network {
        /// Which service was unreachable.
        service: Service,
        /// Transport error description.
        message: String,
    },

    /// The response arrived but its payload was not understood.
    #[error("{service} response could not be decoded: {message}")]
    Decode {
        /// Which service sent the payload.
        service: Service,
        /// Decoder error description.
        message: String,
    },
}

impl UpstreamError {
    /// The service this error came from.
    pub fn service(&self) -> Service {
        match self {
            Self::Timeout { service, .. }
            | Self::Status { service, .. }
            | Self::Network { service, .. }
            | Self::Decode { service, .. } => *service,
        }
    }

    /// Short classification string for logging/metrics.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::Status { .. } => "status",
            Self::Network { .. } => "network",
            Self::Decode { .. } => "decode",
        }
    }

    /// Build a [`UpstreamError::Status`], truncating long bodies.
    pub fn status(service: Service, status: u16, body: &str) -> Self {
        const MAX_BODY: usize = 512;
        let body = match body.char_indices().nth(MAX_BODY) {
            Some((idx, _)) => format!("{}…", &body[..idx]),
            None => body.to_string(),
        };
        Self::Status {
            service,
            status,
            body,
        }
    }
}
