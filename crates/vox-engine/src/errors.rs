//! Engine error type.

use thiserror::Error;
use vox_core::UpstreamError;

/// Failures that abort a pronunciation request.
///
/// Definition and dataset failures never appear here; they degrade to
/// placeholders inside the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Speech synthesis failed.
    #[error("speech synthesis failed: {0}")]
    Synthesis(#[source] UpstreamError),

    /// The voice table has no profile for a validated accent.
    #[error("no voice configured for accent {0}")]
    NoVoice(String),

    /// An HTTP client could not be constructed.
    #[error("failed to build {service} client: {message}")]
    Client {
        /// Service name.
        service: &'static str,
        /// Builder error.
        message: String,
    },
}

impl EngineError {
    /// Short classification string for logging/metrics.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::Synthesis(e) => e.error_kind(),
            Self::NoVoice(_) => "no_voice",
            Self::Client { .. } => "client",
        }
    }

    /// User-facing hint returned alongside a 500.
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::Synthesis(UpstreamError::Timeout { .. }) => {
                "The speech service is slow right now. Please try again in a moment."
            }
            Self::Synthesis(_) => "The speech service is unavailable. Please try again later.",
            Self::NoVoice(_) | Self::Client { .. } => {
                "The server is misconfigured. Please contact the administrator."
            }
        }
    }
}
