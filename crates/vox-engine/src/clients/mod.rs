//! reqwest-backed implementations of the upstream traits.

mod dataset;
mod dictionary;
mod tts;

use std::time::Duration;

use vox_core::{Service, UpstreamError};

use crate::errors::EngineError;

pub use dataset::HttpDatasetSource;
pub use dictionary::DictionaryApiClient;
pub use tts::{AUDIO_ENCODING, GoogleTtsClient};

fn build_client(
    service: Service,
    timeout: Duration,
    user_agent: &str,
    redirects: reqwest::redirect::Policy,
) -> Result<reqwest::Client, EngineError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .redirect(redirects)
        .build()
        .map_err(|e| EngineError::Client {
            service: service.as_str(),
            message: e.to_string(),
        })
}

fn map_transport(service: Service, timeout: Duration, err: &reqwest::Error) -> UpstreamError {
    if err.is_timeout() {
        UpstreamError::Timeout {
            service,
            after: timeout,
        }
    } else if err.is_decode() {
        UpstreamError::Decode {
            service,
            message: err.to_string(),
        }
    } else {
        UpstreamError::Network {
            service,
            message: err.to_string(),
        }
    }
}

/// Non-2xx → [`UpstreamError::Status`] carrying the (truncated) body.
async fn check_status(service: Service, response: reqwest::Response) -> Result<reqwest::Response, UpstreamError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(UpstreamError::status(service, status.as_u16(), &body))
}

fn record<T>(service: Service, result: &Result<T, UpstreamError>) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(e) => e.error_kind(),
    };
    metrics::counter!("upstream_requests_total", "service" => service.as_str(), "outcome" => outcome)
        .increment(1);
}

fn join_url(base: &str, segment: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), segment.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_url_normalizes_slashes() {
        assert_eq!(join_url("http://h/data/", "a.json"), "http://h/data/a.json");
        assert_eq!(join_url("http://h/data", "/a.json"), "http://h/data/a.json");
    }

    #[test]
    fn builds_client() {
        let client = build_client(
            Service::Dataset,
            Duration::from_secs(1),
            "vox/test",
            reqwest::redirect::Policy::none(),
        );
        assert!(client.is_ok());
    }
}
