//! Client for the dictionaryapi.dev entries endpoint.

use std::time::Duration;

use async_trait::async_trait;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::StatusCode;
use vox_core::{Service, UpstreamError};
use vox_settings::UpstreamSettings;

use super::{build_client, check_status, join_url, map_transport, record};
use crate::errors::EngineError;
use crate::upstream::{DefinitionProvider, DictionaryEntry};

/// Unreserved characters pass through; everything else in a word is escaped.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

/// Fetches `GET {base}/{word}`.
pub struct DictionaryApiClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl DictionaryApiClient {
    /// Build from upstream settings.
    pub fn new(settings: &UpstreamSettings) -> Result<Self, EngineError> {
        let timeout = settings.definition_timeout();
        Ok(Self {
            client: build_client(
                Service::Dictionary,
                timeout,
                &settings.user_agent,
                reqwest::redirect::Policy::limited(settings.max_redirects),
            )?,
            base_url: settings.dictionary_base_url.clone(),
            timeout,
        })
    }

    async fn get(&self, word: &str) -> Result<Vec<DictionaryEntry>, UpstreamError> {
        let segment = utf8_percent_encode(word, PATH_SEGMENT).to_string();
        let url = join_url(&self.base_url, &segment);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| map_transport(Service::Dictionary, self.timeout, &e))?;

        // the service answers unknown words with 404 and a "No Definitions Found" body
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        let response = check_status(Service::Dictionary, response).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| map_transport(Service::Dictionary, self.timeout, &e))?;
        serde_json::from_slice(&body).map_err(|e| UpstreamError::Decode {
            service: Service::Dictionary,
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl DefinitionProvider for DictionaryApiClient {
    async fn lookup(&self, word: &str) -> Result<Vec<DictionaryEntry>, UpstreamError> {
        let result = self.get(word).await;
        record(Service::Dictionary, &result);
        result
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client(server: &MockServer) -> DictionaryApiClient {
        DictionaryApiClient::new(&UpstreamSettings {
            dictionary_base_url: format!("{}/api/v2/entries/en", server.uri()),
            ..UpstreamSettings::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn parses_entries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/entries/en/echo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
                "word": "echo",
                "phonetic": "/ˈɛkəʊ/",
                "meanings": [{
                    "partOfSpeech": "noun",
                    "definitions": [{"definition": "A reflected sound."}]
                }]
            }])))
            .mount(&server)
            .await;

        let entries = client(&server).lookup("echo").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].meanings[0].definitions[0].definition, "A reflected sound.");
    }

    #[tokio::test]
    async fn not_found_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "title": "No Definitions Found"
            })))
            .mount(&server)
            .await;

        let entries = client(&server).lookup("zzxq").await.unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn word_is_path_encoded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/entries/en/ice%20cream"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let entries = client(&server).lookup("ice cream").await.unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn garbage_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = client(&server).lookup("echo").await.unwrap_err();
        assert_eq!(err.error_kind(), "decode");
    }

    #[tokio::test]
    async fn server_error_is_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client(&server).lookup("echo").await.unwrap_err();
        assert!(matches!(err, UpstreamError::Status { status: 500, .. }));
    }
}
