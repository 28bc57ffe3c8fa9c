//! Google Cloud Text-to-Speech client (`text:synthesize`).

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use vox_core::{Service, UpstreamError};
use vox_settings::UpstreamSettings;

use super::{build_client, check_status, join_url, map_transport, record};
use crate::errors::EngineError;
use crate::upstream::{SpeechSynthesizer, VoiceConfig};

/// Audio encoding requested from the service.
pub const AUDIO_ENCODING: &str = "MP3";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest<'a> {
    input: SynthesisInput<'a>,
    voice: VoiceSelection<'a>,
    audio_config: AudioConfig,
}

#[derive(Serialize)]
struct SynthesisInput<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelection<'a> {
    language_code: &'a str,
    name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig {
    audio_encoding: &'static str,
    speaking_rate: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    #[serde(default)]
    audio_content: String,
}

/// Posts to `{base}/v1/text:synthesize`, authenticating with an API key.
pub struct GoogleTtsClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl GoogleTtsClient {
    /// Build from upstream settings.
    pub fn new(settings: &UpstreamSettings) -> Result<Self, EngineError> {
        let timeout = settings.synthesis_timeout();
        Ok(Self {
            client: build_client(
                Service::Synthesis,
                timeout,
                &settings.user_agent,
                reqwest::redirect::Policy::none(),
            )?,
            endpoint: join_url(&settings.tts_base_url, "v1/text:synthesize"),
            api_key: settings.tts_api_key.clone(),
            timeout,
        })
    }

    async fn post(&self, text: &str, voice: &VoiceConfig) -> Result<Bytes, UpstreamError> {
        let body = SynthesizeRequest {
            input: SynthesisInput { text },
            voice: VoiceSelection {
                language_code: &voice.language_code,
                name: &voice.voice_id,
            },
            audio_config: AudioConfig {
                audio_encoding: AUDIO_ENCODING,
                speaking_rate: voice.speaking_rate,
            },
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.query(&[("key", key)]);
        }
        let response = request
            .send()
            .await
            .map_err(|e| map_transport(Service::Synthesis, self.timeout, &e))?;
        let response = check_status(Service::Synthesis, response).await?;
        let payload: SynthesizeResponse = response
            .json()
            .await
            .map_err(|e| map_transport(Service::Synthesis, self.timeout, &e))?;

        let audio = STANDARD
            .decode(payload.audio_content.as_bytes())
            .map_err(|e| UpstreamError::Decode {
                service: Service::Synthesis,
                message: format!("audioContent is not base64: {e}"),
            })?;
        if audio.is_empty() {
            return Err(UpstreamError::Decode {
                service: Service::Synthesis,
                message: "empty audioContent".into(),
            });
        }
        Ok(Bytes::from(audio))
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleTtsClient {
    async fn synthesize(&self, text: &str, voice: &VoiceConfig) -> Result<Bytes, UpstreamError> {
        let result = self.post(text, voice).await;
        record(Service::Synthesis, &result);
        result
    }
}
