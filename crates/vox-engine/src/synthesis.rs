//! Speech synthesis for a validated request.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, error};
use vox_core::{AudioMetadata, PronunciationRequest, VoiceTable};

use crate::clients::AUDIO_ENCODING;
use crate::errors::EngineError;
use crate::upstream::{SpeechSynthesizer, VoiceConfig};

/// Synthesized audio with the parameters that produced it.
#[derive(Clone, Debug)]
pub struct SynthesizedAudio {
    /// Encoded audio.
    pub audio: Bytes,
    /// Format, accent, voice, speed.
    pub metadata: AudioMetadata,
}

/// Picks the voice for a request and calls the synthesizer.
pub struct Synthesis {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    voices: Arc<VoiceTable>,
}

impl Synthesis {
    /// Create from a synthesizer and the voice table.
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>, voices: Arc<VoiceTable>) -> Self {
        Self { synthesizer, voices }
    }

    /// Voice selection for a request.
    pub fn voice_config(&self, request: &PronunciationRequest) -> Result<VoiceConfig, EngineError> {
        let profile = self
            .voices
            .profile(&request.accent)
            .ok_or_else(|| EngineError::NoVoice(request.accent.to_string()))?;
        Ok(VoiceConfig {
            language_code: profile.accent.clone(),
            voice_id: profile.voice_for(request.gender).to_string(),
            speaking_rate: request.speed.speaking_rate(),
        })
    }

    /// Speak the requested word. Any failure is fatal to the request.
    pub async fn synthesize(&self, request: &PronunciationRequest) -> Result<SynthesizedAudio, EngineError> {
        let voice = self.voice_config(request)?;
        let audio = self
            .synthesizer
            .synthesize(&request.word, &voice)
            .await
            .map_err(|e| {
                error!(word = %request.word, voice = %voice.voice_id, kind = e.error_kind(), error = %e, "synthesis failed");
                EngineError::Synthesis(e)
            })?;
        debug!(word = %request.word, voice = %voice.voice_id, bytes = audio.len(), "synthesized");

        Ok(SynthesizedAudio {
            audio,
            metadata: AudioMetadata {
                format: AUDIO_ENCODING.to_ascii_lowercase(),
                accent: request.accent.to_string(),
                voice_id: voice.voice_id,
                speed: request.speed.to_string(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use vox_core::{Service, UpstreamError};

    use super::*;

    struct Recorder {
        seen: Mutex<Vec<(String, VoiceConfig)>>,
        fail: bool,
    }

    #[async_trait]
    impl SpeechSynthesizer for Recorder {
        async fn synthesize(&self, text: &str, voice: &VoiceConfig) -> Result<Bytes, UpstreamError> {
            self.seen.lock().push((text.to_string(), voice.clone()));
            if self.fail {
                Err(UpstreamError::status(Service::Synthesis, 503, "unavailable"))
            } else {
                Ok(Bytes::from_static(b"ID3"))
            }
        }
    }

    fn synthesis(fail: bool) -> (Synthesis, Arc<Recorder>) {
        let recorder = Arc::new(Recorder {
            seen: Mutex::new(Vec::new()),
            fail,
        });
        let synthesis = Synthesis::new(
            Arc::clone(&recorder) as Arc<dyn SpeechSynthesizer>,
            Arc::new(VoiceTable::default()),
        );
        (synthesis, recorder)
    }

    fn request(accent: &str, is_male: bool, speed: &str) -> PronunciationRequest {
        PronunciationRequest::parse(Some(" Echo "), Some(accent), Some(is_male), Some(speed), &VoiceTable::default())
            .unwrap()
    }

    #[tokio::test]
    async fn picks_voice_and_rate() {
        let (synthesis, recorder) = synthesis(false);
        let out = synthesis.synthesize(&request("en-GB", false, "slow")).await.unwrap();

        assert_eq!(&out.audio[..], b"ID3");
        assert_eq!(out.metadata.format, "mp3");
        assert_eq!(out.metadata.accent, "en-GB");
        assert_eq!(out.metadata.voice_id, "en-GB-Neural2-A");
        assert_eq!(out.metadata.speed, "slow");

        let seen = recorder.seen.lock();
        assert_eq!(seen[0].0, "echo");
        assert_eq!(seen[0].1.language_code, "en-GB");
        assert!((seen[0].1.speaking_rate - 0.6).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn failure_is_fatal() {
        let (synthesis, _) = synthesis(true);
        let err = synthesis.synthesize(&request("en-US", true, "fast")).await.unwrap_err();
        assert!(matches!(err, EngineError::Synthesis(UpstreamError::Status { status: 503, .. })));
    }
}
