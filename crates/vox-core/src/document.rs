//! The canonical response shape.
//!
//! Every pronunciation response has the same fields; sources that yield
//! nothing leave their fields empty rather than absent.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Placeholder used when no source produced a transcription.
pub const PHONETIC_UNAVAILABLE: &str = "Phonetic transcription not available.";

/// An example sentence, optionally tagged with the sense's part of speech.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExampleUsage {
    /// The sentence.
    pub text: String,
    /// Part of speech of the sense the example illustrates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_of_speech: Option<String>,
}

impl ExampleUsage {
    /// Example without a part-of-speech tag.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            part_of_speech: None,
        }
    }
}

/// How the audio was produced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioMetadata {
    /// Container format, e.g. `mp3`.
    pub format: String,
    /// Accent tag.
    pub accent: String,
    /// Synthesizer voice id.
    pub voice_id: String,
    /// Speed label.
    pub speed: String,
}

/// A fully assembled pronunciation response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseDocument {
    /// Normalized word.
    pub word: String,
    /// Synthesized audio, base64 on the wire.
    #[serde(with = "audio_base64")]
    pub audio_content: Bytes,
    /// IPA transcription or [`PHONETIC_UNAVAILABLE`].
    pub phonetic: String,
    /// Up to three definitions.
    pub meanings: Vec<String>,
    /// Up to three example usages.
    pub examples: Vec<ExampleUsage>,
    /// Distinct synonyms.
    pub synonyms: Vec<String>,
    /// Distinct antonyms.
    pub antonyms: Vec<String>,
    /// Synthesis parameters.
    pub audio_metadata: AudioMetadata,
}

mod audio_base64 {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map(Bytes::from)
            .map_err(serde::de::Error::custom)
    }
}
