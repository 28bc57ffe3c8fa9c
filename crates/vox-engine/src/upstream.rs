//! Seams to the external services.
//!
//! Each trait has a reqwest-backed implementation in [`crate::clients`] and an
//! in-process fake in `testutil` (behind the `testutil` feature).

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use vox_core::UpstreamError;

// ─────────────────────────────────────────────────────────────────────────────
// Traits
// ─────────────────────────────────────────────────────────────────────────────

/// Hosted dataset storage.
#[async_trait]
pub trait DatasetSource: Send + Sync {
    /// Fetch the raw bytes stored under `key` (e.g. `phonetics.json`, `a.json`).
    async fn fetch(&self, key: &str) -> Result<Bytes, UpstreamError>;
}

/// Third-party definition service.
#[async_trait]
pub trait DefinitionProvider: Send + Sync {
    /// Look up `word`. An unknown word is `Ok` with no entries.
    async fn lookup(&self, word: &str) -> Result<Vec<DictionaryEntry>, UpstreamError>;
}

/// Text-to-speech service.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Speak `text` with `voice`, returning encoded audio.
    async fn synthesize(&self, text: &str, voice: &VoiceConfig) -> Result<Bytes, UpstreamError>;
}

/// Voice selection passed to a [`SpeechSynthesizer`].
#[derive(Clone, Debug, PartialEq)]
pub struct VoiceConfig {
    /// BCP-47 language code, e.g. `en-GB`.
    pub language_code: String,
    /// Synthesizer voice id.
    pub voice_id: String,
    /// Rate multiplier (1.0 = normal).
    pub speaking_rate: f64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Dictionary payload
// ─────────────────────────────────────────────────────────────────────────────

/// One headword returned by the definition service.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DictionaryEntry {
    /// Headword.
    pub word: String,
    /// Preferred transcription, if any.
    pub phonetic: Option<String>,
    /// Alternative transcriptions.
    pub phonetics: Vec<DictionaryPhonetic>,
    /// Senses grouped by part of speech.
    pub meanings: Vec<DictionaryMeaning>,
}

/// A transcription variant.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DictionaryPhonetic {
    /// IPA text.
    pub text: Option<String>,
}

/// Senses for one part of speech.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DictionaryMeaning {
    /// e.g. `noun`, `adjective`.
    pub part_of_speech: String,
    /// Individual senses.
    pub definitions: Vec<DictionaryDefinition>,
    /// Synonyms for the whole group.
    pub synonyms: Vec<String>,
    /// Antonyms for the whole group.
    pub antonyms: Vec<String>,
}

/// A single sense.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DictionaryDefinition {
    /// Definition text.
    pub definition: String,
    /// Example sentence.
    pub example: Option<String>,
    /// Synonyms for this sense.
    pub synonyms: Vec<String>,
    /// Antonyms for this sense.
    pub antonyms: Vec<String>,
}

impl DictionaryEntry {
    /// First non-empty transcription on the entry.
    pub fn transcription(&self) -> Option<&str> {
        self.phonetic
            .as_deref()
            .into_iter()
            .chain(self.phonetics.iter().filter_map(|p| p.text.as_deref()))
            .map(str::trim)
            .find(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dictionary_payload() {
        let json = r#"[{
            "word": "bright",
            "phonetics": [{"text": ""}, {"text": "/bɹaɪt/", "audio": "x.mp3"}],
            "meanings": [{
                "partOfSpeech": "adjective",
                "definitions": [{"definition": "Giving off light.", "example": "a bright lamp", "synonyms": [], "antonyms": ["dim"]}],
                "synonyms": ["luminous"]
            }],
            "license": {"name": "CC BY-SA 3.0"}
        }]"#;
        let entries: Vec<DictionaryEntry> = serde_json::from_str(json).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].transcription(), Some("/bɹaɪt/"));
        let meaning = &entries[0].meanings[0];
        assert_eq!(meaning.part_of_speech, "adjective");
        assert_eq!(meaning.definitions[0].example.as_deref(), Some("a bright lamp"));
        assert_eq!(meaning.synonyms, vec!["luminous"]);
    }

    #[test]
    fn transcription_prefers_top_level() {
        let entry = DictionaryEntry {
            phonetic: Some("/ɛkoʊ/".into()),
            phonetics: vec![DictionaryPhonetic {
                text: Some("/ˈɛk.əʊ/".into()),
            }],
            ..DictionaryEntry::default()
        };
        assert_eq!(entry.transcription(), Some("/ɛkoʊ/"));
        assert_eq!(DictionaryEntry::default().transcription(), None);
    }
}
