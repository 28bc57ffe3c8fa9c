//! In-process fake upstreams with call counters.
//!
//! Enabled with the `testutil` feature so integration tests in other crates
//! can build a full [`Engine`](crate::Engine) without network access.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use vox_core::{Service, UpstreamError};

use crate::engine::Upstreams;
use crate::upstream::{
    DatasetSource, DefinitionProvider, DictionaryDefinition, DictionaryEntry, DictionaryMeaning, SpeechSynthesizer,
    VoiceConfig,
};

/// Bulk table used by [`FakeDatasets::sample`].
pub const SAMPLE_TABLE: &str = r#"{
    "color": {"US": "ˈkʌlər", "UK": "ˈkʌlə", "examples": ["What color is the sky?"]},
    "echo": {"US": "ˈɛkoʊ", "UK": "ˈɛkəʊ"}
}"#;

/// Letter `e` shard used by [`FakeDatasets::sample`].
pub const SAMPLE_SHARD_E: &str = r#"{
    "echo": {"phonetic": "/ˈɛkoʊ/", "examples": ["The echo faded."]}
}"#;

// ─────────────────────────────────────────────────────────────────────────────
// Datasets
// ─────────────────────────────────────────────────────────────────────────────

/// Serves fixed bytes per key; unknown keys answer 404.
#[derive(Default)]
pub struct FakeDatasets {
    files: Mutex<HashMap<String, Bytes>>,
    calls: Mutex<HashMap<String, usize>>,
    delay: Mutex<Option<Duration>>,
    down: AtomicBool,
}

impl FakeDatasets {
    /// Bulk table plus the `e` shard.
    pub fn sample() -> Self {
        let fake = Self::default();
        fake.put("phonetics.json", SAMPLE_TABLE);
        fake.put("e.json", SAMPLE_SHARD_E);
        fake
    }

    /// Store `body` under `key`.
    pub fn put(&self, key: &str, body: &str) {
        drop(self.files.lock().insert(key.to_string(), Bytes::from(body.to_string())));
    }

    /// Delay every fetch.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    /// Make every fetch fail with a network error.
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    /// Fetches of `key` so far.
    pub fn calls(&self, key: &str) -> usize {
        self.calls.lock().get(key).copied().unwrap_or(0)
    }

    /// Fetches of every key so far.
    pub fn total_calls(&self) -> usize {
        self.calls.lock().values().sum()
    }
}

#[async_trait]
impl DatasetSource for FakeDatasets {
    async fn fetch(&self, key: &str) -> Result<Bytes, UpstreamError> {
        *self.calls.lock().entry(key.to_string()).or_default() += 1;
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.down.load(Ordering::SeqCst) {
            return Err(UpstreamError::Network {
                service: Service::Dataset,
                message: "connection refused".into(),
            });
        }
        let body = self.files.lock().get(key).cloned();
        body.ok_or_else(|| UpstreamError::status(Service::Dataset, 404, "not found"))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Dictionary
// ─────────────────────────────────────────────────────────────────────────────

/// Answers from a word → entries map; unknown words are empty.
#[derive(Default)]
pub struct FakeDictionary {
    entries: Mutex<HashMap<String, Vec<DictionaryEntry>>>,
    calls: AtomicUsize,
    delay: Mutex<Option<Duration>>,
    failing: AtomicBool,
}

impl FakeDictionary {
    /// Knows `echo` (noun + adjective senses).
    pub fn sample() -> Self {
        let fake = Self::default();
        fake.put(
            "echo",
            vec![DictionaryEntry {
                word: "echo".into(),
                phonetic: Some("/ˈɛkəʊ/".into()),
                meanings: vec![
                    DictionaryMeaning {
                        part_of_speech: "noun".into(),
                        definitions: vec![DictionaryDefinition {
                            definition: "A reflected sound.".into(),
                            example: Some("We heard the echo of our shouts.".into()),
                            synonyms: vec!["reverberation".into()],
                            ..DictionaryDefinition::default()
                        }],
                        ..DictionaryMeaning::default()
                    },
                    DictionaryMeaning {
                        part_of_speech: "adjective".into(),
                        definitions: vec![DictionaryDefinition {
                            definition: "Repeating an earlier sound.".into(),
                            ..DictionaryDefinition::default()
                        }],
                        ..DictionaryMeaning::default()
                    },
                ],
                ..DictionaryEntry::default()
            }],
        );
        fake
    }

    /// Register entries for `word`.
    pub fn put(&self, word: &str, entries: Vec<DictionaryEntry>) {
        drop(self.entries.lock().insert(word.to_string(), entries));
    }

    /// Delay every lookup.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    /// Make every lookup fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Lookups so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DefinitionProvider for FakeDictionary {
    async fn lookup(&self, word: &str) -> Result<Vec<DictionaryEntry>, UpstreamError> {
        let _ = self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(UpstreamError::status(Service::Dictionary, 502, "bad gateway"));
        }
        Ok(self.entries.lock().get(word).cloned().unwrap_or_default())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Synthesizer
// ─────────────────────────────────────────────────────────────────────────────

/// Returns `ID3` + the text; records every voice it was asked for.
#[derive(Default)]
pub struct FakeSynthesizer {
    voices: Mutex<Vec<VoiceConfig>>,
    delay: Mutex<Option<Duration>>,
    failing: AtomicBool,
}

impl FakeSynthesizer {
    /// Delay every call.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    /// Make every call fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Calls so far.
    pub fn calls(&self) -> usize {
        self.voices.lock().len()
    }

    /// Voices requested so far, in order.
    pub fn voices(&self) -> Vec<VoiceConfig> {
        self.voices.lock().clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for FakeSynthesizer {
    async fn synthesize(&self, text: &str, voice: &VoiceConfig) -> Result<Bytes, UpstreamError> {
        self.voices.lock().push(voice.clone());
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(UpstreamError::status(Service::Synthesis, 503, "unavailable"));
        }
        Ok(Bytes::from(format!("ID3{text}")))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Bundle
// ─────────────────────────────────────────────────────────────────────────────

/// Handles to the fakes behind an [`Upstreams`].
#[derive(Clone)]
pub struct Fakes {
    /// Dataset fake.
    pub datasets: Arc<FakeDatasets>,
    /// Dictionary fake.
    pub dictionary: Arc<FakeDictionary>,
    /// Synthesizer fake.
    pub synthesizer: Arc<FakeSynthesizer>,
}

impl Fakes {
    /// Sample datasets and dictionary, working synthesizer.
    pub fn sample() -> Self {
        Self {
            datasets: Arc::new(FakeDatasets::sample()),
            dictionary: Arc::new(FakeDictionary::sample()),
            synthesizer: Arc::new(FakeSynthesizer::default()),
        }
    }

    /// Upstreams backed by these fakes.
    pub fn upstreams(&self) -> Upstreams {
        Upstreams {
            datasets: Arc::clone(&self.datasets) as Arc<dyn DatasetSource>,
            dictionary: Arc::clone(&self.dictionary) as Arc<dyn DefinitionProvider>,
            synthesizer: Arc::clone(&self.synthesizer) as Arc<dyn SpeechSynthesizer>,
        }
    }

    /// Upstream calls of every kind so far.
    pub fn total_calls(&self) -> usize {
        self.datasets.total_calls() + self.dictionary.calls() + self.synthesizer.calls()
    }
}
