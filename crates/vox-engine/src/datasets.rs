//! Hosted datasets: the bulk phonetic table and per-letter dictionary shards.
//!
//! Bulk table (`phonetics.json`), keyed by word (matched case-insensitively):
//!
//! ```json
//! { "color": { "US": "ˈkʌlər", "UK": "ˈkʌlə", "examples": ["What color is it?"] } }
//! ```
//!
//! Letter shard (`{letter}.json`), keyed by word:
//!
//! ```json
//! { "cat": { "phonetic": "/kæt/", "examples": ["The cat slept.", {"text": "...", "partOfSpeech": "noun"}] } }
//! ```
//!
//! Both are parsed once per fetch and shared immutably.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use serde::Deserialize;
use vox_cache::{DatasetCache, DatasetCacheConfig, DatasetCacheStats, LoadError, content_fingerprint};
use vox_core::Region;

use crate::upstream::DatasetSource;

// ─────────────────────────────────────────────────────────────────────────────
// Bulk phonetic table
// ─────────────────────────────────────────────────────────────────────────────

/// Transcriptions and curated examples for one word.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PhoneticEntry {
    /// Headword as it appears in the table.
    pub word: String,
    /// US transcription.
    pub us: Option<String>,
    /// UK transcription.
    pub uk: Option<String>,
    /// Curated example sentences, in table order.
    pub curated_examples: Vec<String>,
}

impl PhoneticEntry {
    /// Transcription for one region.
    pub fn form(&self, region: Region) -> Option<&str> {
        match region {
            Region::Us => self.us.as_deref(),
            Region::Uk => self.uk.as_deref(),
        }
    }

    /// Preferred region first, then the fixed fallback order.
    pub fn form_for(&self, preferred: Region) -> Option<&str> {
        std::iter::once(preferred)
            .chain(Region::ALL)
            .find_map(|region| self.form(region))
    }
}

#[derive(Deserialize)]
struct RawPhonetic {
    #[serde(rename = "US", default)]
    us: Option<String>,
    #[serde(rename = "UK", default)]
    uk: Option<String>,
    #[serde(default)]
    examples: Vec<String>,
}

/// The bulk phonetic table.
#[derive(Debug, Default)]
pub struct PhoneticTable {
    entries: HashMap<String, PhoneticEntry>,
}

impl PhoneticTable {
    /// Parse the table fetched under `key`.
    pub fn parse(key: &str, bytes: &[u8]) -> Result<Self, LoadError> {
        let raw: HashMap<String, RawPhonetic> = serde_json::from_slice(bytes).map_err(|e| LoadError::Malformed {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        let entries = raw
            .into_iter()
            .map(|(word, r)| {
                let entry = PhoneticEntry {
                    word: word.clone(),
                    us: clean_transcription(r.us.as_deref()),
                    uk: clean_transcription(r.uk.as_deref()),
                    curated_examples: clean_examples(r.examples),
                };
                (word.to_lowercase(), entry)
            })
            .collect();
        Ok(Self { entries })
    }

    /// Entry for a normalized (lowercase) word.
    pub fn get(&self, word: &str) -> Option<&PhoneticEntry> {
        self.entries.get(word)
    }

    /// Number of words.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Letter shards
// ─────────────────────────────────────────────────────────────────────────────

/// Dictionary record for one word in a shard.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShardRecord {
    /// Alternate transcription.
    pub phonetic: Option<String>,
    /// Example usages.
    pub examples: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawExample {
    Text(String),
    Tagged { text: String },
}

#[derive(Deserialize)]
struct RawShardRecord {
    #[serde(default)]
    phonetic: Option<String>,
    #[serde(default)]
    examples: Vec<RawExample>,
}

/// One letter's dictionary partition, with its raw bytes for verbatim serving.
#[derive(Debug)]
pub struct LetterShard {
    /// `a..=z`.
    pub letter: char,
    /// Bytes exactly as fetched.
    pub raw: Bytes,
    /// Validator over `raw`.
    pub fingerprint: String,
    entries: HashMap<String, ShardRecord>,
}

impl LetterShard {
    /// Parse the shard for `letter`.
    pub fn parse(letter: char, raw: Bytes) -> Result<Self, LoadError> {
        let records: HashMap<String, RawShardRecord> =
            serde_json::from_slice(&raw).map_err(|e| LoadError::Malformed {
                key: shard_key(letter),
                message: e.to_string(),
            })?;
        let entries = records
            .into_iter()
            .map(|(word, r)| {
                let examples = r
                    .examples
                    .into_iter()
                    .map(|e| match e {
                        RawExample::Text(text) | RawExample::Tagged { text } => text,
                    })
                    .collect();
                let record = ShardRecord {
                    phonetic: clean_transcription(r.phonetic.as_deref()),
                    examples: clean_examples(examples),
                };
                (word.to_lowercase(), record)
            })
            .collect();
        Ok(Self {
            letter,
            fingerprint: content_fingerprint(&raw),
            raw,
            entries,
        })
    }

    /// Record for a normalized word.
    pub fn get(&self, word: &str) -> Option<&ShardRecord> {
        self.entries.get(word)
    }

    /// Number of words.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the shard is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Dataset key of a letter shard.
pub fn shard_key(letter: char) -> String {
    format!("{letter}.json")
}

/// Trim, keep the first comma-separated alternative, drop empties.
pub fn clean_transcription(raw: Option<&str>) -> Option<String> {
    let first = raw?.split(',').next()?.trim();
    (!first.is_empty()).then(|| first.to_string())
}

fn clean_examples(examples: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(examples.len());
    for example in examples {
        let text = example.trim();
        if !text.is_empty() && !out.iter().any(|e| e == text) {
            out.push(text.to_string());
        }
    }
    out
}

// ─────────────────────────────────────────────────────────────────────────────
// Store
// ─────────────────────────────────────────────────────────────────────────────

/// Cached access to the hosted datasets.
///
/// Both datasets load through single-flight caches, so a burst of cold
/// requests triggers one fetch per key.
pub struct DatasetStore {
    source: Arc<dyn DatasetSource>,
    phonetic_key: String,
    tables: DatasetCache<Arc<PhoneticTable>>,
    shards: DatasetCache<Arc<LetterShard>>,
}

impl DatasetStore {
    /// Create a store reading from `source`.
    pub fn new(source: Arc<dyn DatasetSource>, phonetic_key: impl Into<String>, config: DatasetCacheConfig) -> Self {
        Self {
            source,
            phonetic_key: phonetic_key.into(),
            tables: DatasetCache::new("phonetic_table", config),
            shards: DatasetCache::new("letter_shard", config),
        }
    }

    /// The bulk phonetic table, loading it on a miss.
    pub async fn phonetic_table(&self) -> Result<Arc<PhoneticTable>, LoadError> {
        let source = Arc::clone(&self.source);
        let key = self.phonetic_key.clone();
        self.tables
            .get_or_load(&self.phonetic_key, move || async move {
                let bytes = source.fetch(&key).await?;
                let table = PhoneticTable::parse(&key, &bytes)?;
                tracing::info!(key = %key, entries = table.len(), "phonetic table loaded");
                Ok(Arc::new(table))
            })
            .await
    }

    /// Drop the cached table and load it again.
    pub async fn reload_phonetic_table(&self) -> Result<Arc<PhoneticTable>, LoadError> {
        let _ = self.tables.remove(&self.phonetic_key);
        self.phonetic_table().await
    }

    /// The shard for `letter`, loading it on a miss.
    pub async fn shard(&self, letter: char) -> Result<Arc<LetterShard>, LoadError> {
        let source = Arc::clone(&self.source);
        let key = shard_key(letter);
        self.shards
            .get_or_load(&key, move || async move {
                let bytes = source.fetch(&shard_key(letter)).await?;
                Ok(Arc::new(LetterShard::parse(letter, bytes)?))
            })
            .await
    }

    /// Counters for the table cache.
    pub fn table_stats(&self) -> DatasetCacheStats {
        self.tables.stats()
    }

    /// Counters for the shard cache.
    pub fn shard_stats(&self) -> DatasetCacheStats {
        self.shards.stats()
    }
}
