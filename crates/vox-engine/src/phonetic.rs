//! Phonetic resolution over the hosted datasets.
//!
//! Source order: bulk phonetic table, then the word's letter shard. Results
//! (including "nothing found") are cached per word and accent, unless a
//! source failed while producing them.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;
use vox_cache::{LoadError, StoreStats, TtlStore};
use vox_core::request::shard_letter;
use vox_core::{Accent, Region, VoiceTable};

use crate::chain::{PhoneticHit, PhoneticSource, resolve_chain};
use crate::datasets::DatasetStore;

// ─────────────────────────────────────────────────────────────────────────────
// Sources
// ─────────────────────────────────────────────────────────────────────────────

/// Regional form and curated examples from the bulk table.
pub struct BulkTableSource {
    datasets: Arc<DatasetStore>,
}

impl BulkTableSource {
    /// Source reading the bulk table from `datasets`.
    pub fn new(datasets: Arc<DatasetStore>) -> Self {
        Self { datasets }
    }
}

#[async_trait]
impl PhoneticSource for BulkTableSource {
    fn name(&self) -> &'static str {
        "phonetic_table"
    }

    async fn lookup(&self, word: &str, region: Region) -> Result<Option<PhoneticHit>, LoadError> {
        let table = self.datasets.phonetic_table().await?;
        Ok(table.get(word).map(|entry| PhoneticHit {
            phonetic: entry.form_for(region).map(String::from),
            examples: entry.curated_examples.clone(),
        }))
    }
}

/// Alternate transcription and examples from the word's letter shard.
pub struct LetterShardSource {
    datasets: Arc<DatasetStore>,
}

impl LetterShardSource {
    /// Source reading shards from `datasets`.
    pub fn new(datasets: Arc<DatasetStore>) -> Self {
        Self { datasets }
    }
}

#[async_trait]
impl PhoneticSource for LetterShardSource {
    fn name(&self) -> &'static str {
        "letter_shard"
    }

    async fn lookup(&self, word: &str, _region: Region) -> Result<Option<PhoneticHit>, LoadError> {
        let Some(letter) = shard_letter(word) else {
            return Ok(None);
        };
        let shard = self.datasets.shard(letter).await?;
        Ok(shard.get(word).map(|record| PhoneticHit {
            phonetic: record.phonetic.clone(),
            examples: record.examples.clone(),
        }))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Resolver
// ─────────────────────────────────────────────────────────────────────────────

/// Default expiry of resolved phonetics.
pub const DEFAULT_PHONETIC_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Resolves transcriptions and curated examples through an ordered source chain.
pub struct PhoneticResolver {
    sources: Vec<Box<dyn PhoneticSource>>,
    voices: Arc<VoiceTable>,
    cache: Mutex<TtlStore<PhoneticHit>>,
    ttl: Duration,
}

impl PhoneticResolver {
    /// Resolver over an explicit source chain.
    pub fn new(sources: Vec<Box<dyn PhoneticSource>>, voices: Arc<VoiceTable>, max_entries: usize, ttl: Duration) -> Self {
        Self {
            sources,
            voices,
            cache: Mutex::new(TtlStore::new(max_entries)),
            ttl,
        }
    }

    /// Standard chain: bulk table, then letter shard.
    pub fn with_datasets(datasets: &Arc<DatasetStore>, voices: Arc<VoiceTable>, max_entries: usize, ttl: Duration) -> Self {
        let sources: Vec<Box<dyn PhoneticSource>> = vec![
            Box::new(BulkTableSource::new(Arc::clone(datasets))),
            Box::new(LetterShardSource::new(Arc::clone(datasets))),
        ];
        Self::new(sources, voices, max_entries, ttl)
    }

    /// Transcription and examples for a normalized word.
    pub async fn resolve(&self, word: &str, accent: &Accent) -> PhoneticHit {
        let key = format!("{word}|{accent}");
        let cached = self.cache.lock().get(&key);
        metrics::counter!(
            "cache_requests_total",
            "cache" => "phonetic",
            "outcome" => if cached.is_some() { "hit" } else { "miss" }
        )
        .increment(1);
        if let Some(hit) = cached {
            return hit;
        }

        let region = self.voices.region_for(accent);
        let outcome = resolve_chain(&self.sources, word, region).await;
        if outcome.degraded {
            debug!(word, %accent, "phonetic result not cached, a source failed");
        } else {
            self.cache.lock().set(key, outcome.hit.clone(), self.ttl);
        }
        outcome.hit
    }

    /// Forget every resolved result. Used after the bulk table is reloaded.
    pub fn clear(&self) {
        self.cache.lock().clear();
    }

    /// Cache counters.
    pub fn stats(&self) -> StoreStats {
        self.cache.lock().stats()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use bytes::Bytes;
    use vox_cache::DatasetCacheConfig;
    use vox_core::{Service, UpstreamError};

    use super::*;
    use crate::upstream::DatasetSource;

    const TABLE: &str = r#"{
        "color": {"US": "ˈkʌlər", "UK": "ˈkʌlə", "examples": ["Pick a color."]},
        "route": {"US": "raʊt, ruːt"},
        "cat": {"US": "kæt"}
    }"#;

    const SHARD_C: &str = r#"{
        "cat": {"phonetic": "/kat/", "examples": ["The cat sat."]},
        "cloud": {"phonetic": "/klaʊd/"}
    }"#;

    struct Datasets {
        calls: AtomicUsize,
        shards_down: AtomicBool,
    }

    #[async_trait]
    impl DatasetSource for Datasets {
        async fn fetch(&self, key: &str) -> Result<Bytes, UpstreamError> {
            let _ = self.calls.fetch_add(1, Ordering::SeqCst);
            match key {
                "phonetics.json" => Ok(Bytes::from_static(TABLE.as_bytes())),
                _ if self.shards_down.load(Ordering::SeqCst) => Err(UpstreamError::Network {
                    service: Service::Dataset,
                    message: "down".into(),
                }),
                "c.json" => Ok(Bytes::from_static(SHARD_C.as_bytes())),
                _ => Ok(Bytes::from_static(b"{}")),
            }
        }
    }

    fn resolver() -> (PhoneticResolver, Arc<Datasets>) {
        let source = Arc::new(Datasets {
            calls: AtomicUsize::new(0),
            shards_down: AtomicBool::new(false),
        });
        let datasets = Arc::new(DatasetStore::new(
            Arc::clone(&source) as Arc<dyn DatasetSource>,
            "phonetics.json",
            DatasetCacheConfig::default(),
        ));
        let voices = Arc::new(VoiceTable::default());
        (
            PhoneticResolver::with_datasets(&datasets, voices, 100, DEFAULT_PHONETIC_TTL),
            source,
        )
    }

    fn accent(tag: &str) -> Accent {
        VoiceTable::default().resolve_accent(tag).unwrap()
    }

    #[tokio::test]
    async fn region_selects_form() {
        let (resolver, _) = resolver();
        let us = resolver.resolve("color", &accent("en-US")).await;
        let uk = resolver.resolve("color", &accent("en-GB")).await;
        assert_eq!(us.phonetic.as_deref(), Some("ˈkʌlər"));
        assert_eq!(uk.phonetic.as_deref(), Some("ˈkʌlə"));
        assert_eq!(us.examples, vec!["Pick a color."]);
    }

    #[tokio::test]
    async fn uk_falls_back_to_us_and_first_alternative() {
        let (resolver, _) = resolver();
        let hit = resolver.resolve("route", &accent("en-IN")).await;
        assert_eq!(hit.phonetic.as_deref(), Some("raʊt"));
    }

    #[tokio::test]
    async fn table_phonetic_kept_shard_supplies_examples() {
        let (resolver, _) = resolver();
        let hit = resolver.resolve("cat", &accent("en-US")).await;
        assert_eq!(hit.phonetic.as_deref(), Some("kæt"));
        assert_eq!(hit.examples, vec!["The cat sat."]);
    }

    #[tokio::test]
    async fn shard_only_word() {
        let (resolver, _) = resolver();
        let hit = resolver.resolve("cloud", &accent("en-AU")).await;
        assert_eq!(hit.phonetic.as_deref(), Some("/klaʊd/"));
        assert!(hit.examples.is_empty());
    }

    #[tokio::test]
    async fn non_letter_word_skips_shards() {
        let (resolver, source) = resolver();
        let hit = resolver.resolve("42nd", &accent("en-US")).await;
        assert_eq!(hit, PhoneticHit::default());
        // only the bulk table was fetched
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn results_cached_including_not_found() {
        let (resolver, source) = resolver();
        let _ = resolver.resolve("zebra", &accent("en-US")).await;
        let _ = resolver.resolve("zebra", &accent("en-US")).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(resolver.stats().hits, 1);
    }

    #[tokio::test]
    async fn degraded_results_not_cached() {
        let (resolver, source) = resolver();
        source.shards_down.store(true, Ordering::SeqCst);
        let first = resolver.resolve("cloud", &accent("en-US")).await;
        assert_eq!(first.phonetic, None);

        source.shards_down.store(false, Ordering::SeqCst);
        let second = resolver.resolve("cloud", &accent("en-US")).await;
        assert_eq!(second.phonetic.as_deref(), Some("/klaʊd/"));
    }

    #[tokio::test]
    async fn clear_forces_fresh_resolution() {
        let (resolver, _) = resolver();
        let _ = resolver.resolve("color", &accent("en-US")).await;
        assert_eq!(resolver.stats().size, 1);

        resolver.clear();
        assert_eq!(resolver.stats().size, 0);
        let _ = resolver.resolve("color", &accent("en-US")).await;
        assert_eq!(resolver.stats().hits, 0);
        assert_eq!(resolver.stats().misses, 1);
    }
}
