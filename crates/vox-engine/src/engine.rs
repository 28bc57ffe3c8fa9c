//! Wiring: settings + upstreams → shared engine services.

use std::sync::Arc;

use vox_cache::{DatasetCacheConfig, LoadError, ResponseCache};
use vox_core::VoiceTable;
use vox_settings::{UpstreamSettings, VoxSettings};

use crate::clients::{DictionaryApiClient, GoogleTtsClient, HttpDatasetSource};
use crate::datasets::{DatasetStore, PhoneticTable};
use crate::definitions::DefinitionAggregator;
use crate::errors::EngineError;
use crate::orchestrator::PronunciationService;
use crate::phonetic::PhoneticResolver;
use crate::synthesis::Synthesis;
use crate::upstream::{DatasetSource, DefinitionProvider, SpeechSynthesizer};

/// The three external collaborators.
#[derive(Clone)]
pub struct Upstreams {
    /// Hosted datasets.
    pub datasets: Arc<dyn DatasetSource>,
    /// Definition service.
    pub dictionary: Arc<dyn DefinitionProvider>,
    /// Text-to-speech service.
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
}

impl Upstreams {
    /// Production HTTP clients.
    pub fn http(settings: &UpstreamSettings) -> Result<Self, EngineError> {
        Ok(Self {
            datasets: Arc::new(HttpDatasetSource::new(settings)?),
            dictionary: Arc::new(DictionaryApiClient::new(settings)?),
            synthesizer: Arc::new(GoogleTtsClient::new(settings)?),
        })
    }
}

/// Process-wide services, built once at startup.
#[derive(Clone)]
pub struct Engine {
    /// Accent → voice table.
    pub voices: Arc<VoiceTable>,
    /// Cached datasets (bulk table, letter shards).
    pub datasets: Arc<DatasetStore>,
    /// Pronunciation assembly and response cache.
    pub pronunciations: Arc<PronunciationService>,
}

impl Engine {
    /// Build every cache and service from settings.
    pub fn new(settings: &VoxSettings, upstreams: Upstreams) -> Self {
        let cache = &settings.cache;
        let voices = Arc::new(settings.voice_table());

        let datasets = Arc::new(DatasetStore::new(
            upstreams.datasets,
            settings.upstream.phonetic_dataset_key.clone(),
            DatasetCacheConfig {
                ttl: cache.dataset_ttl(),
                max_entries: cache.dataset_max_entries,
                in_flight_timeout: cache.in_flight_timeout(),
            },
        ));
        let resolver = PhoneticResolver::with_datasets(
            &datasets,
            Arc::clone(&voices),
            cache.phonetic_max_entries,
            cache.phonetic_ttl(),
        );
        let definitions = DefinitionAggregator::new(
            upstreams.dictionary,
            settings.upstream.definition_timeout(),
            cache.definition_max_entries,
            cache.definition_ttl(),
        );
        let synthesis = Synthesis::new(upstreams.synthesizer, Arc::clone(&voices));
        let responses = ResponseCache::new(cache.response_max_entries, cache.response_ttl());

        Self {
            voices,
            datasets,
            pronunciations: Arc::new(PronunciationService::new(responses, resolver, definitions, synthesis)),
        }
    }

    /// Reload the bulk phonetic table and drop everything derived from the old one.
    ///
    /// On failure the derived caches are left alone.
    pub async fn reload_phonetics(&self) -> Result<Arc<PhoneticTable>, LoadError> {
        let table = self.datasets.reload_phonetic_table().await?;
        self.pronunciations.invalidate_phonetics();
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_upstreams_build_from_defaults() {
        assert!(Upstreams::http(&UpstreamSettings::default()).is_ok());
    }

    #[test]
    fn engine_builds_from_defaults() {
        let settings = VoxSettings::default();
        let engine = Engine::new(&settings, Upstreams::http(&settings.upstream).unwrap());
        assert_eq!(engine.voices.len(), 4);
        assert_eq!(engine.datasets.table_stats().size, 0);
    }
}
