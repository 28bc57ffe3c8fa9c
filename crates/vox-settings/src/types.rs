//! Settings types.
//!
//! Every struct is `#[serde(default)]` so a settings file only needs the keys
//! it overrides. Durations are stored as integers with a unit suffix in the
//! field name and exposed as [`Duration`] through accessor methods.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use vox_core::{VoiceProfile, VoiceTable};

use crate::errors::{Result, SettingsError};

/// Root settings object.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VoxSettings {
    /// HTTP listener.
    pub server: ServerSettings,
    /// External service endpoints and timeouts.
    pub upstream: UpstreamSettings,
    /// Cache bounds and expiry windows.
    pub cache: CacheSettings,
    /// Accent → voice mapping. Replaces the compiled table entirely when set.
    pub voices: Vec<VoiceProfile>,
    /// Log output.
    pub logging: LoggingSettings,
}

impl Default for VoxSettings {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            upstream: UpstreamSettings::default(),
            cache: CacheSettings::default(),
            voices: VoiceTable::default_profiles(),
            logging: LoggingSettings::default(),
        }
    }
}

impl VoxSettings {
    /// Build the process-wide voice table.
    pub fn voice_table(&self) -> VoiceTable {
        VoiceTable::from_profiles(self.voices.iter().cloned())
    }

    /// Reject settings the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.voices.is_empty() {
            return Err(SettingsError::InvalidValue(
                "voices must contain at least one accent".into(),
            ));
        }
        if let Some(p) = self
            .voices
            .iter()
            .find(|p| p.accent.trim().is_empty() || p.male_voice.is_empty() || p.female_voice.is_empty())
        {
            return Err(SettingsError::InvalidValue(format!(
                "voice profile for '{}' is incomplete",
                p.accent
            )));
        }
        let caps = [
            ("cache.datasetMaxEntries", self.cache.dataset_max_entries),
            ("cache.phoneticMaxEntries", self.cache.phonetic_max_entries),
            ("cache.definitionMaxEntries", self.cache.definition_max_entries),
            ("cache.responseMaxEntries", self.cache.response_max_entries),
        ];
        if let Some((name, _)) = caps.iter().find(|(_, cap)| *cap == 0) {
            return Err(SettingsError::InvalidValue(format!("{name} must be at least 1")));
        }
        let windows = [
            ("cache.datasetTtlSecs", self.cache.dataset_ttl_secs),
            ("cache.inFlightTimeoutSecs", self.cache.in_flight_timeout_secs),
            ("cache.phoneticTtlSecs", self.cache.phonetic_ttl_secs),
            ("cache.definitionTtlSecs", self.cache.definition_ttl_secs),
            ("cache.responseTtlSecs", self.cache.response_ttl_secs),
        ];
        if let Some((name, _)) = windows.iter().find(|(_, secs)| !(1..=MAX_CACHE_WINDOW_SECS).contains(secs)) {
            return Err(SettingsError::InvalidValue(format!(
                "{name} must be between 1 and {MAX_CACHE_WINDOW_SECS}"
            )));
        }
        Ok(())
    }
}

/// HTTP listener settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// Bind port (`0` picks a free port).
    pub port: u16,
    /// Largest accepted request body in bytes.
    pub max_body_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            max_body_bytes: 16 * 1024,
        }
    }
}

/// External service settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpstreamSettings {
    /// Base URL of the hosted datasets; keys are appended as path segments.
    pub dataset_base_url: String,
    /// Key of the bulk phonetic table.
    pub phonetic_dataset_key: String,
    /// Base URL of the definition API; the word is appended as a path segment.
    pub dictionary_base_url: String,
    /// Base URL of the text-to-speech API.
    pub tts_base_url: String,
    /// API key for the text-to-speech API.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tts_api_key: Option<String>,
    /// Dataset fetch timeout in milliseconds.
    pub dataset_timeout_ms: u64,
    /// Definition lookup timeout in milliseconds.
    pub definition_timeout_ms: u64,
    /// Synthesis timeout in milliseconds.
    pub synthesis_timeout_ms: u64,
    /// Redirects followed by the definition client.
    pub max_redirects: usize,
    /// `User-Agent` sent upstream.
    pub user_agent: String,
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            dataset_base_url: "http://127.0.0.1:8787/data".to_string(),
            phonetic_dataset_key: "phonetics.json".to_string(),
            dictionary_base_url: "https://api.dictionaryapi.dev/api/v2/entries/en".to_string(),
            tts_base_url: "https://texttospeech.googleapis.com".to_string(),
            tts_api_key: None,
            dataset_timeout_ms: 10_000,
            definition_timeout_ms: 2_500,
            synthesis_timeout_ms: 10_000,
            max_redirects: 3,
            user_agent: concat!("vox/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl UpstreamSettings {
    /// Dataset fetch timeout.
    pub fn dataset_timeout(&self) -> Duration {
        Duration::from_millis(self.dataset_timeout_ms)
    }

    /// Definition lookup timeout.
    pub fn definition_timeout(&self) -> Duration {
        Duration::from_millis(self.definition_timeout_ms)
    }

    /// Synthesis timeout.
    pub fn synthesis_timeout(&self) -> Duration {
        Duration::from_millis(self.synthesis_timeout_ms)
    }
}

/// Upper bound for every cache expiry window (one year).
pub const MAX_CACHE_WINDOW_SECS: u64 = 365 * 24 * 60 * 60;

/// Cache expiry windows and bounds.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CacheSettings {
    /// Expiry of the bulk table and letter shards, in seconds.
    pub dataset_ttl_secs: u64,
    /// Maximum datasets held (bulk table + shards).
    pub dataset_max_entries: usize,
    /// Safety window after which a stuck dataset load is abandoned, in seconds.
    pub in_flight_timeout_secs: u64,
    /// Expiry of resolved phonetics per word+accent, in seconds.
    pub phonetic_ttl_secs: u64,
    /// Maximum resolved phonetics held.
    pub phonetic_max_entries: usize,
    /// Expiry of definition lookups per word, in seconds.
    pub definition_ttl_secs: u64,
    /// Maximum definition lookups held.
    pub definition_max_entries: usize,
    /// Expiry of assembled responses, in seconds.
    pub response_ttl_secs: u64,
    /// Maximum assembled responses held.
    pub response_max_entries: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            dataset_ttl_secs: 24 * 60 * 60,
            dataset_max_entries: 32,
            in_flight_timeout_secs: 5 * 60,
            phonetic_ttl_secs: 7 * 24 * 60 * 60,
            phonetic_max_entries: 10_000,
            definition_ttl_secs: 24 * 60 * 60,
            definition_max_entries: 5_000,
            response_ttl_secs: 24 * 60 * 60,
            response_max_entries: 1_000,
        }
    }
}

impl CacheSettings {
    /// Dataset expiry.
    pub fn dataset_ttl(&self) -> Duration {
        Duration::from_secs(self.dataset_ttl_secs)
    }

    /// In-flight safety window.
    pub fn in_flight_timeout(&self) -> Duration {
        Duration::from_secs(self.in_flight_timeout_secs)
    }

    /// Resolved phonetic expiry.
    pub fn phonetic_ttl(&self) -> Duration {
        Duration::from_secs(self.phonetic_ttl_secs)
    }

    /// Definition expiry.
    pub fn definition_ttl(&self) -> Duration {
        Duration::from_secs(self.definition_ttl_secs)
    }

    /// Response expiry.
    pub fn response_ttl(&self) -> Duration {
        Duration::from_secs(self.response_ttl_secs)
    }
}

/// Log output settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default filter when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON lines instead of compact text.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}
