//! Definition aggregation.
//!
//! One provider call per word, bounded by a timeout. The provider's senses are
//! reordered adjectives-first and walked once, collecting at most three
//! distinct definitions and, independently, three examples. Failures never
//! escape: they become a result whose only meaning is a diagnostic line.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, warn};
use vox_cache::{StoreStats, TtlStore};
use vox_core::{ExampleUsage, Service, UpstreamError};

use crate::datasets::clean_transcription;
use crate::upstream::{DefinitionProvider, DictionaryDefinition, DictionaryEntry};

/// Maximum meanings returned.
pub const MAX_MEANINGS: usize = 3;
/// Maximum examples returned.
pub const MAX_EXAMPLES: usize = 3;
/// Maximum synonyms and, separately, antonyms returned.
pub const MAX_RELATED: usize = 5;
/// Default provider timeout.
pub const DEFAULT_DEFINITION_TIMEOUT: Duration = Duration::from_millis(2_500);

/// Diagnostic used when the provider has nothing for the word.
pub const NO_DEFINITIONS: &str = "No definitions found for this word.";
/// Diagnostic used when the provider did not answer in time.
pub const DEFINITIONS_TIMED_OUT: &str = "Definition lookup timed out. Please try again later.";
/// Diagnostic used for any other provider failure.
pub const DEFINITIONS_UNAVAILABLE: &str = "Definitions are temporarily unavailable.";

/// Selected definition data for one word.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DefinitionResult {
    /// Provider transcription.
    pub phonetic: Option<String>,
    /// Up to three definitions, or a single diagnostic line.
    pub meanings: Vec<String>,
    /// Up to three examples.
    pub examples: Vec<ExampleUsage>,
    /// Distinct synonyms.
    pub synonyms: Vec<String>,
    /// Distinct antonyms.
    pub antonyms: Vec<String>,
}

impl DefinitionResult {
    /// Empty-but-valid result carrying one diagnostic meaning.
    pub fn diagnostic(message: &str) -> Self {
        Self {
            meanings: vec![message.to_string()],
            ..Self::default()
        }
    }
}

/// Calls a [`DefinitionProvider`] and selects a bounded, ranked subset.
pub struct DefinitionAggregator {
    provider: Arc<dyn DefinitionProvider>,
    timeout: Duration,
    cache: Mutex<TtlStore<DefinitionResult>>,
    ttl: Duration,
}

impl DefinitionAggregator {
    /// Aggregator with a provider timeout and a per-word result cache.
    pub fn new(provider: Arc<dyn DefinitionProvider>, timeout: Duration, max_entries: usize, ttl: Duration) -> Self {
        Self {
            provider,
            timeout,
            cache: Mutex::new(TtlStore::new(max_entries)),
            ttl,
        }
    }

    /// Definitions for a normalized word. Never fails.
    pub async fn fetch(&self, word: &str) -> DefinitionResult {
        let cached = self.cache.lock().get(word);
        metrics::counter!(
            "cache_requests_total",
            "cache" => "definition",
            "outcome" => if cached.is_some() { "hit" } else { "miss" }
        )
        .increment(1);
        if let Some(result) = cached {
            return result;
        }

        let lookup = tokio::time::timeout(self.timeout, self.provider.lookup(word)).await;
        let entries = match lookup {
            Ok(Ok(entries)) => entries,
            Ok(Err(e)) => return failure(word, &e),
            Err(_) => {
                return failure(
                    word,
                    &UpstreamError::Timeout {
                        service: Service::Dictionary,
                        after: self.timeout,
                    },
                );
            }
        };

        let result = select(&entries);
        if result.meanings.is_empty() {
            debug!(word, "no definitions");
            return DefinitionResult {
                phonetic: result.phonetic,
                ..DefinitionResult::diagnostic(NO_DEFINITIONS)
            };
        }
        self.cache.lock().set(word, result.clone(), self.ttl);
        result
    }

    /// Cache counters.
    pub fn stats(&self) -> StoreStats {
        self.cache.lock().stats()
    }
}

fn failure(word: &str, err: &UpstreamError) -> DefinitionResult {
    warn!(word, kind = err.error_kind(), error = %err, "definition lookup failed");
    let message = match err {
        UpstreamError::Timeout { .. } => DEFINITIONS_TIMED_OUT,
        _ => DEFINITIONS_UNAVAILABLE,
    };
    DefinitionResult::diagnostic(message)
}

struct Sense<'a> {
    part_of_speech: &'a str,
    definition: &'a DictionaryDefinition,
    group_synonyms: &'a [String],
    group_antonyms: &'a [String],
}

/// Adjectives first, then every other sense in provider order.
fn ordered_senses(entries: &[DictionaryEntry]) -> Vec<Sense<'_>> {
    let (adjectives, others): (Vec<Sense<'_>>, Vec<Sense<'_>>) = entries
        .iter()
        .flat_map(|entry| &entry.meanings)
        .flat_map(|meaning| {
            meaning.definitions.iter().map(move |definition| Sense {
                part_of_speech: &meaning.part_of_speech,
                definition,
                group_synonyms: &meaning.synonyms,
                group_antonyms: &meaning.antonyms,
            })
        })
        .partition(|sense| sense.part_of_speech.eq_ignore_ascii_case("adjective"));
    adjectives.into_iter().chain(others).collect()
}

fn push_distinct(into: &mut Vec<String>, items: impl IntoIterator<Item = impl AsRef<str>>, cap: usize) {
    for item in items {
        if into.len() >= cap {
            return;
        }
        let item = item.as_ref().trim();
        if !item.is_empty() && !into.iter().any(|existing| existing == item) {
            into.push(item.to_string());
        }
    }
}

/// Bounded, order-preserving, early-exiting selection over the payload.
fn select(entries: &[DictionaryEntry]) -> DefinitionResult {
    let mut result = DefinitionResult {
        phonetic: entries
            .iter()
            .find_map(DictionaryEntry::transcription)
            .and_then(|t| clean_transcription(Some(t))),
        ..DefinitionResult::default()
    };

    for sense in ordered_senses(entries) {
        push_distinct(&mut result.meanings, [&sense.definition.definition], MAX_MEANINGS);

        if result.examples.len() < MAX_EXAMPLES {
            if let Some(example) = sense.definition.example.as_deref().map(str::trim) {
                if !example.is_empty() && !result.examples.iter().any(|e| e.text == example) {
                    result.examples.push(ExampleUsage {
                        text: example.to_string(),
                        part_of_speech: Some(sense.part_of_speech.to_string()),
                    });
                }
            }
        }

        push_distinct(&mut result.synonyms, &sense.definition.synonyms, MAX_RELATED);
        push_distinct(&mut result.synonyms, sense.group_synonyms, MAX_RELATED);
        push_distinct(&mut result.antonyms, &sense.definition.antonyms, MAX_RELATED);
        push_distinct(&mut result.antonyms, sense.group_antonyms, MAX_RELATED);

        if result.meanings.len() >= MAX_MEANINGS && result.examples.len() >= MAX_EXAMPLES {
            break;
        }
    }
    result
}
