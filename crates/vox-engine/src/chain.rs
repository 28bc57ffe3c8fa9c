//! Ordered fallback over phonetic sources.
//!
//! Each [`PhoneticSource`] may contribute a transcription, examples, or both.
//! Sources run in order and a field, once filled, is never replaced by a later
//! source. The walk stops as soon as every field is filled.

use async_trait::async_trait;
use tracing::warn;
use vox_cache::LoadError;
use vox_core::Region;

/// What a source knows about a word.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PhoneticHit {
    /// Transcription, already trimmed to a single alternative.
    pub phonetic: Option<String>,
    /// Example sentences.
    pub examples: Vec<String>,
}

/// One link of the phonetic chain.
#[async_trait]
pub trait PhoneticSource: Send + Sync {
    /// Label for logs.
    fn name(&self) -> &'static str;

    /// Look up a normalized word for a region. `Ok(None)` means "not here".
    async fn lookup(&self, word: &str, region: Region) -> Result<Option<PhoneticHit>, LoadError>;
}

/// Merged chain result.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChainOutcome {
    /// Merged fields.
    pub hit: PhoneticHit,
    /// Whether any consulted source failed.
    pub degraded: bool,
}

/// Walk `sources` in order, filling each field from the first source that has it.
pub async fn resolve_chain(sources: &[Box<dyn PhoneticSource>], word: &str, region: Region) -> ChainOutcome {
    let mut outcome = ChainOutcome::default();

    for source in sources {
        match source.lookup(word, region).await {
            Ok(Some(hit)) => {
                if outcome.hit.phonetic.is_none() {
                    outcome.hit.phonetic = hit.phonetic;
                }
                if outcome.hit.examples.is_empty() {
                    outcome.hit.examples = hit.examples;
                }
            }
            Ok(None) => {}
            Err(e) => {
                warn!(source = source.name(), word, kind = e.error_kind(), error = %e, "phonetic source failed");
                outcome.degraded = true;
            }
        }
        if outcome.hit.phonetic.is_some() && !outcome.hit.examples.is_empty() {
            break;
        }
    }
    outcome
}

/// First present value, in order.
pub fn first_available<T>(candidates: impl IntoIterator<Item = Option<T>>) -> Option<T> {
    candidates.into_iter().flatten().next()
}
