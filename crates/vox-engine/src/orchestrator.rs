//! Request orchestration.
//!
//! Response cache first. On a miss, synthesis, phonetic resolution and the
//! definition lookup run concurrently; the merge below does not depend on
//! which branch finishes first. Only synthesis can fail the request.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};
use vox_cache::{CacheEntry, Lookup, ResponseCache, fingerprint};
use vox_core::{ExampleUsage, PHONETIC_UNAVAILABLE, PronunciationRequest, ResponseDocument};

use crate::chain::{PhoneticHit, first_available};
use crate::definitions::{DefinitionAggregator, DefinitionResult, MAX_EXAMPLES};
use crate::errors::EngineError;
use crate::phonetic::PhoneticResolver;
use crate::synthesis::{Synthesis, SynthesizedAudio};

/// How a request was served.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheStatus {
    /// Client validator matched a cached entry; no body needed.
    NotModified,
    /// Served from the response cache.
    Hit,
    /// Assembled from upstreams.
    Miss,
}

impl CacheStatus {
    /// `X-Cache` header value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotModified | Self::Hit => "HIT",
            Self::Miss => "MISS",
        }
    }
}

/// A served pronunciation.
#[derive(Clone, Debug)]
pub struct Pronunciation {
    /// The cached (or freshly stored) document with its validator.
    pub entry: Arc<CacheEntry<ResponseDocument>>,
    /// How it was obtained.
    pub status: CacheStatus,
}

/// Assembles, caches, and conditionally serves pronunciation documents.
pub struct PronunciationService {
    responses: ResponseCache<ResponseDocument>,
    resolver: PhoneticResolver,
    definitions: DefinitionAggregator,
    synthesis: Synthesis,
}

impl PronunciationService {
    /// Wire the collaborators together.
    pub fn new(
        responses: ResponseCache<ResponseDocument>,
        resolver: PhoneticResolver,
        definitions: DefinitionAggregator,
        synthesis: Synthesis,
    ) -> Self {
        Self {
            responses,
            resolver,
            definitions,
            synthesis,
        }
    }

    /// Serve `request`, honoring the client's `If-None-Match`.
    ///
    /// A miss is always assembled and returned in full, even if the client
    /// sent a validator that would match the new document.
    pub async fn pronounce(
        &self,
        request: &PronunciationRequest,
        if_none_match: Option<&str>,
    ) -> Result<Pronunciation, EngineError> {
        let key = request.cache_key();
        match self.responses.lookup(&key, if_none_match) {
            Lookup::NotModified(entry) => {
                debug!(%key, "validator matched");
                return Ok(Pronunciation {
                    entry,
                    status: CacheStatus::NotModified,
                });
            }
            Lookup::Hit(entry) => {
                debug!(%key, "response cache hit");
                return Ok(Pronunciation {
                    entry,
                    status: CacheStatus::Hit,
                });
            }
            Lookup::Miss => {}
        }

        let started = tokio::time::Instant::now();
        let (audio, phonetic, definitions) = tokio::join!(
            self.synthesis.synthesize(request),
            self.resolver.resolve(&request.word, &request.accent),
            self.definitions.fetch(&request.word),
        );
        let document = assemble(request, audio?, phonetic, definitions);

        let etag = fingerprint(&[
            request.word.as_str(),
            request.accent.as_str(),
            request.gender.as_str(),
            request.speed.as_str(),
        ]);
        let entry = self.responses.insert(&key, document, etag);
        info!(
            word = %request.word,
            accent = %request.accent,
            elapsed_ms = elapsed_ms(started.elapsed()),
            "pronunciation assembled"
        );
        Ok(Pronunciation {
            entry,
            status: CacheStatus::Miss,
        })
    }

    /// Drop resolved phonetics and every finished response built from them.
    pub fn invalidate_phonetics(&self) {
        self.resolver.clear();
        self.responses.clear();
        info!("phonetic and response caches cleared");
    }

    /// Response cache counters.
    pub fn response_stats(&self) -> vox_cache::StoreStats {
        self.responses.stats()
    }
}

/// Merge branch results by precedence.
fn assemble(
    request: &PronunciationRequest,
    audio: SynthesizedAudio,
    phonetic: PhoneticHit,
    definitions: DefinitionResult,
) -> ResponseDocument {
    let transcription = first_available([phonetic.phonetic, definitions.phonetic])
        .unwrap_or_else(|| PHONETIC_UNAVAILABLE.to_string());

    let mut examples: Vec<ExampleUsage> = Vec::with_capacity(MAX_EXAMPLES);
    let candidates = phonetic
        .examples
        .into_iter()
        .map(ExampleUsage::plain)
        .chain(definitions.examples);
    for candidate in candidates {
        if examples.len() >= MAX_EXAMPLES {
            break;
        }
        if !examples.iter().any(|e| e.text == candidate.text) {
            examples.push(candidate);
        }
    }

    ResponseDocument {
        word: request.word.clone(),
        audio_content: audio.audio,
        phonetic: transcription,
        meanings: definitions.meanings,
        examples,
        synonyms: definitions.synonyms,
        antonyms: definitions.antonyms,
        audio_metadata: audio.metadata,
    }
}

fn elapsed_ms(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
