//! # vox-engine
//!
//! The lookup-and-cache composition engine behind `POST /get-pronunciation`.
//!
//! - [`upstream`]: traits for the dataset host, definition service, and
//!   speech synthesizer, plus the dictionary payload types
//! - [`clients`]: reqwest implementations of those traits
//! - [`datasets`]: bulk phonetic table and letter shards behind single-flight caches
//! - [`chain`] / [`phonetic`]: ordered phonetic sources and the resolver
//! - [`definitions`]: bounded, adjective-first definition selection
//! - [`synthesis`]: voice selection and audio
//! - [`orchestrator`]: response cache, concurrent fan-out, merge
//! - [`engine`]: builds all of the above from settings

#![deny(unsafe_code)]

pub mod chain;
pub mod clients;
pub mod datasets;
pub mod definitions;
pub mod engine;
pub mod errors;
pub mod orchestrator;
pub mod phonetic;
pub mod synthesis;
pub mod upstream;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub use engine::{Engine, Upstreams};
pub use errors::EngineError;
pub use orchestrator::{CacheStatus, Pronunciation, PronunciationService};

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use vox_core::{PHONETIC_UNAVAILABLE, PronunciationRequest};
    use vox_settings::VoxSettings;

    use super::*;
    use crate::testutil::Fakes;

    fn engine(fakes: &Fakes) -> Engine {
        Engine::new(&VoxSettings::default(), fakes.upstreams())
    }

    fn request(engine: &Engine, word: &str, accent: &str) -> PronunciationRequest {
        PronunciationRequest::parse(Some(word), Some(accent), None, None, &engine.voices).unwrap()
    }

    #[tokio::test]
    async fn assembles_then_serves_from_cache() {
        let fakes = Fakes::sample();
        let engine = engine(&fakes);
        let req = request(&engine, "Echo", "en-GB");

        let first = engine.pronunciations.pronounce(&req, None).await.unwrap();
        assert_eq!(first.status, CacheStatus::Miss);
        let doc = &first.entry.value;
        assert_eq!(doc.word, "echo");
        assert_eq!(doc.phonetic, "ˈɛkəʊ");
        assert_eq!(doc.meanings, vec!["Repeating an earlier sound.", "A reflected sound."]);
        assert_eq!(doc.examples[0].text, "The echo faded.");
        assert_eq!(doc.examples[1].text, "We heard the echo of our shouts.");
        assert_eq!(doc.synonyms, vec!["reverberation"]);
        assert_eq!(doc.audio_metadata.voice_id, "en-GB-Neural2-B");

        let calls = fakes.total_calls();
        let second = engine.pronunciations.pronounce(&req, None).await.unwrap();
        assert_eq!(second.status, CacheStatus::Hit);
        assert_eq!(second.entry.value, first.entry.value);
        assert_eq!(second.entry.fingerprint, first.entry.fingerprint);
        assert_eq!(fakes.total_calls(), calls);
    }

    #[tokio::test]
    async fn matching_validator_is_not_modified() {
        let fakes = Fakes::sample();
        let engine = engine(&fakes);
        let req = request(&engine, "echo", "en-US");

        let first = engine.pronunciations.pronounce(&req, None).await.unwrap();
        let etag = first.entry.fingerprint.clone();
        let again = engine.pronunciations.pronounce(&req, Some(&etag)).await.unwrap();
        assert_eq!(again.status, CacheStatus::NotModified);
    }

    #[tokio::test]
    async fn degraded_upstreams_use_placeholders() {
        let fakes = Fakes::sample();
        fakes.datasets.set_down(true);
        fakes.dictionary.set_failing(true);
        let engine = engine(&fakes);

        let out = engine
            .pronunciations
            .pronounce(&request(&engine, "echo", "en-US"), None)
            .await
            .unwrap();
        assert_eq!(out.entry.value.phonetic, PHONETIC_UNAVAILABLE);
        assert_eq!(out.entry.value.meanings.len(), 1);
        assert!(out.entry.value.examples.is_empty());
    }

    #[tokio::test]
    async fn synthesis_failure_fails_request_and_caches_nothing() {
        let fakes = Fakes::sample();
        fakes.synthesizer.set_failing(true);
        let engine = engine(&fakes);
        let req = request(&engine, "echo", "en-US");

        let err = engine.pronunciations.pronounce(&req, None).await.unwrap_err();
        assert!(matches!(err, EngineError::Synthesis(_)));
        assert_eq!(engine.pronunciations.response_stats().size, 0);
    }

    #[tokio::test]
    async fn concurrent_cold_requests_fetch_table_once() {
        let fakes = Fakes::sample();
        fakes.datasets.set_delay(Duration::from_millis(30));
        let engine = engine(&fakes);

        let mut tasks = Vec::new();
        for accent in ["en-US", "en-GB", "en-AU", "en-IN"] {
            let engine = engine.clone();
            tasks.push(tokio::spawn(async move {
                let req = request(&engine, "color", accent);
                engine.pronunciations.pronounce(&req, None).await
            }));
        }
        for task in tasks {
            assert!(task.await.unwrap().is_ok());
        }
        assert_eq!(fakes.datasets.calls("phonetics.json"), 1);
        assert_eq!(fakes.datasets.calls("c.json"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn branches_run_concurrently() {
        let fakes = Fakes::sample();
        fakes.synthesizer.set_delay(Duration::from_millis(300));
        fakes.dictionary.set_delay(Duration::from_millis(200));
        fakes.datasets.set_delay(Duration::from_millis(100));
        let engine = engine(&fakes);

        let started = tokio::time::Instant::now();
        let out = engine
            .pronunciations
            .pronounce(&request(&engine, "echo", "en-US"), None)
            .await
            .unwrap();
        let elapsed = started.elapsed();

        assert_eq!(out.status, CacheStatus::Miss);
        // slowest branch is synthesis; run in sequence it would take 700ms
        assert!(elapsed >= Duration::from_millis(300), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(400), "{elapsed:?}");
    }

    #[tokio::test]
    async fn reload_replaces_resolved_phonetics() {
        let fakes = Fakes::sample();
        let engine = engine(&fakes);
        let req = request(&engine, "color", "en-US");

        let before = engine.pronunciations.pronounce(&req, None).await.unwrap();
        assert_eq!(before.entry.value.phonetic, "ˈkʌlər");

        fakes
            .datasets
            .put("phonetics.json", r#"{"color": {"US": "ˈkʌlɚ", "UK": "ˈkʌlə"}}"#);
        let table = engine.reload_phonetics().await.unwrap();
        assert_eq!(table.len(), 1);

        let after = engine.pronunciations.pronounce(&req, None).await.unwrap();
        assert_eq!(after.status, CacheStatus::Miss);
        assert_eq!(after.entry.value.phonetic, "ˈkʌlɚ");

        let other_speed = request_with_speed(&engine, "color", "en-US", "fast");
        let fast = engine.pronunciations.pronounce(&other_speed, None).await.unwrap();
        assert_eq!(fast.entry.value.phonetic, "ˈkʌlɚ");
    }

    #[tokio::test]
    async fn failed_reload_keeps_serving() {
        let fakes = Fakes::sample();
        let engine = engine(&fakes);
        let req = request(&engine, "color", "en-US");
        let _ = engine.pronunciations.pronounce(&req, None).await.unwrap();

        fakes.datasets.set_down(true);
        assert!(engine.reload_phonetics().await.is_err());
        let again = engine.pronunciations.pronounce(&req, None).await.unwrap();
        assert_eq!(again.status, CacheStatus::Hit);
    }

    fn request_with_speed(engine: &Engine, word: &str, accent: &str, speed: &str) -> PronunciationRequest {
        PronunciationRequest::parse(Some(word), Some(accent), None, Some(speed), &engine.voices).unwrap()
    }
}
