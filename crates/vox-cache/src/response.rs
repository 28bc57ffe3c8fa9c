//! Finished-response cache with conditional retrieval.
//!
//! Entries are keyed by the full request identity and carry the validator
//! handed to clients. A lookup with a matching `If-None-Match` reports
//! [`Lookup::NotModified`] so the caller can answer without a body.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::fingerprint::validator_matches;
use crate::store::{StoreStats, TtlStore};

/// A stored value with its validator and write time.
#[derive(Debug)]
pub struct CacheEntry<T> {
    /// Cached value, never mutated after creation.
    pub value: T,
    /// Quoted entity tag.
    pub fingerprint: String,
    /// When the entry was written.
    pub stored_at: DateTime<Utc>,
}

/// Result of [`ResponseCache::lookup`].
#[derive(Debug)]
pub enum Lookup<T> {
    /// Stored and the client's validator matches.
    NotModified(Arc<CacheEntry<T>>),
    /// Stored; the client has no matching validator.
    Hit(Arc<CacheEntry<T>>),
    /// Nothing stored (or expired).
    Miss,
}

/// Bounded, expiring cache of finished responses.
pub struct ResponseCache<T> {
    store: Mutex<TtlStore<Arc<CacheEntry<T>>>>,
    ttl: Duration,
}

impl<T> ResponseCache<T> {
    /// Create a cache holding at most `max_entries`, each living `ttl`.
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            store: Mutex::new(TtlStore::new(max_entries)),
            ttl,
        }
    }

    /// Look up `key`, evaluating `if_none_match` against a stored entry.
    pub fn lookup(&self, key: &str, if_none_match: Option<&str>) -> Lookup<T> {
        let entry = self.store.lock().get(key);
        let outcome = match &entry {
            Some(_) => "hit",
            None => "miss",
        };
        metrics::counter!("cache_requests_total", "cache" => "response", "outcome" => outcome)
            .increment(1);

        match entry {
            Some(entry) if if_none_match.is_some_and(|v| validator_matches(v, &entry.fingerprint)) => {
                Lookup::NotModified(entry)
            }
            Some(entry) => Lookup::Hit(entry),
            None => Lookup::Miss,
        }
    }

    /// Store `value` under `key`, replacing any previous entry.
    pub fn insert(&self, key: &str, value: T, fingerprint: String) -> Arc<CacheEntry<T>> {
        let entry = Arc::new(CacheEntry {
            value,
            fingerprint,
            stored_at: Utc::now(),
        });
        self.store.lock().set(key, Arc::clone(&entry), self.ttl);
        entry
    }

    /// Drop `key`.
    pub fn remove(&self, key: &str) -> bool {
        self.store.lock().remove(key)
    }

    /// Drop everything.
    pub fn clear(&self) {
        self.store.lock().clear();
    }

    /// Size and counters.
    pub fn stats(&self) -> StoreStats {
        self.store.lock().stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::fingerprint;

    fn cache() -> ResponseCache<String> {
        ResponseCache::new(8, Duration::from_secs(60))
    }

    #[test]
    fn miss_then_hit() {
        let cache = cache();
        assert!(matches!(cache.lookup("echo|en-US|male|normal", None), Lookup::Miss));

        let etag = fingerprint(&["echo", "en-US", "male", "normal"]);
        let stored = cache.insert("echo|en-US|male|normal", "doc".into(), etag.clone());
        assert_eq!(stored.fingerprint, etag);

        match cache.lookup("echo|en-US|male|normal", None) {
            Lookup::Hit(entry) => {
                assert_eq!(entry.value, "doc");
                assert_eq!(entry.stored_at, stored.stored_at);
            }
            other => panic!("expected hit, got {other:?}"),
        }
    }

    #[test]
    fn matching_validator_is_not_modified() {
        let cache = cache();
        let _ = cache.insert("k", "doc".into(), "\"v1\"".into());

        assert!(matches!(cache.lookup("k", Some("\"v1\"")), Lookup::NotModified(_)));
        assert!(matches!(cache.lookup("k", Some("W/\"v1\"")), Lookup::NotModified(_)));
        assert!(matches!(cache.lookup("k", Some("\"v0\"")), Lookup::Hit(_)));
    }

    #[test]
    fn validator_without_entry_is_miss() {
        let cache = cache();
        assert!(matches!(cache.lookup("k", Some("*")), Lookup::Miss));
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire() {
        let cache = cache();
        let _ = cache.insert("k", "doc".into(), "\"v1\"".into());
        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(matches!(cache.lookup("k", None), Lookup::Miss));
    }

    #[test]
    fn bounded() {
        let cache: ResponseCache<u32> = ResponseCache::new(2, Duration::from_secs(60));
        let _ = cache.insert("a", 1, "\"a\"".into());
        let _ = cache.insert("b", 2, "\"b\"".into());
        let _ = cache.insert("c", 3, "\"c\"".into());
        assert!(matches!(cache.lookup("a", None), Lookup::Miss));
        assert_eq!(cache.stats().size, 2);
    }
}
