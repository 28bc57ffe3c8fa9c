//! Dataset cache with single-flight loading.
//!
//! [`DatasetCache::get_or_load`] guarantees at most one outstanding load per
//! key. The first caller for a missing key spawns the load on its own task and
//! publishes a shared handle; every later caller for the same key awaits that
//! handle. The spawned task stores a successful value *before* clearing the
//! in-flight marker, both under the in-flight lock, so no caller can observe
//! "no value and no load" while a result is being published.
//!
//! A load that outlives the safety window is abandoned: waiters receive
//! [`LoadError::Abandoned`] and the next access starts a fresh load.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, warn};
use vox_core::UpstreamError;

use crate::store::TtlStore;

/// Default expiry of a cached dataset.
pub const DEFAULT_DATASET_TTL: Duration = Duration::from_secs(24 * 60 * 60);
/// Default window after which a stuck load is abandoned.
pub const DEFAULT_IN_FLIGHT_TIMEOUT: Duration = Duration::from_secs(5 * 60);
/// Default number of datasets held.
pub const DEFAULT_MAX_DATASETS: usize = 32;

/// Failure of a dataset load, shared by every waiter of that load.
#[derive(Clone, Debug, Error)]
pub enum LoadError {
    /// The upstream fetch failed.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    /// The fetched bytes could not be decoded.
    #[error("dataset '{key}' is malformed: {message}")]
    Malformed {
        /// Dataset key.
        key: String,
        /// Decoder message.
        message: String,
    },
    /// The load exceeded the in-flight safety window.
    #[error("load of '{key}' abandoned after {after:?}")]
    Abandoned {
        /// Dataset key.
        key: String,
        /// Window that elapsed.
        after: Duration,
    },
    /// The loading task panicked or was cancelled.
    #[error("load of '{key}' aborted: {message}")]
    Aborted {
        /// Dataset key.
        key: String,
        /// Join error text.
        message: String,
    },
}

impl LoadError {
    /// Short label for logs and metrics.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::Upstream(e) => e.error_kind(),
            Self::Malformed { .. } => "malformed",
            Self::Abandoned { .. } => "abandoned",
            Self::Aborted { .. } => "aborted",
        }
    }
}

/// Sizing for a [`DatasetCache`].
#[derive(Clone, Copy, Debug)]
pub struct DatasetCacheConfig {
    /// Expiry of each stored dataset.
    pub ttl: Duration,
    /// Maximum datasets held.
    pub max_entries: usize,
    /// Safety window for a single load.
    pub in_flight_timeout: Duration,
}

impl Default for DatasetCacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_DATASET_TTL,
            max_entries: DEFAULT_MAX_DATASETS,
            in_flight_timeout: DEFAULT_IN_FLIGHT_TIMEOUT,
        }
    }
}

/// Snapshot of a [`DatasetCache`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DatasetCacheStats {
    /// Datasets currently held.
    pub size: usize,
    /// Lookups served from the store.
    pub hits: u64,
    /// Lookups that found nothing.
    pub misses: u64,
    /// Loads started.
    pub loads: u64,
    /// Loads currently outstanding.
    pub in_flight: usize,
}

type LoadResult<V> = Result<V, LoadError>;

struct Flight<V> {
    id: u64,
    handle: Shared<BoxFuture<'static, LoadResult<V>>>,
}

struct Inner<V> {
    name: &'static str,
    config: DatasetCacheConfig,
    store: Mutex<TtlStore<V>>,
    in_flight: Mutex<HashMap<String, Flight<V>>>,
    next_flight: AtomicU64,
    loads: AtomicU64,
}

impl<V> Inner<V> {
    fn clear_flight(&self, key: &str, id: u64) {
        let mut in_flight = self.in_flight.lock();
        if in_flight.get(key).is_some_and(|f| f.id == id) {
            drop(in_flight.remove(key));
        }
    }
}

/// Clears the in-flight marker even if the load task unwinds.
struct FlightGuard<V> {
    inner: Arc<Inner<V>>,
    key: String,
    id: u64,
}

impl<V> Drop for FlightGuard<V> {
    fn drop(&mut self) {
        self.inner.clear_flight(&self.key, self.id);
    }
}

/// Expiring, bounded, single-flight cache for shared datasets.
///
/// Cloning is cheap and clones share state.
pub struct DatasetCache<V> {
    inner: Arc<Inner<V>>,
}

impl<V> Clone for DatasetCache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> DatasetCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create a cache. `name` labels logs and metrics.
    pub fn new(name: &'static str, config: DatasetCacheConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                name,
                config,
                store: Mutex::new(TtlStore::new(config.max_entries)),
                in_flight: Mutex::new(HashMap::new()),
                next_flight: AtomicU64::new(0),
                loads: AtomicU64::new(0),
            }),
        }
    }

    /// Cache name.
    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    /// Get a live value.
    pub fn get(&self, key: &str) -> Option<V> {
        let value = self.inner.store.lock().get(key);
        let outcome = if value.is_some() { "hit" } else { "miss" };
        metrics::counter!("cache_requests_total", "cache" => self.inner.name, "outcome" => outcome)
            .increment(1);
        value
    }

    /// Store a value with the configured TTL.
    pub fn set(&self, key: &str, value: V) {
        self.set_with_ttl(key, value, self.inner.config.ttl);
    }

    /// Store a value with an explicit TTL.
    pub fn set_with_ttl(&self, key: &str, value: V, ttl: Duration) {
        self.inner.store.lock().set(key, value, ttl);
    }

    /// Drop a stored value. An outstanding load for `key` is unaffected.
    pub fn remove(&self, key: &str) -> bool {
        self.inner.store.lock().remove(key)
    }

    /// Drop every stored value and reset counters.
    pub fn clear(&self) {
        self.inner.store.lock().clear();
    }

    /// Size and counters.
    pub fn stats(&self) -> DatasetCacheStats {
        let store = self.inner.store.lock().stats();
        DatasetCacheStats {
            size: store.size,
            hits: store.hits,
            misses: store.misses,
            loads: self.inner.loads.load(Ordering::Relaxed),
            in_flight: self.inner.in_flight.lock().len(),
        }
    }

    /// Whether a load for `key` is outstanding.
    pub fn is_loading(&self, key: &str) -> bool {
        self.inner.in_flight.lock().contains_key(key)
    }

    /// Return the cached value, or join/start the single load for `key`.
    ///
    /// `loader` is invoked only by the caller that starts the load. Failures
    /// are returned to every waiter and nothing is cached.
    pub async fn get_or_load<F, Fut>(&self, key: &str, loader: F) -> LoadResult<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = LoadResult<V>> + Send + 'static,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }

        let handle = {
            let mut in_flight = self.inner.in_flight.lock();

            // a load may have published between the miss above and this lock
            if let Some(value) = self.inner.store.lock().peek(key) {
                return Ok(value);
            }

            if let Some(flight) = in_flight.get(key) {
                debug!(cache = self.inner.name, key, "joining in-flight load");
                flight.handle.clone()
            } else {
                let id = self.inner.next_flight.fetch_add(1, Ordering::Relaxed);
                let _ = self.inner.loads.fetch_add(1, Ordering::Relaxed);
                debug!(cache = self.inner.name, key, "starting load");

                let task = tokio::spawn(run_load(Arc::clone(&self.inner), key.to_string(), id, loader()));
                let owned_key = key.to_string();
                let handle = async move {
                    match task.await {
                        Ok(result) => result,
                        Err(e) => Err(LoadError::Aborted {
                            key: owned_key,
                            message: e.to_string(),
                        }),
                    }
                }
                .boxed()
                .shared();

                drop(in_flight.insert(
                    key.to_string(),
                    Flight {
                        id,
                        handle: handle.clone(),
                    },
                ));
                handle
            }
        };

        handle.await
    }
}

async fn run_load<V, Fut>(inner: Arc<Inner<V>>, key: String, id: u64, load: Fut) -> LoadResult<V>
where
    V: Clone + Send + Sync + 'static,
    Fut: Future<Output = LoadResult<V>> + Send + 'static,
{
    let _guard = FlightGuard {
        inner: Arc::clone(&inner),
        key: key.clone(),
        id,
    };
    let window = inner.config.in_flight_timeout;
    let started = tokio::time::Instant::now();

    let result = match tokio::time::timeout(window, load).await {
        Ok(result) => result,
        Err(_) => Err(LoadError::Abandoned {
            key: key.clone(),
            after: window,
        }),
    };

    {
        let mut in_flight = inner.in_flight.lock();
        if let Ok(value) = &result {
            inner.store.lock().set(key.as_str(), value.clone(), inner.config.ttl);
        }
        if in_flight.get(&key).is_some_and(|f| f.id == id) {
            drop(in_flight.remove(&key));
        }
    }

    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    match &result {
        Ok(_) => debug!(cache = inner.name, key = %key, elapsed_ms, "load complete"),
        Err(e) => warn!(
            cache = inner.name,
            key = %key,
            elapsed_ms,
            kind = e.error_kind(),
            error = %e,
            "load failed"
        ),
    }
    result
}
