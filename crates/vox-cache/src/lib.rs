//! # vox-cache
//!
//! Caching primitives shared by the vox engine and server:
//!
//! - [`TtlStore`]: bounded map with per-entry expiry, evicting expired
//!   entries first and then the least-recently-set one
//! - [`DatasetCache`]: expiring dataset store with single-flight loading
//! - [`ResponseCache`]: finished responses with validators and
//!   `If-None-Match` evaluation
//! - [`fingerprint`](fingerprint::fingerprint) helpers producing quoted
//!   entity tags

#![deny(unsafe_code)]

pub mod dataset;
pub mod fingerprint;
pub mod response;
pub mod store;

pub use dataset::{DatasetCache, DatasetCacheConfig, DatasetCacheStats, LoadError};
pub use fingerprint::{content_fingerprint, fingerprint, validator_matches};
pub use response::{CacheEntry, Lookup, ResponseCache};
pub use store::{MAX_TTL, StoreStats, TtlStore};
