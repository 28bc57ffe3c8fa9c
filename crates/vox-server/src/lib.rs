//! # vox-server
//!
//! Axum HTTP surface for the pronunciation service.
//!
//! - `POST /get-pronunciation`: assembled pronunciation with validators
//! - `GET /data/{letter}.json`: cached letter shard proxy
//! - `GET /reload-phonetics`: drop and reload the bulk phonetic table
//! - `GET /health`, `GET /metrics`: operational endpoints
//!
//! Graceful shutdown goes through [`ShutdownCoordinator`].

#![deny(unsafe_code)]

pub mod errors;
pub mod handlers;
pub mod health;
pub mod metrics;
pub mod server;
pub mod shutdown;

pub use errors::ApiError;
pub use server::{AppState, VoxServer};
pub use shutdown::ShutdownCoordinator;
