//! # vox-core
//!
//! Shared vocabulary for the vox pronunciation service.
//!
//! - **Voices**: [`Accent`], [`Gender`], [`Speed`], [`Region`] and the
//!   process-wide [`VoiceTable`]
//! - **Requests**: [`PronunciationRequest`], validated and normalized
//! - **Documents**: [`ResponseDocument`], the unit returned to and cached for clients
//! - **Errors**: [`ValidationError`] and [`UpstreamError`] via `thiserror`
//! - **Logging**: [`logging::init_subscriber`]

#![deny(unsafe_code)]

pub mod document;
pub mod errors;
pub mod logging;
pub mod request;
pub mod voice;

pub use document::{AudioMetadata, ExampleUsage, PHONETIC_UNAVAILABLE, ResponseDocument};
pub use errors::{Service, UpstreamError, ValidationError};
pub use request::{MAX_WORD_CHARS, PronunciationRequest};
pub use voice::{Accent, Gender, Region, Speed, VoiceProfile, VoiceTable};
