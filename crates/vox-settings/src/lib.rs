//! # vox-settings
//!
//! Configuration with layered sources for the vox server.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`VoxSettings::default()`]
//! 2. **Settings file**: `~/.vox/settings.json` or an explicit path (deep-merged over defaults)
//! 3. **Environment variables**: `VOX_*` overrides (highest priority)
//!
//! Settings are loaded once by the binary and passed down explicitly; there
//! is no global instance.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{apply_env_overrides, deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;
