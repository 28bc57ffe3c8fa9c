//! # vox
//!
//! Pronunciation service binary. Loads settings, builds the engine over the
//! HTTP upstream clients and serves until Ctrl-C.

#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use vox_engine::{Engine, Upstreams};
use vox_server::VoxServer;
use vox_settings::VoxSettings;

/// Pronunciation service.
#[derive(Parser, Debug)]
#[command(name = "vox", about = "Pronunciation lookup service")]
struct Cli {
    /// Host to bind (overrides settings).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind, 0 for auto-assign (overrides settings).
    #[arg(long)]
    port: Option<u16>,

    /// Settings file (defaults to `~/.vox/settings.json`).
    #[arg(long)]
    settings: Option<PathBuf>,
}

impl Cli {
    fn load_settings(&self) -> Result<VoxSettings> {
        let path = self.settings.clone().unwrap_or_else(vox_settings::settings_path);
        let mut settings = vox_settings::load_settings_from_path(&path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?;
        if let Some(host) = &self.host {
            settings.server.host.clone_from(host);
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        Ok(settings)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    let settings = args.load_settings()?;

    vox_core::logging::init_subscriber(&settings.logging.level, settings.logging.json);

    let upstreams = Upstreams::http(&settings.upstream).context("Failed to build upstream clients")?;
    let engine = Engine::new(&settings, upstreams);
    tracing::info!(
        accents = engine.voices.len(),
        dataset = settings.upstream.dataset_base_url.as_str(),
        "engine ready"
    );

    let mut server = VoxServer::new(settings.server.clone(), engine);
    if let Some(handle) = vox_server::metrics::install_recorder() {
        server = server.with_metrics(handle);
    }
    server.shutdown().cancel_on_ctrl_c();

    let listener = server
        .bind()
        .await
        .with_context(|| format!("Failed to bind {}:{}", settings.server.host, settings.server.port))?;
    server.serve(listener).await.context("Server error")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_flags_override_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"server": {"host": "10.0.0.1", "port": 8080}}"#).unwrap();

        let cli = Cli::parse_from(["vox", "--settings", path.to_str().unwrap(), "--port", "0"]);
        let settings = cli.load_settings().unwrap();
        assert_eq!(settings.server.host, "10.0.0.1");
        assert_eq!(settings.server.port, 0);
    }

    #[test]
    fn missing_settings_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let cli = Cli::parse_from(["vox", "--settings", path.to_str().unwrap(), "--host", "127.0.0.1"]);
        let settings = cli.load_settings().unwrap();
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.port, VoxSettings::default().server.port);
    }

    #[test]
    fn invalid_settings_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ nope").unwrap();
        let cli = Cli::parse_from(["vox", "--settings", path.to_str().unwrap()]);
        assert!(cli.load_settings().is_err());
    }
}
