//! `VoxServer`: Axum HTTP server.

use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use vox_engine::Engine;
use vox_settings::ServerSettings;

use crate::errors::ApiError;
use crate::handlers;
use crate::shutdown::ShutdownCoordinator;

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Caches, upstream clients and the pronunciation pipeline.
    pub engine: Engine,
    /// When the server started.
    pub start_time: Instant,
    /// Prometheus handle, when a recorder was installed.
    pub metrics: Option<Arc<PrometheusHandle>>,
}

/// The pronunciation HTTP server.
pub struct VoxServer {
    config: ServerSettings,
    engine: Engine,
    metrics: Option<Arc<PrometheusHandle>>,
    shutdown: ShutdownCoordinator,
    start_time: Instant,
}

impl VoxServer {
    /// Create a new server around a built engine.
    pub fn new(config: ServerSettings, engine: Engine) -> Self {
        Self {
            config,
            engine,
            metrics: None,
            shutdown: ShutdownCoordinator::new(),
            start_time: Instant::now(),
        }
    }

    /// Expose `GET /metrics` from this handle.
    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(Arc::new(handle));
        self
    }

    /// Build the Axum router with all routes and middleware.
    pub fn router(&self) -> Router {
        let state = AppState {
            engine: self.engine.clone(),
            start_time: self.start_time,
            metrics: self.metrics.clone(),
        };

        Router::new()
            .route("/get-pronunciation", post(handlers::get_pronunciation))
            .route("/data/{file}", get(handlers::get_shard))
            .route("/reload-phonetics", get(handlers::reload_phonetics))
            .route("/health", get(handlers::health))
            .route("/metrics", get(handlers::metrics))
            .layer(DefaultBodyLimit::max(self.config.max_body_bytes))
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .layer(CatchPanicLayer::custom(panic_response))
            .with_state(state)
    }

    /// Bind the configured address.
    pub async fn bind(&self) -> std::io::Result<TcpListener> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        TcpListener::bind(&addr).await
    }

    /// Serve on `listener` until the shutdown coordinator fires.
    pub async fn serve(&self, listener: TcpListener) -> std::io::Result<()> {
        let local: SocketAddr = listener.local_addr()?;
        info!(addr = %local, "vox server listening");

        let shutdown = self.shutdown.clone();
        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move { shutdown.wait().await })
            .await?;

        info!("vox server stopped");
        Ok(())
    }

    /// Get the shutdown coordinator.
    pub fn shutdown(&self) -> &ShutdownCoordinator {
        &self.shutdown
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerSettings {
        &self.config
    }

    /// Get the engine.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }
}

fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(panic = message, "handler panicked");
    ApiError::Panic.into_response()
}
