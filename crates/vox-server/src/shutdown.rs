//! Graceful shutdown coordination via `CancellationToken`.

use tokio_util::sync::CancellationToken;
use tracing::info;

/// Coordinates graceful shutdown of the HTTP server.
#[derive(Clone, Debug, Default)]
pub struct ShutdownCoordinator {
    token: CancellationToken,
}

impl ShutdownCoordinator {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        Self::default()
    }

    /// A clone of the cancellation token.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Initiate shutdown.
    pub fn shutdown(&self) {
        if !self.token.is_cancelled() {
            info!("shutdown requested");
        }
        self.token.cancel();
    }

    /// Whether a shutdown has been initiated.
    pub fn is_shutting_down(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolve once shutdown is initiated.
    pub async fn wait(&self) {
        self.token.cancelled().await;
    }

    /// Cancel on Ctrl-C. Spawns a task; returns immediately.
    pub fn cancel_on_ctrl_c(&self) {
        let coordinator = self.clone();
        drop(tokio::spawn(async move {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    if result.is_ok() {
                        coordinator.shutdown();
                    }
                }
                () = coordinator.wait() => {}
            }
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_not_shutting_down() {
        assert!(!ShutdownCoordinator::new().is_shutting_down());
    }

    #[test]
    fn shutdown_is_idempotent() {
        let coord = ShutdownCoordinator::new();
        coord.shutdown();
        coord.shutdown();
        assert!(coord.is_shutting_down());
    }

    #[test]
    fn clones_share_state() {
        let coord = ShutdownCoordinator::new();
        let token = coord.token();
        let other = coord.clone();
        other.shutdown();
        assert!(token.is_cancelled());
        assert!(coord.is_shutting_down());
    }

    #[tokio::test]
    async fn wait_resolves_after_shutdown() {
        let coord = ShutdownCoordinator::new();
        let waiter = {
            let coord = coord.clone();
            tokio::spawn(async move {
                coord.wait().await;
                true
            })
        };
        coord.shutdown();
        assert!(waiter.await.unwrap());
    }
}
