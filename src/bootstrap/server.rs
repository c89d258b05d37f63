use anyhow::Result;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, span, warn, Level};

use crate::api::ApiServer;
use crate::config::{Config, MemoryReferenceConfig, ReferenceConfig, SeedWatcher};

use super::shutdown::Shutdown;
use super::state::ServiceState;

/// Main lcrd server
///
/// Components:
/// - Main task: signal handling, drain supervision
/// - API server: routing decisions, operator lookups, health, metrics
/// - Seed watcher: hot reload of the in-memory reference seed
/// - Shutdown: graceful drain with configurable timeout
pub struct Server {
    /// Configuration
    config: Arc<Config>,

    /// Shutdown coordinator
    shutdown: Arc<Shutdown>,
}

impl Server {
    /// Create a new server instance
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            shutdown: Arc::new(Shutdown::new()),
        }
    }

    /// Run the server until shutdown
    pub async fn run(self) -> Result<()> {
        let span = span!(Level::INFO, "lcrd", version = env!("CARGO_PKG_VERSION"));
        let _enter = span.enter();

        let state = ServiceState::new(self.config.clone()).await?;

        info!(
            backend = state.reference.name(),
            max_backups = self.config.routing.max_backups,
            request_timeout_ms = self.config.server.request_timeout.as_millis() as u64,
            "starting lcrd server"
        );

        // Start seed watcher if the memory backend asks for it
        let seed_watcher_handle = match (&self.config.reference, &state.reference.memory) {
            (
                ReferenceConfig::Memory(MemoryReferenceConfig {
                    seed: Some(path),
                    watch: true,
                }),
                Some(memory),
            ) => {
                let mut watcher = SeedWatcher::new(path, memory.clone())?;
                watcher.start()?;
                let (shutdown_tx, shutdown_rx) = watch::channel(false);

                let handle = tokio::spawn(async move {
                    watcher.run(shutdown_rx).await;
                });

                Some((handle, shutdown_tx))
            }
            _ => None,
        };

        // Spawn API server task
        let api = ApiServer::new(
            self.config.server.address,
            Arc::new(state.api_state()),
            self.shutdown.clone(),
        );
        let mut api_handle = tokio::spawn(async move {
            if let Err(e) = api.run().await {
                error!(error = %e, "routing API server failed");
            }
        });

        info!(
            address = %self.config.server.address,
            drain_timeout_secs = self.config.shutdown.drain_timeout.as_secs(),
            seed_watch = seed_watcher_handle.is_some(),
            "lcrd server started"
        );

        // Wait for a signal, or for the API server to exit on its own
        let api_finished = tokio::select! {
            _ = wait_for_shutdown() => false,
            _ = &mut api_handle => true,
        };

        info!("starting graceful shutdown");
        self.shutdown.start_drain();

        if !api_finished {
            let drain_timeout = self.config.shutdown.drain_timeout;
            if tokio::time::timeout(drain_timeout, &mut api_handle).await.is_err() {
                warn!(
                    drain_timeout_secs = drain_timeout.as_secs(),
                    "drain timeout reached, forcing shutdown"
                );
                api_handle.abort();
            }
        }

        // Stop seed watcher
        if let Some((handle, shutdown_tx)) = seed_watcher_handle {
            let _ = shutdown_tx.send(true);
            let _ = handle.await;
        }

        self.shutdown.terminate();

        // Flush tracing
        crate::telemetry::shutdown_tracing();

        info!("lcrd server stopped");

        Ok(())
    }

    /// Get shutdown coordinator
    pub fn shutdown(&self) -> Arc<Shutdown> {
        self.shutdown.clone()
    }
}

/// Wait for shutdown signal (SIGINT or SIGTERM)
async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("received SIGINT (Ctrl+C)");
        }
        _ = terminate => {
            info!("received SIGTERM");
        }
    }
}
