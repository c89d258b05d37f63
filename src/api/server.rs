//! API HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tracing::info;

use crate::bootstrap::Shutdown;
use crate::reference::SharedReference;
use crate::router::DecisionComposer;

use super::handlers::{
    decision_handler, health_handler, live_handler, metrics_handler, operator_lookup_handler,
    operators_handler, ready_handler,
};

/// Shared handler state.
pub struct ApiState {
    pub composer: DecisionComposer,
    pub reference: SharedReference,
    pub request_timeout: Duration,
}

impl ApiState {
    pub fn new(composer: DecisionComposer, reference: SharedReference) -> Self {
        Self {
            composer,
            reference,
            request_timeout: Duration::from_secs(5),
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Build the HTTP router.
pub fn build_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/v1/routing/decision", post(decision_handler))
        .route("/v1/operators", get(operators_handler))
        .route("/v1/operators/{phone}", get(operator_lookup_handler))
        // Health and metrics
        .route("/health", get(health_handler))
        .route("/livez", get(live_handler))
        .route("/readyz", get(ready_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

/// Routing API server.
pub struct ApiServer {
    address: SocketAddr,
    state: Arc<ApiState>,
    shutdown: Arc<Shutdown>,
}

impl ApiServer {
    pub fn new(address: SocketAddr, state: Arc<ApiState>, shutdown: Arc<Shutdown>) -> Self {
        Self {
            address,
            state,
            shutdown,
        }
    }

    /// Run until shutdown starts draining.
    pub async fn run(self) -> std::io::Result<()> {
        let router = build_router(self.state);

        info!(address = %self.address, "starting routing API server");

        let listener = TcpListener::bind(self.address).await?;
        let shutdown = self.shutdown;

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                shutdown.draining().await;
                info!("routing API server shutting down");
            })
            .await?;

        Ok(())
    }
}
