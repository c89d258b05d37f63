//! Shared service state.
//!
//! Contains the core components shared across the service:
//! - Reference data provider (memory or postgres)
//! - Decision composer (routing decisions)
//! - Config (settings)

use std::sync::Arc;

use crate::api::ApiState;
use crate::config::Config;
use crate::reference::{create_reference, ReferenceHandle};
use crate::router::DecisionComposer;

/// Shared service state.
///
/// All fields are thread-safe and can be cloned cheaply.
#[derive(Clone)]
pub struct ServiceState {
    /// Reference data (operators and prefix rules)
    pub reference: ReferenceHandle,
    /// Decision composer (routing decisions)
    pub composer: DecisionComposer,
    /// Configuration
    pub config: Arc<Config>,
}

impl ServiceState {
    /// Create a new service state from configuration.
    pub async fn new(config: Arc<Config>) -> anyhow::Result<Self> {
        let reference = create_reference(&config.reference).await?;
        Ok(Self::with_reference(config, reference))
    }

    /// Create with an already-built reference backend.
    pub fn with_reference(config: Arc<Config>, reference: ReferenceHandle) -> Self {
        let composer = DecisionComposer::new(reference.shared.clone())
            .with_max_backups(config.routing.max_backups);

        Self {
            reference,
            composer,
            config,
        }
    }

    /// Handler state for the HTTP API.
    pub fn api_state(&self) -> ApiState {
        ApiState::new(self.composer.clone(), self.reference.shared.clone())
            .with_request_timeout(self.config.server.request_timeout)
    }
}
