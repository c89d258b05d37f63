//! Read-only reference data: operators and prefix rules.
//!
//! The routing engine reads everything through the [`ReferenceData`] trait,
//! injected at construction:
//!
//! ```text
//!                 ┌─────────────────────┐
//!                 │    ReferenceData    │
//!                 └──────────┬──────────┘
//!              ┌─────────────┴─────────────┐
//!              ▼                           ▼
//!      ┌───────────────┐          ┌─────────────────┐
//!      │    Memory     │          │    PostgreSQL   │
//!      │ (seed / dev)  │          │  (sqlx pool)    │
//!      └───────────────┘          └─────────────────┘
//! ```
//!
//! - [`MemoryReferenceData`]: snapshot built from a YAML [`ReferenceSeed`]
//! - [`PostgresReferenceData`]: `operators` / `mcc_mnc_prefixes` tables

mod factory;
mod memory;
mod postgres;
mod seed;
mod types;

pub use factory::{create_reference, ReferenceHandle};
pub use memory::MemoryReferenceData;
pub use postgres::{PoolSettings, PostgresReferenceData};
pub use seed::{ReferenceSeed, SeedError};
pub use types::{Operator, OperatorId, OperatorStatus, PrefixRule, UnknownStatus};

use std::sync::Arc;

use async_trait::async_trait;

/// Reference data provider errors.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("invalid reference data: {0}")]
    InvalidData(String),

    #[error("reference data unavailable: {0}")]
    Unavailable(String),
}

/// Read interface over operators and prefix rules.
///
/// Implementations are shared across concurrent requests and must be
/// thread-safe. They never retry; errors go straight back to the caller.
#[async_trait]
pub trait ReferenceData: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &'static str;

    /// Fetch an operator by id regardless of status.
    async fn find_operator(&self, id: OperatorId) -> Result<Option<Operator>, ProviderError>;

    /// All active operators, optionally excluding one. Order is unspecified.
    async fn list_active_operators(
        &self,
        excluding: Option<OperatorId>,
    ) -> Result<Vec<Operator>, ProviderError>;

    /// Operator owning the longest rule key that prefixes `normalized`.
    ///
    /// Only rules whose operator is active are considered. Equal-length keys
    /// are ordered by operator priority, then operator id.
    async fn find_longest_matching_prefix(
        &self,
        normalized: &str,
    ) -> Result<Option<OperatorId>, ProviderError>;

    /// Cheap liveness probe.
    async fn ping(&self) -> Result<(), ProviderError>;
}

/// Shared provider handle.
pub type SharedReference = Arc<dyn ReferenceData>;
