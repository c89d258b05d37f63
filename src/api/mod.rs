//! Routing HTTP API using Axum.
//!
//! Provides endpoints for:
//! - Routing decisions (POST /v1/routing/decision)
//! - Operator listing and lookup (/v1/operators, /v1/operators/{phone})
//! - Health checks (/health, /livez, /readyz)
//! - Metrics (/metrics)

mod handlers;
mod server;
mod types;

pub use server::{build_router, ApiServer, ApiState};
pub use types::{DecisionFailure, ErrorResponse, HealthResponse, OperatorsResponse};
