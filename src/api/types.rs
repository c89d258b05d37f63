//! API response bodies.

use serde::{Deserialize, Serialize};

use crate::reference::Operator;

/// Body for failed routing decisions (404 / 503).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionFailure {
    pub routing_decision: String,
    pub message: String,
}

/// Generic error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: &str, message: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            message: message.into(),
        }
    }
}

/// Active operator listing.
#[derive(Debug, Clone, Serialize)]
pub struct OperatorsResponse {
    pub operators: Vec<Operator>,
    pub count: usize,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub service: String,
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}
