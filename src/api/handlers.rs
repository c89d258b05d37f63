//! API handlers.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::warn;

use crate::reference::ProviderError;
use crate::router::{Outcome, RoutingError, RoutingRequest};
use crate::telemetry::{counters, render_metrics};

use super::server::ApiState;
use super::types::{DecisionFailure, ErrorResponse, HealthResponse, OperatorsResponse};

/// Run `fut` under the configured request timeout.
///
/// An expired deadline is reported as a provider failure.
async fn with_deadline<T, F>(state: &ApiState, fut: F) -> Result<T, RoutingError>
where
    F: Future<Output = Result<T, RoutingError>>,
{
    match tokio::time::timeout(state.request_timeout, fut).await {
        Ok(result) => result,
        Err(_) => {
            warn!(timeout_ms = state.request_timeout.as_millis() as u64, "request timed out");
            Err(RoutingError::DataProvider(ProviderError::Unavailable(format!(
                "timed out after {:?}",
                state.request_timeout
            ))))
        }
    }
}

fn invalid_request(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::new("invalid_request", message)),
    )
        .into_response()
}

/// Routing decision handler.
///
/// POST /v1/routing/decision
pub async fn decision_handler(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<RoutingRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return invalid_request(rejection.body_text()),
    };

    let start = Instant::now();
    let result = with_deadline(&state, state.composer.decide(&request)).await;
    let elapsed = start.elapsed().as_secs_f64();

    match result {
        Ok(decision) => {
            counters::decision(Outcome::Success.as_str(), elapsed);
            (StatusCode::OK, Json(decision)).into_response()
        }
        Err(RoutingError::InvalidRequest(message)) => invalid_request(message),
        Err(err) => {
            let (status, outcome) = match err {
                RoutingError::NoRoute(_) => (StatusCode::NOT_FOUND, Outcome::NoRoute),
                _ => (StatusCode::SERVICE_UNAVAILABLE, Outcome::Error),
            };
            counters::decision(outcome.as_str(), elapsed);

            let body = DecisionFailure {
                routing_decision: outcome.as_str().to_string(),
                message: err.to_string(),
            };
            (status, Json(body)).into_response()
        }
    }
}

/// Active operators handler.
///
/// GET /v1/operators
pub async fn operators_handler(State(state): State<Arc<ApiState>>) -> Response {
    match with_deadline(&state, state.composer.active_operators()).await {
        Ok(operators) => {
            let count = operators.len();
            (StatusCode::OK, Json(OperatorsResponse { operators, count })).into_response()
        }
        Err(err) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse::new("database_error", err.to_string())),
        )
            .into_response(),
    }
}

/// Phone number to operator handler.
///
/// GET /v1/operators/{phone}
pub async fn operator_lookup_handler(
    State(state): State<Arc<ApiState>>,
    Path(phone): Path<String>,
) -> Response {
    match with_deadline(&state, state.composer.lookup(&phone)).await {
        Ok(lookup) => (StatusCode::OK, Json(lookup)).into_response(),
        Err(err @ RoutingError::DataProvider(_)) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse::new("database_error", err.to_string())),
        )
            .into_response(),
        Err(err) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("operator_not_found", err.to_string())),
        )
            .into_response(),
    }
}

/// Health check handler.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        service: "routing".to_string(),
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Live handler (for Kubernetes).
pub async fn live_handler() -> impl IntoResponse {
    StatusCode::OK
}

/// Ready handler (for Kubernetes).
pub async fn ready_handler(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    match state.reference.ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            warn!(backend = state.reference.name(), error = %e, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Metrics handler (Prometheus format).
pub async fn metrics_handler() -> impl IntoResponse {
    match render_metrics() {
        Ok(output) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
            output,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            format!("Error encoding metrics: {}", e),
        ),
    }
}
