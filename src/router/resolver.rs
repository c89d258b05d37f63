//! Destination to operator resolution.

use tracing::{debug, error, warn};

use crate::reference::{Operator, ProviderError, SharedReference};
use crate::telemetry::counters;

use super::error::{NoRouteReason, RoutingError};
use super::matcher::normalize_msisdn;

/// Resolves a destination number to the active operator that owns it.
#[derive(Clone)]
pub struct PrefixResolver {
    reference: SharedReference,
}

impl PrefixResolver {
    pub fn new(reference: SharedReference) -> Self {
        Self { reference }
    }

    /// Resolve `destination` to its owning operator.
    ///
    /// The matched operator is fetched again and must still be active; a
    /// rule can outlive its operator's status between the two reads.
    pub async fn resolve(&self, destination: &str) -> Result<Operator, RoutingError> {
        let normalized = normalize_msisdn(destination);

        let operator_id = self
            .reference
            .find_longest_matching_prefix(&normalized)
            .await
            .map_err(|e| provider_failure("find_longest_matching_prefix", e))?;

        let Some(operator_id) = operator_id else {
            let reason = NoRouteReason::NoMatchingPrefix {
                destination: normalized,
            };
            warn!(destination = %reason.destination(), reason = reason.as_str(), "no route");
            return Err(RoutingError::NoRoute(reason));
        };

        let operator = self
            .reference
            .find_operator(operator_id)
            .await
            .map_err(|e| provider_failure("find_operator", e))?;

        match operator {
            Some(operator) if operator.is_active() => {
                debug!(
                    destination = %normalized,
                    operator_id = %operator.id,
                    operator = %operator.name,
                    connector = %operator.connector_id,
                    "destination resolved"
                );
                Ok(operator)
            }
            _ => {
                let reason = NoRouteReason::OperatorInactive {
                    destination: normalized,
                    operator_id,
                };
                warn!(
                    destination = %reason.destination(),
                    operator_id = %operator_id,
                    reason = reason.as_str(),
                    "no route"
                );
                Err(RoutingError::NoRoute(reason))
            }
        }
    }
}

pub(super) fn provider_failure(op: &str, err: ProviderError) -> RoutingError {
    error!(op, error = %err, "reference data read failed");
    counters::provider_error(op);
    RoutingError::DataProvider(err)
}
