use crate::reference::{OperatorId, ProviderError};

/// Why a destination has no route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoRouteReason {
    /// No rule key prefixes the destination
    NoMatchingPrefix { destination: String },
    /// A rule matched but its operator is no longer active (or gone)
    OperatorInactive {
        destination: String,
        operator_id: OperatorId,
    },
}

impl NoRouteReason {
    /// Normalized destination the lookup ran against.
    pub fn destination(&self) -> &str {
        match self {
            NoRouteReason::NoMatchingPrefix { destination }
            | NoRouteReason::OperatorInactive { destination, .. } => destination,
        }
    }

    /// Short label for structured logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            NoRouteReason::NoMatchingPrefix { .. } => "no_matching_prefix",
            NoRouteReason::OperatorInactive { .. } => "operator_inactive",
        }
    }
}

impl std::fmt::Display for NoRouteReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NoRouteReason::NoMatchingPrefix { destination } => {
                write!(f, "no route for {}: no matching prefix", destination)
            }
            NoRouteReason::OperatorInactive {
                destination,
                operator_id,
            } => write!(
                f,
                "no route for {}: operator {} is not active",
                destination, operator_id
            ),
        }
    }
}

/// Routing errors.
#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("{0}")]
    NoRoute(NoRouteReason),

    #[error("routing data unavailable: {0}")]
    DataProvider(#[from] ProviderError),
}

impl RoutingError {
    /// Response outcome this error maps to.
    pub fn outcome(&self) -> Option<super::Outcome> {
        match self {
            RoutingError::InvalidRequest(_) => None,
            RoutingError::NoRoute(_) => Some(super::Outcome::NoRoute),
            RoutingError::DataProvider(_) => Some(super::Outcome::Error),
        }
    }

    pub fn is_no_route(&self) -> bool {
        matches!(self, RoutingError::NoRoute(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_route_messages_name_destination() {
        let err = RoutingError::NoRoute(NoRouteReason::NoMatchingPrefix {
            destination: "258841234567".to_string(),
        });
        let msg = err.to_string();
        assert!(msg.starts_with("no route"));
        assert!(msg.contains("258841234567"));

        let err = RoutingError::NoRoute(NoRouteReason::OperatorInactive {
            destination: "998901234567".to_string(),
            operator_id: OperatorId(2),
        });
        let msg = err.to_string();
        assert!(msg.starts_with("no route"));
        assert!(msg.contains("998901234567"));
        assert!(msg.contains("operator 2"));
    }

    #[test]
    fn test_provider_error_message() {
        let err = RoutingError::from(ProviderError::Unavailable("connection refused".to_string()));
        assert!(err.to_string().starts_with("routing data unavailable"));
        assert_eq!(err.outcome(), Some(crate::router::Outcome::Error));
        assert!(!err.is_no_route());
    }
}
