//! Routing decision assembly.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::reference::{Operator, SharedReference};
use crate::telemetry::counters;

use super::error::RoutingError;
use super::pricing::{listing_order, rank_backups, Quote};
use super::resolver::{provider_failure, PrefixResolver};
use super::DEFAULT_MAX_BACKUPS;

/// Account used for operator lookups that are not tied to a customer.
pub const SYSTEM_ACCOUNT: &str = "system";

/// A request to route one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingRequest {
    /// Destination phone number, any common formatting
    #[serde(rename = "destination_msisdn")]
    pub destination: String,
    /// Opaque, carried for logs only
    pub account_id: String,
    /// Number of segments, at least 1
    pub message_parts: u32,
}

impl RoutingRequest {
    pub fn new(destination: impl Into<String>, account_id: impl Into<String>, message_parts: u32) -> Self {
        Self {
            destination: destination.into(),
            account_id: account_id.into(),
            message_parts,
        }
    }

    /// Check boundary constraints.
    pub fn validate(&self) -> Result<(), RoutingError> {
        if self.destination.trim().is_empty() {
            return Err(RoutingError::InvalidRequest(
                "destination_msisdn is required".to_string(),
            ));
        }
        if self.account_id.trim().is_empty() {
            return Err(RoutingError::InvalidRequest(
                "account_id is required".to_string(),
            ));
        }
        if self.message_parts < 1 {
            return Err(RoutingError::InvalidRequest(
                "message_parts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Decision outcome tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    NoRoute,
    Error,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::NoRoute => "no_route",
            Outcome::Error => "error",
        }
    }
}

/// Where to send a message, at what cost, and what to fall back to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutingDecision {
    pub primary_connector_id: String,
    /// Ordered best first
    pub backup_connector_ids: Vec<String>,
    pub cost_per_part: Decimal,
    pub currency: String,
    pub operator_name: String,
    pub estimated_cost: Decimal,
    #[serde(rename = "routing_decision")]
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Operator that owns a phone number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperatorLookup {
    pub phone: String,
    pub operator: String,
    pub connector_id: String,
    pub price: Decimal,
    pub currency: String,
}

/// Builds routing decisions from reference data.
///
/// Holds no state besides the provider handle; every call re-reads data.
#[derive(Clone)]
pub struct DecisionComposer {
    resolver: PrefixResolver,
    reference: SharedReference,
    max_backups: usize,
}

impl DecisionComposer {
    pub fn new(reference: SharedReference) -> Self {
        Self {
            resolver: PrefixResolver::new(Arc::clone(&reference)),
            reference,
            max_backups: DEFAULT_MAX_BACKUPS,
        }
    }

    /// Cap on backup connectors per decision.
    pub fn with_max_backups(mut self, max_backups: usize) -> Self {
        self.max_backups = max_backups;
        self
    }

    pub fn max_backups(&self) -> usize {
        self.max_backups
    }

    pub fn resolver(&self) -> &PrefixResolver {
        &self.resolver
    }

    /// Route one message.
    pub async fn decide(&self, request: &RoutingRequest) -> Result<RoutingDecision, RoutingError> {
        request.validate()?;

        let operator = self.resolver.resolve(&request.destination).await?;

        let quote = Quote::for_operator(&operator, request.message_parts).ok_or_else(|| {
            RoutingError::InvalidRequest(format!(
                "estimated cost overflows for {} parts",
                request.message_parts
            ))
        })?;

        let backups = self.backups(&operator).await?;
        counters::backups(backups.len());

        info!(
            account_id = %request.account_id,
            destination = %request.destination,
            operator = %operator.name,
            connector = %operator.connector_id,
            backups = backups.len(),
            cost_per_part = %quote.cost_per_part,
            "routing decision"
        );

        Ok(RoutingDecision {
            primary_connector_id: operator.connector_id,
            backup_connector_ids: backups.into_iter().map(|op| op.connector_id).collect(),
            cost_per_part: quote.cost_per_part,
            currency: quote.currency,
            operator_name: operator.name,
            estimated_cost: quote.estimated_cost,
            outcome: Outcome::Success,
            message: None,
        })
    }

    /// Ranked backup operators for `primary`.
    pub async fn backups(&self, primary: &Operator) -> Result<Vec<Operator>, RoutingError> {
        let candidates = self
            .reference
            .list_active_operators(Some(primary.id))
            .await
            .map_err(|e| provider_failure("list_active_operators", e))?;

        let ranked = rank_backups(
            candidates.into_iter().filter(|op| op.id != primary.id).collect(),
            self.max_backups,
        );

        debug!(
            primary = %primary.id,
            backups = ?ranked.iter().map(|op| op.id.0).collect::<Vec<_>>(),
            "backups ranked"
        );

        Ok(ranked)
    }

    /// All active operators, preferred first.
    pub async fn active_operators(&self) -> Result<Vec<Operator>, RoutingError> {
        let mut operators = self
            .reference
            .list_active_operators(None)
            .await
            .map_err(|e| provider_failure("list_active_operators", e))?;

        operators.retain(Operator::is_active);
        operators.sort_by(listing_order);
        Ok(operators)
    }

    /// Operator that would carry a single-part message to `phone`.
    pub async fn lookup(&self, phone: &str) -> Result<OperatorLookup, RoutingError> {
        let request = RoutingRequest::new(phone, SYSTEM_ACCOUNT, 1);
        let decision = self.decide(&request).await?;

        Ok(OperatorLookup {
            phone: phone.to_string(),
            operator: decision.operator_name,
            connector_id: decision.primary_connector_id,
            price: decision.cost_per_part,
            currency: decision.currency,
        })
    }
}
