//! Cost-based selection.
//!
//! - Per-message quote for the primary operator
//! - Least-cost ranking of backup operators

use std::cmp::Ordering;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::reference::Operator;

/// Price of a message on one operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quote {
    /// Price per segment, verbatim from the operator
    pub cost_per_part: Decimal,
    /// Currency code (ISO 4217)
    pub currency: String,
    /// `cost_per_part * parts`
    pub estimated_cost: Decimal,
}

impl Quote {
    /// Quote `parts` segments on `operator`.
    ///
    /// Returns `None` if the total overflows.
    pub fn for_operator(operator: &Operator, parts: u32) -> Option<Self> {
        let estimated_cost = operator
            .price_per_sms
            .checked_mul(Decimal::from(parts))?;

        Some(Self {
            cost_per_part: operator.price_per_sms,
            currency: operator.currency.clone(),
            estimated_cost,
        })
    }
}

/// Backup ordering: cheapest first, then healthiest, then preferred, then id.
pub fn backup_order(a: &Operator, b: &Operator) -> Ordering {
    a.price_per_sms
        .cmp(&b.price_per_sms)
        .then_with(|| b.health_score.cmp(&a.health_score))
        .then_with(|| a.priority.cmp(&b.priority))
        .then_with(|| a.id.cmp(&b.id))
}

/// Listing order: preferred first, then cheapest, then id.
pub fn listing_order(a: &Operator, b: &Operator) -> Ordering {
    a.priority
        .cmp(&b.priority)
        .then_with(|| a.price_per_sms.cmp(&b.price_per_sms))
        .then_with(|| a.id.cmp(&b.id))
}

/// Rank backup candidates and keep at most `limit`.
///
/// Inactive candidates are dropped even if the provider returned them.
pub fn rank_backups(mut candidates: Vec<Operator>, limit: usize) -> Vec<Operator> {
    candidates.retain(Operator::is_active);
    candidates.sort_by(backup_order);
    candidates.truncate(limit);
    candidates
}
