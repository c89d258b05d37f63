//! Least-cost routing decisions.
//!
//! Routes a message to a connector based on:
//! - Longest matching country code + national prefix
//! - Operator lifecycle status (only `active` operators carry traffic)
//! - Price per segment, health score and priority for backups
//!
//! [`PrefixResolver`] maps a destination to its operator; [`DecisionComposer`]
//! builds the full [`RoutingDecision`] on top of it.

mod composer;
mod error;
mod matcher;
mod pricing;
mod resolver;

pub use composer::{
    DecisionComposer, OperatorLookup, Outcome, RoutingDecision, RoutingRequest, SYSTEM_ACCOUNT,
};
pub use error::{NoRouteReason, RoutingError};
pub use matcher::{normalize_msisdn, PrefixEntry, PrefixTable};
pub use pricing::{backup_order, listing_order, rank_backups, Quote};
pub use resolver::PrefixResolver;

/// Backup connectors returned per decision unless configured otherwise.
pub const DEFAULT_MAX_BACKUPS: usize = 3;
