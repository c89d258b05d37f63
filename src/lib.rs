//! lcrd: least-cost routing decisions for outbound SMS.
//!
//! Given a destination number, picks the operator that owns it by longest
//! prefix match, prices the message, and ranks backup connectors.

pub mod api;
pub mod bootstrap;
pub mod config;
pub mod reference;
pub mod router;
pub mod telemetry;
