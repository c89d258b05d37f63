//! Operator and prefix rule records.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Operator identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperatorId(pub i64);

impl fmt::Display for OperatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for OperatorId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Operator lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatorStatus {
    /// Eligible for routing
    Active,
    /// Temporarily disabled
    Suspended,
    /// Being provisioned, not routable yet
    Testing,
}

impl OperatorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperatorStatus::Active => "active",
            OperatorStatus::Suspended => "suspended",
            OperatorStatus::Testing => "testing",
        }
    }
}

impl fmt::Display for OperatorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a status string is not one of the known values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown operator status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for OperatorStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(OperatorStatus::Active),
            "suspended" => Ok(OperatorStatus::Suspended),
            "testing" => Ok(OperatorStatus::Testing),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

/// A mobile network operator (carrier).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operator {
    pub id: OperatorId,
    pub name: String,
    #[serde(default)]
    pub country: String,
    /// Mobile Country Code
    #[serde(default)]
    pub mcc: String,
    /// Mobile Network Code
    #[serde(default)]
    pub mnc: String,
    /// Downstream delivery channel bound to this operator
    #[serde(rename = "smpp_connector_id")]
    pub connector_id: String,
    pub status: OperatorStatus,
    /// Price per message segment
    pub price_per_sms: Decimal,
    pub currency: String,
    /// 0-100, higher is healthier
    pub health_score: u8,
    /// Lower number = higher priority
    #[serde(default)]
    pub priority: i32,
}

impl Operator {
    /// Whether the operator may carry traffic.
    pub fn is_active(&self) -> bool {
        self.status == OperatorStatus::Active
    }
}

/// Maps a number block (country code + national prefix) to its operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixRule {
    /// Country calling code, e.g. "998" or "+998"
    pub country_code: String,
    /// National prefix, e.g. "90"
    #[serde(default)]
    pub prefix: String,
    pub operator_id: OperatorId,
    #[serde(default)]
    pub mcc: String,
    #[serde(default)]
    pub mnc: String,
}

impl PrefixRule {
    /// Digits a normalized destination must start with for this rule to apply.
    pub fn key(&self) -> String {
        let mut key = self.country_code.trim().trim_start_matches('+').to_string();
        key.push_str(self.prefix.trim());
        key
    }
}
