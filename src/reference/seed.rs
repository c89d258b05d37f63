//! YAML seed files for the in-memory reference backend.
//!
//! ```yaml
//! operators:
//!   - id: 1
//!     name: Beeline
//!     country: UZ
//!     mcc: "434"
//!     mnc: "04"
//!     smpp_connector_id: smpp-beeline
//!     status: active
//!     price_per_sms: 0.02
//!     currency: USD
//!     health_score: 90
//!     priority: 1
//! prefixes:
//!   - country_code: "+998"
//!     prefix: "90"
//!     operator_id: 1
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::{Operator, PrefixRule};

/// Operators and prefix rules loaded from a seed file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceSeed {
    #[serde(default)]
    pub operators: Vec<Operator>,
    #[serde(default)]
    pub prefixes: Vec<PrefixRule>,
}

/// Seed loading errors.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("failed to read seed file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse seed: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid seed: {0}")]
    Invalid(String),
}

impl ReferenceSeed {
    /// Load and validate a seed file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SeedError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading reference seed");

        let contents = fs::read_to_string(path).map_err(|source| SeedError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_yaml(&contents)
    }

    /// Parse and validate a seed from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, SeedError> {
        let seed: ReferenceSeed = serde_yaml::from_str(yaml)?;
        seed.validate()?;
        Ok(seed)
    }

    /// Check referential integrity and value ranges.
    pub fn validate(&self) -> Result<(), SeedError> {
        let mut ids = HashSet::new();
        for op in &self.operators {
            if !ids.insert(op.id) {
                return Err(SeedError::Invalid(format!("duplicate operator id {}", op.id)));
            }
            if op.price_per_sms.is_sign_negative() {
                return Err(SeedError::Invalid(format!(
                    "operator {} has negative price {}",
                    op.id, op.price_per_sms
                )));
            }
            if op.health_score > 100 {
                return Err(SeedError::Invalid(format!(
                    "operator {} health score {} is outside 0-100",
                    op.id, op.health_score
                )));
            }
            if op.connector_id.trim().is_empty() {
                return Err(SeedError::Invalid(format!(
                    "operator {} has no connector id",
                    op.id
                )));
            }
        }

        for rule in &self.prefixes {
            let key = rule.key();
            if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
                return Err(SeedError::Invalid(format!(
                    "prefix rule '{}'/'{}' must be digits only",
                    rule.country_code, rule.prefix
                )));
            }
            if !ids.contains(&rule.operator_id) {
                return Err(SeedError::Invalid(format!(
                    "prefix rule {} references unknown operator {}",
                    key, rule.operator_id
                )));
            }
        }

        Ok(())
    }
}
