use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use super::types::{Config, ReferenceConfig};

/// Env var replacing the HTTP port.
pub const PORT_ENV: &str = "PORT";
/// Env var replacing the PostgreSQL URL.
pub const DB_URL_ENV: &str = "ROUTING_DB_URL";

const MAX_BACKUPS_LIMIT: usize = 32;

impl Config {
    /// Load configuration from a YAML file, applying env overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        debug!(path = %path.display(), "loading configuration");

        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        let mut config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;

        config.apply_env_overrides(|key| std::env::var(key).ok())?;

        if let Some(dir) = path.parent() {
            config.resolve_paths(dir);
        }

        config.validate()?;

        Ok(config)
    }

    /// Parse configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)
            .context("failed to parse YAML configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Apply `PORT` and `ROUTING_DB_URL` overrides from `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup(PORT_ENV) {
            let port: u16 = port
                .trim()
                .parse()
                .with_context(|| format!("invalid {} value: {}", PORT_ENV, port))?;
            self.server.address.set_port(port);
        }

        if let Some(url) = lookup(DB_URL_ENV) {
            if let ReferenceConfig::Postgres(ref mut pg) = self.reference {
                pg.url = url;
            }
        }

        Ok(())
    }

    /// Resolve relative file references against `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        if let ReferenceConfig::Memory(ref mut memory) = self.reference {
            if let Some(seed) = memory.seed.as_mut() {
                if seed.is_relative() {
                    *seed = base.join(&*seed);
                }
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.routing.max_backups > MAX_BACKUPS_LIMIT {
            anyhow::bail!(
                "routing.max_backups must be at most {}, got {}",
                MAX_BACKUPS_LIMIT,
                self.routing.max_backups
            );
        }

        if self.server.request_timeout.is_zero() {
            anyhow::bail!("server.request_timeout must be greater than zero");
        }

        if !(0.0..=1.0).contains(&self.telemetry.trace_sample_rate) {
            anyhow::bail!(
                "telemetry.trace_sample_rate must be between 0.0 and 1.0, got {}",
                self.telemetry.trace_sample_rate
            );
        }

        if let ReferenceConfig::Postgres(ref pg) = self.reference {
            if pg.url.trim().is_empty() {
                anyhow::bail!(
                    "reference.url is required for the postgres backend (or set {})",
                    DB_URL_ENV
                );
            }
            if pg.max_connections == 0 {
                anyhow::bail!("reference.max_connections must be at least 1");
            }
            if pg.min_connections > pg.max_connections {
                anyhow::bail!(
                    "reference.min_connections ({}) exceeds max_connections ({})",
                    pg.min_connections,
                    pg.max_connections
                );
            }
        }

        info!("configuration validated successfully");
        Ok(())
    }
}
