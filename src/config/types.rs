use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration for lcrd
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// HTTP API settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Routing decision settings
    #[serde(default)]
    pub routing: RoutingConfig,

    /// Reference data backend
    #[serde(default)]
    pub reference: ReferenceConfig,

    /// Logging and tracing
    #[serde(default)]
    pub telemetry: TelemetryConfig,

    /// Shutdown behaviour
    #[serde(default)]
    pub shutdown: ShutdownConfig,
}

/// HTTP API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_server_address")]
    pub address: SocketAddr,

    /// Upper bound on a single routing decision, including data reads
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_server_address(),
            request_timeout: default_request_timeout(),
        }
    }
}

fn default_server_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(5)
}

/// Routing decision configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RoutingConfig {
    /// Maximum number of backup connectors per decision
    #[serde(default = "default_max_backups")]
    pub max_backups: usize,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            max_backups: default_max_backups(),
        }
    }
}

fn default_max_backups() -> usize {
    crate::router::DEFAULT_MAX_BACKUPS
}

/// Reference data backend selection
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum ReferenceConfig {
    /// In-process dataset, optionally seeded from a YAML file
    Memory(MemoryReferenceConfig),
    /// PostgreSQL through a connection pool
    Postgres(PostgresReferenceConfig),
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        ReferenceConfig::Memory(MemoryReferenceConfig::default())
    }
}

/// In-memory backend configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryReferenceConfig {
    /// Seed file (relative paths resolve against the config file)
    #[serde(default)]
    pub seed: Option<PathBuf>,

    /// Reload the seed file when it changes
    #[serde(default = "default_true")]
    pub watch: bool,
}

impl Default for MemoryReferenceConfig {
    fn default() -> Self {
        Self {
            seed: None,
            watch: true,
        }
    }
}

/// PostgreSQL backend configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PostgresReferenceConfig {
    /// Connection URL (overridden by ROUTING_DB_URL)
    #[serde(default)]
    pub url: String,

    /// Maximum pooled connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Connections kept open when idle
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection acquire timeout
    #[serde(default = "default_acquire_timeout", with = "humantime_serde")]
    pub acquire_timeout: Duration,
}

fn default_max_connections() -> u32 {
    25
}

fn default_min_connections() -> u32 {
    5
}

fn default_acquire_timeout() -> Duration {
    Duration::from_secs(5)
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable structured JSON logging
    #[serde(default)]
    pub json_logs: bool,

    /// OTLP endpoint for distributed tracing
    pub otlp_endpoint: Option<String>,

    /// Trace sample rate (0.0 - 1.0)
    #[serde(default = "default_sample_rate")]
    pub trace_sample_rate: f64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
            otlp_endpoint: None,
            trace_sample_rate: default_sample_rate(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_sample_rate() -> f64 {
    1.0
}

/// Shutdown configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ShutdownConfig {
    /// How long in-flight requests may take to finish after a signal
    #[serde(default = "default_drain_timeout", with = "humantime_serde")]
    pub drain_timeout: Duration,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            drain_timeout: default_drain_timeout(),
        }
    }
}

fn default_drain_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_true() -> bool {
    true
}

/// Humantime serde support module
mod humantime_serde {
    use serde::{self, Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
