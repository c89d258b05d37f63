//! Reference data factory for creating provider backends.

use std::sync::Arc;

use crate::config::{MemoryReferenceConfig, PostgresReferenceConfig, ReferenceConfig};

use super::{MemoryReferenceData, PoolSettings, PostgresReferenceData, ReferenceSeed, SharedReference};

/// A provider plus the in-memory dataset behind it, when there is one.
///
/// The memory handle is what the seed watcher refreshes.
#[derive(Clone)]
pub struct ReferenceHandle {
    pub shared: SharedReference,
    pub memory: Option<Arc<MemoryReferenceData>>,
}

impl ReferenceHandle {
    /// Wrap an existing in-memory dataset.
    pub fn memory(data: Arc<MemoryReferenceData>) -> Self {
        Self {
            shared: data.clone() as SharedReference,
            memory: Some(data),
        }
    }

    /// Backend name for logs.
    pub fn name(&self) -> &'static str {
        self.shared.name()
    }
}

impl std::fmt::Debug for ReferenceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferenceHandle")
            .field("backend", &self.shared.name())
            .field("watchable", &self.memory.is_some())
            .finish()
    }
}

impl From<&PostgresReferenceConfig> for PoolSettings {
    fn from(config: &PostgresReferenceConfig) -> Self {
        Self {
            max_connections: config.max_connections,
            min_connections: config.min_connections,
            acquire_timeout: config.acquire_timeout,
        }
    }
}

fn open_memory(config: &MemoryReferenceConfig) -> anyhow::Result<MemoryReferenceData> {
    match config.seed {
        Some(ref path) => {
            let seed = ReferenceSeed::load(path)?;
            tracing::info!(
                path = %path.display(),
                operators = seed.operators.len(),
                prefixes = seed.prefixes.len(),
                "using in-memory reference data"
            );
            Ok(MemoryReferenceData::from_seed(seed)?)
        }
        None => {
            tracing::warn!("no reference seed configured, starting with an empty dataset");
            Ok(MemoryReferenceData::new())
        }
    }
}

/// Create a reference data backend based on configuration.
pub async fn create_reference(config: &ReferenceConfig) -> anyhow::Result<ReferenceHandle> {
    match config {
        ReferenceConfig::Memory(memory) => {
            let data = Arc::new(open_memory(memory)?);
            Ok(ReferenceHandle::memory(data))
        }
        ReferenceConfig::Postgres(pg) => {
            let provider = PostgresReferenceData::connect(&pg.url, &PoolSettings::from(pg)).await?;
            tracing::info!(
                max_connections = pg.max_connections,
                min_connections = pg.min_connections,
                "using postgres reference data"
            );
            Ok(ReferenceHandle {
                shared: Arc::new(provider),
                memory: None,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::OperatorId;
    use std::time::Duration;

    #[tokio::test]
    async fn test_memory_without_seed_is_empty() {
        let handle = create_reference(&ReferenceConfig::default()).await.unwrap();
        assert_eq!(handle.name(), "memory");
        assert!(handle.memory.is_some());
        assert!(handle.shared.list_active_operators(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_memory_with_seed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reference.yaml");
        std::fs::write(
            &path,
            r#"
operators:
  - { id: 4, name: D, smpp_connector_id: smpp-d, status: active, price_per_sms: 0.03, currency: USD, health_score: 70 }
prefixes:
  - { country_code: "+998", prefix: "93", operator_id: 4 }
"#,
        )
        .unwrap();

        let config = ReferenceConfig::Memory(MemoryReferenceConfig {
            seed: Some(path),
            watch: false,
        });
        let handle = create_reference(&config).await.unwrap();
        assert_eq!(
            handle.shared.find_longest_matching_prefix("998931112233").await.unwrap(),
            Some(OperatorId(4))
        );
    }

    #[tokio::test]
    async fn test_missing_seed_fails() {
        let config = ReferenceConfig::Memory(MemoryReferenceConfig {
            seed: Some("/nonexistent/reference.yaml".into()),
            watch: true,
        });
        assert!(create_reference(&config).await.is_err());
    }

    #[test]
    fn test_pool_settings_from_config() {
        let config = PostgresReferenceConfig {
            url: "postgres://localhost/routing".to_string(),
            max_connections: 8,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(2),
        };
        let settings = PoolSettings::from(&config);
        assert_eq!(settings.max_connections, 8);
        assert_eq!(settings.min_connections, 1);
        assert_eq!(settings.acquire_timeout, Duration::from_secs(2));
    }
}
