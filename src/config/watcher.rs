use anyhow::Result;
use notify::{
    event::ModifyKind, Config as NotifyConfig, Event, EventKind, RecommendedWatcher,
    RecursiveMode, Watcher,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::reference::{MemoryReferenceData, ReferenceSeed};
use crate::telemetry::counters;

/// Seed file change event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedEvent {
    /// Seed file was modified and the dataset replaced
    Reloaded { operators: usize, prefixes: usize },

    /// Seed file was modified but could not be applied
    ReloadFailed(String),
}

/// Hot reload watcher for the in-memory reference seed
pub struct SeedWatcher {
    /// Path to seed file
    path: PathBuf,

    /// File watcher
    watcher: RecommendedWatcher,

    /// Event receiver
    event_rx: mpsc::Receiver<notify::Result<Event>>,

    /// Dataset to refresh
    target: Arc<MemoryReferenceData>,

    /// Debounce duration (editors often write in several steps)
    debounce: Duration,
}

impl SeedWatcher {
    /// Create a new seed watcher
    pub fn new(path: impl AsRef<Path>, target: Arc<MemoryReferenceData>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let (event_tx, event_rx) = mpsc::channel(16);

        let watcher = RecommendedWatcher::new(
            move |res| {
                let _ = event_tx.blocking_send(res);
            },
            NotifyConfig::default().with_poll_interval(Duration::from_secs(1)),
        )?;

        Ok(Self {
            path,
            watcher,
            event_rx,
            target,
            debounce: Duration::from_millis(500),
        })
    }

    /// Override the debounce delay.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Start watching the seed file
    pub fn start(&mut self) -> Result<()> {
        info!(path = %self.path.display(), "starting reference seed watcher");

        self.watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        Ok(())
    }

    /// Re-read the seed file and swap it in.
    pub fn reload(&self) -> SeedEvent {
        let result = ReferenceSeed::load(&self.path).and_then(|seed| {
            let operators = seed.operators.len();
            let prefixes = seed.prefixes.len();
            self.target.replace(seed)?;
            Ok(SeedEvent::Reloaded { operators, prefixes })
        });

        match result {
            Ok(event) => {
                counters::seed_reload(true);
                event
            }
            Err(e) => {
                warn!(error = %e, "reference seed reload failed, keeping current data");
                counters::seed_reload(false);
                SeedEvent::ReloadFailed(e.to_string())
            }
        }
    }

    /// Process events (call in a loop)
    pub async fn process_events(&mut self) -> Option<SeedEvent> {
        let event = self.event_rx.recv().await?;

        match event {
            Ok(event) => {
                if !matches!(
                    event.kind,
                    EventKind::Modify(ModifyKind::Data(_))
                        | EventKind::Modify(ModifyKind::Any)
                        | EventKind::Create(_)
                ) {
                    return None;
                }

                debug!(paths = ?event.paths, "reference seed modified");

                tokio::time::sleep(self.debounce).await;

                // Collapse events queued during the debounce window
                while self.event_rx.try_recv().is_ok() {}

                Some(self.reload())
            }
            Err(e) => {
                error!(error = %e, "file watcher error");
                None
            }
        }
    }

    /// Run the watcher loop
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        loop {
            tokio::select! {
                event = self.process_events() => {
                    if let Some(SeedEvent::Reloaded { operators, prefixes }) = event {
                        info!(operators, prefixes, "reference seed reloaded");
                    }
                }
                _ = shutdown.changed() => {
                    info!("reference seed watcher shutting down");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::{OperatorId, ReferenceData};
    use std::fs;
    use tempfile::tempdir;

    const ONE_OPERATOR: &str = r#"
operators:
  - { id: 1, name: A, smpp_connector_id: smpp-a, status: active, price_per_sms: 0.02, currency: USD, health_score: 80 }
prefixes:
  - { country_code: "998", prefix: "90", operator_id: 1 }
"#;

    const TWO_OPERATORS: &str = r#"
operators:
  - { id: 1, name: A, smpp_connector_id: smpp-a, status: active, price_per_sms: 0.02, currency: USD, health_score: 80 }
  - { id: 2, name: B, smpp_connector_id: smpp-b, status: active, price_per_sms: 0.01, currency: USD, health_score: 80 }
prefixes:
  - { country_code: "998", prefix: "90", operator_id: 1 }
  - { country_code: "998", prefix: "901", operator_id: 2 }
"#;

    #[tokio::test]
    async fn test_reload_applies_new_seed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reference.yaml");
        fs::write(&path, ONE_OPERATOR).unwrap();

        let target = Arc::new(MemoryReferenceData::from_seed(ReferenceSeed::load(&path).unwrap()).unwrap());
        let mut watcher = SeedWatcher::new(&path, target.clone()).unwrap();
        watcher.start().unwrap();

        fs::write(&path, TWO_OPERATORS).unwrap();
        assert_eq!(
            watcher.reload(),
            SeedEvent::Reloaded { operators: 2, prefixes: 2 }
        );
        assert_eq!(
            target.find_longest_matching_prefix("998901234567").await.unwrap(),
            Some(OperatorId(2))
        );
    }

    #[tokio::test]
    async fn test_reload_failure_keeps_data() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reference.yaml");
        fs::write(&path, ONE_OPERATOR).unwrap();

        let target = Arc::new(MemoryReferenceData::from_seed(ReferenceSeed::load(&path).unwrap()).unwrap());
        let watcher = SeedWatcher::new(&path, target.clone()).unwrap();

        fs::write(&path, "operators: [ this is not valid").unwrap();
        assert!(matches!(watcher.reload(), SeedEvent::ReloadFailed(_)));
        assert_eq!(
            target.find_longest_matching_prefix("998901234567").await.unwrap(),
            Some(OperatorId(1))
        );
    }
}
