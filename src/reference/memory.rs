//! In-memory reference data.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tracing::info;

use crate::router::PrefixTable;

use super::seed::{ReferenceSeed, SeedError};
use super::types::{Operator, OperatorId, PrefixRule};
use super::{ProviderError, ReferenceData};

/// Immutable view of the reference data at one point in time.
#[derive(Debug, Default)]
struct Snapshot {
    operators: HashMap<OperatorId, Operator>,
    rules: Vec<PrefixRule>,
    table: PrefixTable,
}

impl Snapshot {
    fn from_seed(seed: ReferenceSeed) -> Self {
        let operators: HashMap<OperatorId, Operator> =
            seed.operators.into_iter().map(|op| (op.id, op)).collect();

        let table = PrefixTable::build(&seed.prefixes, |id| operators.get(&id).map(|op| op.priority));

        Self {
            operators,
            rules: seed.prefixes,
            table,
        }
    }
}

/// Reference data held in process memory.
///
/// Readers take a cheap snapshot clone; [`replace`](Self::replace) swaps the
/// whole dataset at once so a request never observes a half-applied reload.
#[derive(Debug, Default)]
pub struct MemoryReferenceData {
    snapshot: RwLock<Arc<Snapshot>>,
}

impl MemoryReferenceData {
    /// Create an empty dataset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from an already-validated seed.
    pub fn from_seed(seed: ReferenceSeed) -> Result<Self, SeedError> {
        seed.validate()?;
        Ok(Self {
            snapshot: RwLock::new(Arc::new(Snapshot::from_seed(seed))),
        })
    }

    /// Swap in a new dataset.
    pub fn replace(&self, seed: ReferenceSeed) -> Result<(), SeedError> {
        seed.validate()?;

        let snapshot = Arc::new(Snapshot::from_seed(seed));
        let operators = snapshot.operators.len();
        let rules = snapshot.table.len();

        let mut guard = self
            .snapshot
            .write()
            .map_err(|_| SeedError::Invalid("reference snapshot lock poisoned".to_string()))?;
        *guard = snapshot;

        info!(operators, rules, "reference data replaced");
        Ok(())
    }

    /// Current operators and rules as a seed.
    pub fn export(&self) -> Result<ReferenceSeed, ProviderError> {
        let snapshot = self.current()?;
        let mut operators: Vec<Operator> = snapshot.operators.values().cloned().collect();
        operators.sort_by_key(|op| op.id);

        Ok(ReferenceSeed {
            operators,
            prefixes: snapshot.rules.clone(),
        })
    }

    fn current(&self) -> Result<Arc<Snapshot>, ProviderError> {
        self.snapshot
            .read()
            .map(|guard| Arc::clone(&*guard))
            .map_err(|_| ProviderError::Unavailable("reference snapshot lock poisoned".to_string()))
    }
}

#[async_trait]
impl ReferenceData for MemoryReferenceData {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn find_operator(&self, id: OperatorId) -> Result<Option<Operator>, ProviderError> {
        Ok(self.current()?.operators.get(&id).cloned())
    }

    async fn list_active_operators(
        &self,
        excluding: Option<OperatorId>,
    ) -> Result<Vec<Operator>, ProviderError> {
        let snapshot = self.current()?;
        Ok(snapshot
            .operators
            .values()
            .filter(|op| op.is_active() && Some(op.id) != excluding)
            .cloned()
            .collect())
    }

    async fn find_longest_matching_prefix(
        &self,
        normalized: &str,
    ) -> Result<Option<OperatorId>, ProviderError> {
        let snapshot = self.current()?;
        let operators = &snapshot.operators;

        Ok(snapshot
            .table
            .longest_match(normalized, |id| operators.get(&id).is_some_and(Operator::is_active))
            .map(|entry| entry.operator_id))
    }

    async fn ping(&self) -> Result<(), ProviderError> {
        self.current().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::OperatorStatus;
    use rust_decimal::Decimal;

    fn operator(id: i64, status: OperatorStatus) -> Operator {
        Operator {
            id: OperatorId(id),
            name: format!("op-{}", id),
            country: "UZ".to_string(),
            mcc: "434".to_string(),
            mnc: format!("{:02}", id),
            connector_id: format!("smpp-{}", id),
            status,
            price_per_sms: Decimal::new(id, 2),
            currency: "USD".to_string(),
            health_score: 50,
            priority: 0,
        }
    }

    fn rule(prefix: &str, op: i64) -> PrefixRule {
        PrefixRule {
            country_code: "998".to_string(),
            prefix: prefix.to_string(),
            operator_id: OperatorId(op),
            mcc: String::new(),
            mnc: String::new(),
        }
    }

    fn seed() -> ReferenceSeed {
        ReferenceSeed {
            operators: vec![
                operator(1, OperatorStatus::Active),
                operator(2, OperatorStatus::Active),
                operator(3, OperatorStatus::Suspended),
            ],
            prefixes: vec![rule("9", 1), rule("90", 2), rule("93", 3)],
        }
    }

    #[tokio::test]
    async fn test_find_operator_any_status() {
        let data = MemoryReferenceData::from_seed(seed()).unwrap();
        let op = data.find_operator(OperatorId(3)).await.unwrap().unwrap();
        assert_eq!(op.status, OperatorStatus::Suspended);
        assert!(data.find_operator(OperatorId(42)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_active_excluding() {
        let data = MemoryReferenceData::from_seed(seed()).unwrap();

        let mut all: Vec<i64> = data
            .list_active_operators(None)
            .await
            .unwrap()
            .iter()
            .map(|op| op.id.0)
            .collect();
        all.sort();
        assert_eq!(all, vec![1, 2]);

        let others = data.list_active_operators(Some(OperatorId(1))).await.unwrap();
        assert_eq!(others.len(), 1);
        assert_eq!(others[0].id, OperatorId(2));
    }

    #[tokio::test]
    async fn test_longest_match_skips_inactive_owner() {
        let data = MemoryReferenceData::from_seed(seed()).unwrap();

        assert_eq!(
            data.find_longest_matching_prefix("998901234567").await.unwrap(),
            Some(OperatorId(2))
        );
        // 99893 belongs to a suspended operator; the broader 9989 rule applies
        assert_eq!(
            data.find_longest_matching_prefix("998931234567").await.unwrap(),
            Some(OperatorId(1))
        );
        assert_eq!(
            data.find_longest_matching_prefix("258841234567").await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_replace_swaps_dataset() {
        let data = MemoryReferenceData::from_seed(seed()).unwrap();

        let mut next = seed();
        next.operators[1].status = OperatorStatus::Suspended;
        data.replace(next).unwrap();

        assert_eq!(
            data.find_longest_matching_prefix("998901234567").await.unwrap(),
            Some(OperatorId(1))
        );
    }

    #[tokio::test]
    async fn test_replace_rejects_invalid_and_keeps_current() {
        let data = MemoryReferenceData::from_seed(seed()).unwrap();

        let mut bad = seed();
        bad.prefixes.push(rule("95", 99));
        assert!(data.replace(bad).is_err());

        assert_eq!(data.export().unwrap(), seed());
    }

    #[tokio::test]
    async fn test_empty_dataset() {
        let data = MemoryReferenceData::new();
        assert!(data.ping().await.is_ok());
        assert!(data.list_active_operators(None).await.unwrap().is_empty());
        assert_eq!(data.find_longest_matching_prefix("998").await.unwrap(), None);
    }
}
