//! PostgreSQL reference data over a sqlx connection pool.
//!
//! Expects the `operators` and `mcc_mnc_prefixes` tables of the routing
//! schema. Numeric columns are cast in SQL so `price_per_sms` may be either
//! `numeric` or `double precision`.

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info};

use super::types::{Operator, OperatorId, OperatorStatus};
use super::{ProviderError, ReferenceData};

const OPERATOR_COLUMNS: &str = "id::int8 AS id, name, COALESCE(country, '') AS country, \
     COALESCE(mcc, '') AS mcc, COALESCE(mnc, '') AS mnc, smpp_connector_id, \
     status, price_per_sms::numeric AS price_per_sms, currency, \
     health_score::int4 AS health_score, COALESCE(priority, 0)::int4 AS priority";

const LONGEST_PREFIX_QUERY: &str = "\
    SELECT p.operator_id::int8 \
    FROM mcc_mnc_prefixes p \
    JOIN operators o ON o.id = p.operator_id \
    WHERE o.status = 'active' \
      AND $1 LIKE REPLACE(p.country_code, '+', '') || p.prefix || '%' \
    ORDER BY LENGTH(REPLACE(p.country_code, '+', '') || p.prefix) DESC, \
             o.priority ASC, o.id ASC \
    LIMIT 1";

/// Pool settings.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 25,
            min_connections: 5,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OperatorRow {
    id: i64,
    name: String,
    country: String,
    mcc: String,
    mnc: String,
    smpp_connector_id: String,
    status: String,
    price_per_sms: Decimal,
    currency: String,
    health_score: i32,
    priority: i32,
}

impl TryFrom<OperatorRow> for Operator {
    type Error = ProviderError;

    fn try_from(row: OperatorRow) -> Result<Self, Self::Error> {
        let status: OperatorStatus = row
            .status
            .parse()
            .map_err(|e| ProviderError::InvalidData(format!("operator {}: {}", row.id, e)))?;

        let health_score = u8::try_from(row.health_score)
            .ok()
            .filter(|h| *h <= 100)
            .ok_or_else(|| {
                ProviderError::InvalidData(format!(
                    "operator {}: health score {} is outside 0-100",
                    row.id, row.health_score
                ))
            })?;

        if row.price_per_sms.is_sign_negative() {
            return Err(ProviderError::InvalidData(format!(
                "operator {}: negative price {}",
                row.id, row.price_per_sms
            )));
        }

        Ok(Operator {
            id: OperatorId(row.id),
            name: row.name,
            country: row.country,
            mcc: row.mcc,
            mnc: row.mnc,
            connector_id: row.smpp_connector_id,
            status,
            price_per_sms: row.price_per_sms,
            currency: row.currency,
            health_score,
            priority: row.priority,
        })
    }
}

/// Reference data read from PostgreSQL.
#[derive(Debug, Clone)]
pub struct PostgresReferenceData {
    pool: PgPool,
}

impl PostgresReferenceData {
    /// Connect a new pool.
    pub async fn connect(url: &str, settings: &PoolSettings) -> Result<Self, ProviderError> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .acquire_timeout(settings.acquire_timeout)
            .connect(url)
            .await?;

        info!(
            max_connections = settings.max_connections,
            min_connections = settings.min_connections,
            "reference database connection established"
        );

        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Close the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl ReferenceData for PostgresReferenceData {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn find_operator(&self, id: OperatorId) -> Result<Option<Operator>, ProviderError> {
        let query = format!("SELECT {} FROM operators WHERE id = $1", OPERATOR_COLUMNS);
        let row: Option<OperatorRow> = sqlx::query_as(&query)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Operator::try_from).transpose()
    }

    async fn list_active_operators(
        &self,
        excluding: Option<OperatorId>,
    ) -> Result<Vec<Operator>, ProviderError> {
        let query = format!(
            "SELECT {} FROM operators WHERE status = 'active' AND ($1::int8 IS NULL OR id <> $1)",
            OPERATOR_COLUMNS
        );
        let rows: Vec<OperatorRow> = sqlx::query_as(&query)
            .bind(excluding.map(|id| id.0))
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "loaded active operators");
        rows.into_iter().map(Operator::try_from).collect()
    }

    async fn find_longest_matching_prefix(
        &self,
        normalized: &str,
    ) -> Result<Option<OperatorId>, ProviderError> {
        let id: Option<i64> = sqlx::query_scalar(LONGEST_PREFIX_QUERY)
            .bind(normalized)
            .fetch_optional(&self.pool)
            .await?;

        Ok(id.map(OperatorId))
    }

    async fn ping(&self) -> Result<(), ProviderError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> OperatorRow {
        OperatorRow {
            id: 3,
            name: "Mobiuz".to_string(),
            country: "UZ".to_string(),
            mcc: "434".to_string(),
            mnc: "07".to_string(),
            smpp_connector_id: "smpp-mobiuz".to_string(),
            status: "active".to_string(),
            price_per_sms: Decimal::new(25, 3),
            currency: "USD".to_string(),
            health_score: 88,
            priority: 2,
        }
    }

    #[test]
    fn test_row_conversion() {
        let op = Operator::try_from(row()).unwrap();
        assert_eq!(op.id, OperatorId(3));
        assert_eq!(op.connector_id, "smpp-mobiuz");
        assert_eq!(op.status, OperatorStatus::Active);
        assert_eq!(op.price_per_sms, Decimal::new(25, 3));
        assert_eq!(op.health_score, 88);
    }

    #[test]
    fn test_row_bad_status() {
        let bad = OperatorRow {
            status: "archived".to_string(),
            ..row()
        };
        assert!(matches!(
            Operator::try_from(bad),
            Err(ProviderError::InvalidData(_))
        ));
    }

    #[test]
    fn test_row_health_out_of_range() {
        for health_score in [-1, 101, 1000] {
            let bad = OperatorRow { health_score, ..row() };
            assert!(Operator::try_from(bad).is_err());
        }
    }

    #[test]
    fn test_row_negative_price() {
        let bad = OperatorRow {
            price_per_sms: Decimal::new(-1, 2),
            ..row()
        };
        assert!(Operator::try_from(bad).is_err());
    }

    #[test]
    fn test_pool_defaults() {
        let settings = PoolSettings::default();
        assert_eq!(settings.max_connections, 25);
        assert_eq!(settings.min_connections, 5);
    }
}
