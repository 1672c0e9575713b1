//! PostgreSQL implementation of SubscriptionStore.
//!
//! One row per subscriber. The `version` column carries the compare-and-swap
//! token: inserts use `ON CONFLICT DO NOTHING`, overwrites are guarded with
//! `WHERE version = $n`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::foundation::{SubscriberId, Timestamp};
use crate::domain::subscription::{Expiry, Plan, SubscriptionRecord};
use crate::ports::{
    PutOutcome, RecordVersion, StoreError, StoredSubscription, SubscriptionStore,
};

/// Schema for the subscriptions table.
pub const SUBSCRIPTIONS_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS subscriptions (
    subscriber_id TEXT PRIMARY KEY,
    plan          TEXT        NOT NULL,
    start_date    TIMESTAMPTZ NOT NULL,
    expiry_date   TIMESTAMPTZ,
    is_active     BOOLEAN     NOT NULL,
    version       BIGINT      NOT NULL,
    updated_at    TIMESTAMPTZ NOT NULL DEFAULT now()
)
"#;

/// PostgreSQL implementation of the SubscriptionStore port.
pub struct PostgresSubscriptionStore {
    pool: PgPool,
}

impl PostgresSubscriptionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the subscriptions table if it does not exist.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(SUBSCRIPTIONS_SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;
        Ok(())
    }
}

/// Database row representation of a subscription.
#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    plan: String,
    start_date: DateTime<Utc>,
    expiry_date: Option<DateTime<Utc>>,
    is_active: bool,
    version: i64,
}

impl TryFrom<SubscriptionRow> for StoredSubscription {
    type Error = StoreError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        let plan: Plan = row
            .plan
            .parse()
            .map_err(|_| StoreError::Deserialization(format!("Invalid plan value: {}", row.plan)))?;
        let version = u64::try_from(row.version).map_err(|_| {
            StoreError::Deserialization(format!("Invalid version value: {}", row.version))
        })?;

        let record = SubscriptionRecord::from_parts(
            plan,
            Timestamp::from_datetime(row.start_date),
            Expiry::from(row.expiry_date.map(Timestamp::from_datetime)),
            row.is_active,
        );

        Ok(StoredSubscription {
            record,
            version: RecordVersion::new(version),
        })
    }
}

fn unavailable(e: sqlx::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

fn version_param(version: RecordVersion) -> Result<i64, StoreError> {
    i64::try_from(version.value())
        .map_err(|_| StoreError::Serialization(format!("version {} out of range", version)))
}

#[async_trait]
impl SubscriptionStore for PostgresSubscriptionStore {
    async fn get(&self, scope: &SubscriberId) -> Result<Option<StoredSubscription>, StoreError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(
            r#"
            SELECT plan, start_date, expiry_date, is_active, version
            FROM subscriptions
            WHERE subscriber_id = $1
            "#,
        )
        .bind(scope.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        row.map(StoredSubscription::try_from).transpose()
    }

    async fn put(
        &self,
        scope: &SubscriberId,
        record: &SubscriptionRecord,
        expected: Option<RecordVersion>,
    ) -> Result<PutOutcome, StoreError> {
        let next = RecordVersion::after(expected);
        let expiry = record.expiry_date().at().map(|ts| *ts.as_datetime());

        let result = match expected {
            None => sqlx::query(
                r#"
                INSERT INTO subscriptions (
                    subscriber_id, plan, start_date, expiry_date, is_active, version, updated_at
                ) VALUES ($1, $2, $3, $4, $5, $6, now())
                ON CONFLICT (subscriber_id) DO NOTHING
                "#,
            )
            .bind(scope.as_str())
            .bind(record.plan().as_str())
            .bind(*record.start_date().as_datetime())
            .bind(expiry)
            .bind(record.stored_is_active())
            .bind(version_param(next)?)
            .execute(&self.pool)
            .await
            .map_err(unavailable)?,

            Some(current) => sqlx::query(
                r#"
                UPDATE subscriptions SET
                    plan = $2,
                    start_date = $3,
                    expiry_date = $4,
                    is_active = $5,
                    version = $6,
                    updated_at = now()
                WHERE subscriber_id = $1 AND version = $7
                "#,
            )
            .bind(scope.as_str())
            .bind(record.plan().as_str())
            .bind(*record.start_date().as_datetime())
            .bind(expiry)
            .bind(record.stored_is_active())
            .bind(version_param(next)?)
            .bind(version_param(current)?)
            .execute(&self.pool)
            .await
            .map_err(unavailable)?,
        };

        if result.rows_affected() == 0 {
            return Ok(PutOutcome::Conflict);
        }
        Ok(PutOutcome::Written(next))
    }

    async fn remove(&self, scope: &SubscriberId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM subscriptions WHERE subscriber_id = $1")
            .bind(scope.as_str())
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;
        Ok(())
    }
}
