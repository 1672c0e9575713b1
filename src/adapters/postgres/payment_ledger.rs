//! PostgreSQL implementation of PaymentLedger.
//!
//! The session id is the primary key, so `ON CONFLICT DO NOTHING` makes the
//! first writer win. A losing insert reads back the winning row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::foundation::{SubscriberId, Timestamp};
use crate::domain::subscription::PaidPlan;
use crate::ports::{PaymentLedger, PaymentRedemption, RedeemOutcome, StoreError};

/// Schema for the checkout redemptions table.
pub const CHECKOUT_REDEMPTIONS_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS checkout_redemptions (
    session_id    TEXT PRIMARY KEY,
    subscriber_id TEXT        NOT NULL,
    plan          TEXT        NOT NULL,
    redeemed_at   TIMESTAMPTZ NOT NULL
)
"#;

/// PostgreSQL implementation of the PaymentLedger port.
pub struct PostgresPaymentLedger {
    pool: PgPool,
}

impl PostgresPaymentLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the checkout redemptions table if it does not exist.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(CHECKOUT_REDEMPTIONS_SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;
        Ok(())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RedemptionRow {
    session_id: String,
    subscriber_id: String,
    plan: String,
    redeemed_at: DateTime<Utc>,
}

impl TryFrom<RedemptionRow> for PaymentRedemption {
    type Error = StoreError;

    fn try_from(row: RedemptionRow) -> Result<Self, Self::Error> {
        let plan: PaidPlan = row
            .plan
            .parse()
            .map_err(|_| StoreError::Deserialization(format!("Invalid plan value: {}", row.plan)))?;
        let subscriber_id = SubscriberId::new(row.subscriber_id)
            .map_err(|e| StoreError::Deserialization(e.to_string()))?;

        Ok(PaymentRedemption {
            session_id: row.session_id,
            subscriber_id,
            plan,
            redeemed_at: Timestamp::from_datetime(row.redeemed_at),
        })
    }
}

fn unavailable(e: sqlx::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

#[async_trait]
impl PaymentLedger for PostgresPaymentLedger {
    async fn record(&self, redemption: &PaymentRedemption) -> Result<RedeemOutcome, StoreError> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO checkout_redemptions (session_id, subscriber_id, plan, redeemed_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (session_id) DO NOTHING
            "#,
        )
        .bind(&redemption.session_id)
        .bind(redemption.subscriber_id.as_str())
        .bind(redemption.plan.plan().as_str())
        .bind(*redemption.redeemed_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        if inserted.rows_affected() > 0 {
            return Ok(RedeemOutcome::Recorded);
        }

        let row: RedemptionRow = sqlx::query_as(
            r#"
            SELECT session_id, subscriber_id, plan, redeemed_at
            FROM checkout_redemptions
            WHERE session_id = $1
            "#,
        )
        .bind(&redemption.session_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unavailable)?;

        PaymentRedemption::try_from(row).map(RedeemOutcome::AlreadyRedeemed)
    }

    async fn release(&self, session_id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM checkout_redemptions WHERE session_id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(plan: &str, subscriber: &str) -> RedemptionRow {
        RedemptionRow {
            session_id: "cs_1".to_string(),
            subscriber_id: subscriber.to_string(),
            plan: plan.to_string(),
            redeemed_at: DateTime::from_timestamp(1_705_276_800, 0).unwrap(),
        }
    }

    #[test]
    fn row_maps_to_redemption() {
        let redemption = PaymentRedemption::try_from(row("yearly", "alice")).unwrap();
        assert_eq!(redemption.plan, PaidPlan::Yearly);
        assert_eq!(redemption.subscriber_id.as_str(), "alice");
        assert_eq!(redemption.redeemed_at.as_unix_secs(), 1_705_276_800);
    }

    #[test]
    fn free_trial_row_is_rejected() {
        assert!(matches!(
            PaymentRedemption::try_from(row("free_trial", "alice")),
            Err(StoreError::Deserialization(_))
        ));
    }

    #[test]
    fn empty_subscriber_row_is_rejected() {
        assert!(matches!(
            PaymentRedemption::try_from(row("monthly", "")),
            Err(StoreError::Deserialization(_))
        ));
    }

    #[test]
    fn schema_keys_on_session_id() {
        assert!(CHECKOUT_REDEMPTIONS_SCHEMA.contains("session_id    TEXT PRIMARY KEY"));
    }
}
