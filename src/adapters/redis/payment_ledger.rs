//! Redis-backed payment ledger.
//!
//! One string key per redeemed session holding the redemption as JSON.
//! `SET NX` makes the first writer win across instances.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::ports::{PaymentLedger, PaymentRedemption, RedeemOutcome, StoreError};

/// Redis-backed set of redeemed checkout sessions.
#[derive(Clone)]
pub struct RedisPaymentLedger {
    conn: MultiplexedConnection,
    key_prefix: String,
}

impl RedisPaymentLedger {
    pub fn new(conn: MultiplexedConnection, key_prefix: impl Into<String>) -> Self {
        Self {
            conn,
            key_prefix: key_prefix.into(),
        }
    }

    fn key_for(&self, session_id: &str) -> String {
        redemption_key(&self.key_prefix, session_id)
    }
}

fn redemption_key(prefix: &str, session_id: &str) -> String {
    format!("{}:{}", prefix, session_id)
}

fn unavailable(e: redis::RedisError) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

fn decode(raw: &str) -> Result<PaymentRedemption, StoreError> {
    serde_json::from_str(raw).map_err(|e| StoreError::Deserialization(e.to_string()))
}

#[async_trait]
impl PaymentLedger for RedisPaymentLedger {
    async fn record(&self, redemption: &PaymentRedemption) -> Result<RedeemOutcome, StoreError> {
        let json = serde_json::to_string(redemption)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let key = self.key_for(&redemption.session_id);
        let mut conn = self.conn.clone();

        let set: Option<String> = redis::cmd("SET")
            .arg(&key)
            .arg(json)
            .arg("NX")
            .query_async(&mut conn)
            .await
            .map_err(unavailable)?;
        if set.is_some() {
            return Ok(RedeemOutcome::Recorded);
        }

        let existing: Option<String> = conn.get(&key).await.map_err(unavailable)?;
        match existing {
            Some(raw) => decode(&raw).map(RedeemOutcome::AlreadyRedeemed),
            // Released between our SET and GET.
            None => Err(StoreError::Unavailable(format!(
                "redemption {} changed while being recorded",
                redemption.session_id
            ))),
        }
    }

    async fn release(&self, session_id: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(self.key_for(session_id))
            .await
            .map_err(unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{SubscriberId, Timestamp};
    use crate::domain::subscription::PaidPlan;

    #[test]
    fn key_includes_prefix_and_session() {
        assert_eq!(
            redemption_key("research_pilot-redemption", "cs_live_1"),
            "research_pilot-redemption:cs_live_1"
        );
    }

    #[test]
    fn decode_reads_stored_json() {
        let redemption = PaymentRedemption {
            session_id: "cs_live_1".to_string(),
            subscriber_id: SubscriberId::new("alice").unwrap(),
            plan: PaidPlan::Monthly,
            redeemed_at: Timestamp::from_unix_secs(1_705_276_800).unwrap(),
        };
        let json = serde_json::to_string(&redemption).unwrap();
        assert_eq!(decode(&json).unwrap(), redemption);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(
            decode("not json"),
            Err(StoreError::Deserialization(_))
        ));
    }
}
