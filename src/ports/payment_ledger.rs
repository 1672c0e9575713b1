//! Payment ledger port.
//!
//! Remembers which checkout sessions have already been turned into an
//! activation. A paid session is redeemable exactly once; both the
//! activation endpoint and the Stripe webhook go through this ledger, so a
//! redelivered webhook or a replayed session id cannot restart a billing
//! period.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{SubscriberId, Timestamp};
use crate::domain::subscription::PaidPlan;

use super::StoreError;

/// One redeemed checkout session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRedemption {
    /// Gateway checkout session id (`cs_...`).
    pub session_id: String,
    pub subscriber_id: SubscriberId,
    pub plan: PaidPlan,
    pub redeemed_at: Timestamp,
}

/// Result of recording a redemption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedeemOutcome {
    /// First time this session was seen; the caller may activate.
    Recorded,
    /// The session was redeemed before. Carries the earlier redemption.
    AlreadyRedeemed(PaymentRedemption),
}

/// Port for the set of redeemed checkout sessions.
///
/// Implementations must make `record` insert-if-absent atomically (primary
/// key, `SET NX`, or a lock) so two concurrent redemptions of one session
/// cannot both see `Recorded`.
#[async_trait]
pub trait PaymentLedger: Send + Sync {
    /// Records `redemption` unless its session id is already present.
    async fn record(&self, redemption: &PaymentRedemption) -> Result<RedeemOutcome, StoreError>;

    /// Forgets a session id. Used only to roll back a redemption whose
    /// activation failed, so the customer can retry.
    async fn release(&self, session_id: &str) -> Result<(), StoreError>;
}
