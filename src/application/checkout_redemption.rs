//! CheckoutRedeemer - turns a verified checkout session into at most one
//! activation.
//!
//! The session id is recorded in the payment ledger before the record is
//! written. A session seen before never starts another billing period: the
//! subscriber who redeemed it gets their current status back, anyone else is
//! refused. If activation fails after recording, the session is released so
//! the customer can retry.

use std::sync::Arc;

use crate::domain::foundation::SubscriberId;
use crate::domain::subscription::{PaidPlan, SubscriptionError, SubscriptionStatus};
use crate::ports::{PaymentLedger, PaymentRedemption, RedeemOutcome};

use super::SubscriptionLifecycle;

/// Outcome of redeeming a checkout session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redemption {
    /// The session was new and the plan is now active.
    Activated(SubscriptionStatus),
    /// The same subscriber redeemed this session before; nothing changed.
    AlreadyRedeemed(SubscriptionStatus),
}

impl Redemption {
    pub fn status(&self) -> &SubscriptionStatus {
        match self {
            Redemption::Activated(status) | Redemption::AlreadyRedeemed(status) => status,
        }
    }

    pub fn into_status(self) -> SubscriptionStatus {
        match self {
            Redemption::Activated(status) | Redemption::AlreadyRedeemed(status) => status,
        }
    }

    pub fn is_repeat(&self) -> bool {
        matches!(self, Redemption::AlreadyRedeemed(_))
    }
}

/// Redeems paid checkout sessions exactly once.
pub struct CheckoutRedeemer {
    lifecycle: Arc<SubscriptionLifecycle>,
    ledger: Arc<dyn PaymentLedger>,
}

impl CheckoutRedeemer {
    pub fn new(lifecycle: Arc<SubscriptionLifecycle>, ledger: Arc<dyn PaymentLedger>) -> Self {
        Self { lifecycle, ledger }
    }

    /// Activates `plan` for `scope` unless `session_id` was redeemed before.
    ///
    /// The caller must already have confirmed that the session is paid, for
    /// `plan`, and bound to `scope`.
    ///
    /// # Errors
    ///
    /// - `PaymentNotVerified` when another subscriber redeemed the session
    /// - `PersistenceUnavailable` when the ledger or store fails
    /// - anything `SubscriptionLifecycle::activate_paid` returns
    pub async fn redeem(
        &self,
        scope: &SubscriberId,
        plan: PaidPlan,
        session_id: &str,
    ) -> Result<Redemption, SubscriptionError> {
        let redemption = PaymentRedemption {
            session_id: session_id.to_string(),
            subscriber_id: scope.clone(),
            plan,
            redeemed_at: self.lifecycle.now()?,
        };

        match self.ledger.record(&redemption).await? {
            RedeemOutcome::AlreadyRedeemed(earlier) if earlier.subscriber_id != *scope => {
                tracing::warn!(
                    subscriber_id = %scope,
                    session_id,
                    "Checkout session already redeemed by another subscriber"
                );
                Err(SubscriptionError::payment_not_verified(format!(
                    "session {} was already redeemed",
                    session_id
                )))
            }
            RedeemOutcome::AlreadyRedeemed(earlier) => {
                tracing::info!(
                    subscriber_id = %scope,
                    session_id,
                    redeemed_at = %earlier.redeemed_at,
                    "Checkout session already redeemed, keeping current subscription"
                );
                let status = self.lifecycle.get_status(scope).await?;
                Ok(Redemption::AlreadyRedeemed(status))
            }
            RedeemOutcome::Recorded => match self.lifecycle.activate_paid(scope, plan).await {
                Ok(status) => Ok(Redemption::Activated(status)),
                Err(err) => {
                    if let Err(release_err) = self.ledger.release(session_id).await {
                        tracing::error!(
                            subscriber_id = %scope,
                            session_id,
                            error = %release_err,
                            "Failed to release checkout session after activation error"
                        );
                    }
                    Err(err)
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::clock::ManualClock;
    use crate::adapters::storage::{InMemoryPaymentLedger, InMemorySubscriptionStore};
    use crate::application::LifecyclePolicy;
    use crate::domain::foundation::Timestamp;
    use crate::domain::subscription::{DaysRemaining, Plan};
    use crate::ports::SubscriptionStore;

    struct Fixture {
        store: InMemorySubscriptionStore,
        ledger: InMemoryPaymentLedger,
        clock: ManualClock,
        redeemer: CheckoutRedeemer,
    }

    fn fixture() -> Fixture {
        let store = InMemorySubscriptionStore::new();
        let ledger = InMemoryPaymentLedger::new();
        let clock = ManualClock::new(Timestamp::from_unix_secs(1_705_276_800).unwrap());
        let lifecycle = Arc::new(SubscriptionLifecycle::new(
            Arc::new(store.clone()),
            Arc::new(clock.clone()),
            LifecyclePolicy::default(),
        ));
        let redeemer = CheckoutRedeemer::new(lifecycle, Arc::new(ledger.clone()));
        Fixture {
            store,
            ledger,
            clock,
            redeemer,
        }
    }

    fn user(id: &str) -> SubscriberId {
        SubscriberId::new(id).unwrap()
    }

    #[tokio::test]
    async fn first_redemption_activates() {
        let f = fixture();

        let outcome = f
            .redeemer
            .redeem(&user("alice"), PaidPlan::Monthly, "cs_1")
            .await
            .unwrap();

        assert!(!outcome.is_repeat());
        assert_eq!(outcome.status().plan, Plan::Monthly);
        assert_eq!(f.ledger.len().await, 1);
    }

    #[tokio::test]
    async fn replay_after_29_days_does_not_restart_the_period() {
        let f = fixture();
        f.redeemer
            .redeem(&user("alice"), PaidPlan::Monthly, "cs_1")
            .await
            .unwrap();

        f.clock.advance_days(29);
        let outcome = f
            .redeemer
            .redeem(&user("alice"), PaidPlan::Monthly, "cs_1")
            .await
            .unwrap();

        assert!(outcome.is_repeat());
        assert_eq!(outcome.status().days_remaining, DaysRemaining::Days(1));
    }

    #[tokio::test]
    async fn second_subscriber_is_refused() {
        let f = fixture();
        f.redeemer
            .redeem(&user("alice"), PaidPlan::Lifetime, "cs_1")
            .await
            .unwrap();

        let err = f
            .redeemer
            .redeem(&user("mallory"), PaidPlan::Lifetime, "cs_1")
            .await
            .unwrap_err();

        assert!(matches!(err, SubscriptionError::PaymentNotVerified(_)));
        assert!(f.store.get(&user("mallory")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failed_activation_releases_the_session() {
        let f = fixture();
        f.store.force_conflicts(10);

        let err = f
            .redeemer
            .redeem(&user("alice"), PaidPlan::Yearly, "cs_1")
            .await
            .unwrap_err();
        assert!(matches!(err, SubscriptionError::WriteConflict { .. }));
        assert!(f.ledger.is_empty().await);

        f.store.force_conflicts(0);
        let outcome = f
            .redeemer
            .redeem(&user("alice"), PaidPlan::Yearly, "cs_1")
            .await
            .unwrap();
        assert!(!outcome.is_repeat());
    }

    #[tokio::test]
    async fn ledger_outage_blocks_activation() {
        let f = fixture();
        f.ledger.set_unavailable(true);

        let err = f
            .redeemer
            .redeem(&user("alice"), PaidPlan::Monthly, "cs_1")
            .await
            .unwrap_err();

        assert!(matches!(err, SubscriptionError::PersistenceUnavailable(_)));
        assert!(f.store.get(&user("alice")).await.unwrap().is_none());
    }
}
