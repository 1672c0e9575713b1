//! ActivateSubscriptionHandler - Command handler for switching to a paid plan.
//!
//! When payment verification is required, the caller must present a
//! checkout session that the gateway reports as paid for the same plan and
//! that was created for the same subscriber. Each session activates once;
//! presenting it again returns the current status unchanged.

use std::sync::Arc;

use crate::application::{CheckoutRedeemer, Redemption, SubscriptionLifecycle};
use crate::domain::foundation::SubscriberId;
use crate::domain::subscription::{PaidPlan, Plan, SubscriptionError, SubscriptionStatus};
use crate::ports::{PaymentLedger, PaymentVerifier};

/// Command to activate a paid plan.
#[derive(Debug, Clone)]
pub struct ActivateSubscriptionCommand {
    pub subscriber_id: SubscriberId,
    pub plan: Plan,
    /// Checkout session that paid for `plan`.
    pub checkout_session_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ActivateSubscriptionResult {
    pub status: SubscriptionStatus,
    /// True when the session had already been redeemed by this subscriber
    /// and nothing was written.
    pub already_redeemed: bool,
}

/// Handler for plan activation.
pub struct ActivateSubscriptionHandler {
    lifecycle: Arc<SubscriptionLifecycle>,
    redeemer: CheckoutRedeemer,
    payment_verifier: Option<Arc<dyn PaymentVerifier>>,
    require_payment_verification: bool,
}

impl ActivateSubscriptionHandler {
    pub fn new(
        lifecycle: Arc<SubscriptionLifecycle>,
        payment_ledger: Arc<dyn PaymentLedger>,
        payment_verifier: Option<Arc<dyn PaymentVerifier>>,
        require_payment_verification: bool,
    ) -> Self {
        Self {
            redeemer: CheckoutRedeemer::new(lifecycle.clone(), payment_ledger),
            lifecycle,
            payment_verifier,
            require_payment_verification,
        }
    }

    pub async fn handle(
        &self,
        cmd: ActivateSubscriptionCommand,
    ) -> Result<ActivateSubscriptionResult, SubscriptionError> {
        let plan = PaidPlan::try_from(cmd.plan)?;

        if !self.require_payment_verification {
            tracing::warn!(
                subscriber_id = %cmd.subscriber_id,
                plan = %plan,
                "Activating without payment verification"
            );
            let status = self.lifecycle.activate_paid(&cmd.subscriber_id, plan).await?;
            return Ok(ActivateSubscriptionResult {
                status,
                already_redeemed: false,
            });
        }

        let session_id = self
            .verify_payment(&cmd.subscriber_id, plan, cmd.checkout_session_id.as_deref())
            .await?;

        let redemption = self
            .redeemer
            .redeem(&cmd.subscriber_id, plan, &session_id)
            .await?;
        let already_redeemed = matches!(redemption, Redemption::AlreadyRedeemed(_));
        Ok(ActivateSubscriptionResult {
            status: redemption.into_status(),
            already_redeemed,
        })
    }

    /// Confirms the session with the gateway and returns its trimmed id.
    async fn verify_payment(
        &self,
        subscriber_id: &SubscriberId,
        plan: PaidPlan,
        checkout_session_id: Option<&str>,
    ) -> Result<String, SubscriptionError> {
        let session_id = checkout_session_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| SubscriptionError::payment_not_verified("checkout_session_id is required"))?;

        let verifier = self.payment_verifier.as_ref().ok_or_else(|| {
            SubscriptionError::payment_provider("payment gateway is not configured")
        })?;

        let verification = verifier.verify_checkout_session(session_id).await?;
        if let Err(err) = verification.confirm_for(subscriber_id, plan) {
            tracing::warn!(
                subscriber_id = %subscriber_id,
                session_id,
                error = %err,
                "Checkout session rejected"
            );
            return Err(err);
        }

        Ok(session_id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::clock::ManualClock;
    use crate::adapters::storage::{InMemoryPaymentLedger, InMemorySubscriptionStore};
    use crate::adapters::stripe::MockPaymentVerifier;
    use crate::application::LifecyclePolicy;
    use crate::domain::foundation::Timestamp;
    use crate::domain::subscription::{CheckoutVerification, DaysRemaining};
    use crate::ports::PaymentError;

    // ════════════════════════════════════════════════════════════════════════════
    // Test Helpers
    // ════════════════════════════════════════════════════════════════════════════

    fn start() -> Timestamp {
        Timestamp::from_unix_secs(1_705_276_800).unwrap()
    }

    fn lifecycle_with(clock: &ManualClock) -> Arc<SubscriptionLifecycle> {
        Arc::new(SubscriptionLifecycle::new(
            Arc::new(InMemorySubscriptionStore::new()),
            Arc::new(clock.clone()),
            LifecyclePolicy::default(),
        ))
    }

    fn lifecycle() -> Arc<SubscriptionLifecycle> {
        lifecycle_with(&ManualClock::new(start()))
    }

    fn verified_handler(mock: &MockPaymentVerifier) -> ActivateSubscriptionHandler {
        ActivateSubscriptionHandler::new(
            lifecycle(),
            Arc::new(InMemoryPaymentLedger::new()),
            Some(Arc::new(mock.clone())),
            true,
        )
    }

    fn cmd_for(subscriber: &str, plan: Plan, session: Option<&str>) -> ActivateSubscriptionCommand {
        ActivateSubscriptionCommand {
            subscriber_id: SubscriberId::new(subscriber).unwrap(),
            plan,
            checkout_session_id: session.map(str::to_string),
        }
    }

    fn cmd(plan: Plan, session: Option<&str>) -> ActivateSubscriptionCommand {
        cmd_for("user-1", plan, session)
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Verified activation
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn paid_session_activates_plan() {
        let mock = MockPaymentVerifier::new();
        mock.add_paid_session("cs_1", "user-1", PaidPlan::Lifetime);

        let result = verified_handler(&mock)
            .handle(cmd(Plan::Lifetime, Some("cs_1")))
            .await
            .unwrap();

        assert_eq!(result.status.plan, Plan::Lifetime);
        assert_eq!(result.status.days_remaining, DaysRemaining::Unlimited);
        assert!(!result.already_redeemed);
    }

    #[tokio::test]
    async fn missing_session_is_rejected() {
        let mock = MockPaymentVerifier::new();
        let err = verified_handler(&mock)
            .handle(cmd(Plan::Monthly, None))
            .await
            .unwrap_err();

        assert!(matches!(err, SubscriptionError::PaymentNotVerified(_)));
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn unpaid_session_is_rejected() {
        let mock = MockPaymentVerifier::new();
        mock.add_session(CheckoutVerification {
            session_id: "cs_1".to_string(),
            payment_status: "unpaid".to_string(),
            plan: Some("monthly".to_string()),
            subscriber_id: Some("user-1".to_string()),
            amount_total: None,
            currency: None,
        });

        let err = verified_handler(&mock)
            .handle(cmd(Plan::Monthly, Some("cs_1")))
            .await
            .unwrap_err();
        assert!(matches!(err, SubscriptionError::PaymentNotVerified(_)));
    }

    #[tokio::test]
    async fn plan_mismatch_is_rejected() {
        let mock = MockPaymentVerifier::new();
        mock.add_paid_session("cs_1", "user-1", PaidPlan::Monthly);

        let err = verified_handler(&mock)
            .handle(cmd(Plan::Lifetime, Some("cs_1")))
            .await
            .unwrap_err();
        assert!(matches!(err, SubscriptionError::PaymentNotVerified(_)));
    }

    #[tokio::test]
    async fn session_of_another_subscriber_is_rejected() {
        let mock = MockPaymentVerifier::new();
        mock.add_session(CheckoutVerification {
            session_id: "cs_1".to_string(),
            payment_status: "paid".to_string(),
            plan: Some("yearly".to_string()),
            subscriber_id: Some("someone-else".to_string()),
            amount_total: Some(29_900),
            currency: Some("cny".to_string()),
        });

        let err = verified_handler(&mock)
            .handle(cmd(Plan::Yearly, Some("cs_1")))
            .await
            .unwrap_err();
        assert!(matches!(err, SubscriptionError::PaymentNotVerified(_)));
    }

    #[tokio::test]
    async fn session_without_subscriber_metadata_is_rejected() {
        let mock = MockPaymentVerifier::new();
        mock.add_session(CheckoutVerification {
            session_id: "cs_1".to_string(),
            payment_status: "paid".to_string(),
            plan: Some("lifetime".to_string()),
            subscriber_id: None,
            amount_total: Some(99_900),
            currency: Some("cny".to_string()),
        });

        let err = verified_handler(&mock)
            .handle(cmd(Plan::Lifetime, Some("cs_1")))
            .await
            .unwrap_err();
        assert!(matches!(err, SubscriptionError::PaymentNotVerified(_)));
    }

    #[tokio::test]
    async fn second_subscriber_cannot_reuse_a_session() {
        let mock = MockPaymentVerifier::new();
        mock.add_paid_session("cs_1", "user-1", PaidPlan::Lifetime);
        let handler = verified_handler(&mock);
        handler
            .handle(cmd(Plan::Lifetime, Some("cs_1")))
            .await
            .unwrap();

        let err = handler
            .handle(cmd_for("user-2", Plan::Lifetime, Some("cs_1")))
            .await
            .unwrap_err();
        assert!(matches!(err, SubscriptionError::PaymentNotVerified(_)));
    }

    #[tokio::test]
    async fn replay_after_29_days_keeps_the_original_period() {
        let mock = MockPaymentVerifier::new();
        mock.add_paid_session("cs_1", "user-1", PaidPlan::Monthly);
        let clock = ManualClock::new(start());
        let handler = ActivateSubscriptionHandler::new(
            lifecycle_with(&clock),
            Arc::new(InMemoryPaymentLedger::new()),
            Some(Arc::new(mock.clone())),
            true,
        );
        handler
            .handle(cmd(Plan::Monthly, Some("cs_1")))
            .await
            .unwrap();

        clock.advance_days(29);
        let replay = handler
            .handle(cmd(Plan::Monthly, Some("cs_1")))
            .await
            .unwrap();

        assert!(replay.already_redeemed);
        assert_eq!(replay.status.start_date, start());
        assert_eq!(replay.status.days_remaining, DaysRemaining::Days(1));
    }

    #[tokio::test]
    async fn gateway_outage_is_provider_error() {
        let mock = MockPaymentVerifier::new();
        mock.set_error(PaymentError::network("connection refused"));

        let err = verified_handler(&mock)
            .handle(cmd(Plan::Monthly, Some("cs_1")))
            .await
            .unwrap_err();
        assert!(matches!(err, SubscriptionError::PaymentProvider(_)));
    }

    #[tokio::test]
    async fn free_trial_is_invalid_before_any_lookup() {
        let mock = MockPaymentVerifier::new();
        let err = verified_handler(&mock)
            .handle(cmd(Plan::FreeTrial, Some("cs_1")))
            .await
            .unwrap_err();

        assert!(matches!(err, SubscriptionError::InvalidPlan(_)));
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn verification_required_without_gateway_fails() {
        let handler = ActivateSubscriptionHandler::new(
            lifecycle(),
            Arc::new(InMemoryPaymentLedger::new()),
            None,
            true,
        );
        let err = handler
            .handle(cmd(Plan::Monthly, Some("cs_1")))
            .await
            .unwrap_err();
        assert!(matches!(err, SubscriptionError::PaymentProvider(_)));
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Demo mode
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn unverified_mode_activates_directly() {
        let handler = ActivateSubscriptionHandler::new(
            lifecycle(),
            Arc::new(InMemoryPaymentLedger::new()),
            None,
            false,
        );
        let result = handler.handle(cmd(Plan::Yearly, None)).await.unwrap();

        assert_eq!(result.status.plan, Plan::Yearly);
        assert_eq!(result.status.days_remaining, DaysRemaining::Days(365));
    }
}
