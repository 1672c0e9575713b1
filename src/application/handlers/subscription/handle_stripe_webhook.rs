//! HandleStripeWebhookHandler - Command handler for Stripe webhook deliveries.
//!
//! A verified `checkout.session.completed` event for a paid session
//! activates the plan named in its metadata. Activation is keyed by the
//! checkout session id in the payment ledger, so a redelivered event (or one
//! arriving after the customer already activated through the API) is
//! acknowledged without touching the record. Every other event type is
//! acknowledged and ignored.

use std::sync::Arc;

use crate::application::{CheckoutRedeemer, Redemption, SubscriptionLifecycle};
use crate::domain::foundation::SubscriberId;
use crate::domain::subscription::{
    CheckoutSessionObject, PaidPlan, StripeEvent, StripeEventType, StripeWebhookVerifier,
    WebhookError,
};
use crate::ports::PaymentLedger;

/// Command to handle a webhook delivery.
#[derive(Debug, Clone)]
pub struct HandleStripeWebhookCommand {
    /// Raw request body, exactly as signed.
    pub payload: Vec<u8>,
    /// `Stripe-Signature` header value.
    pub signature: String,
}

/// Result of webhook processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleStripeWebhookResult {
    /// Checkout completed, plan activated.
    Activated {
        event_id: String,
        subscriber_id: SubscriberId,
        plan: PaidPlan,
    },
    /// Event acknowledged but no action taken.
    Ignored { event_id: String, reason: String },
}

/// Handler for Stripe webhooks.
pub struct HandleStripeWebhookHandler {
    lifecycle: Arc<SubscriptionLifecycle>,
    redeemer: CheckoutRedeemer,
    verifier: Option<Arc<StripeWebhookVerifier>>,
}

impl HandleStripeWebhookHandler {
    /// `verifier` is `None` when no webhook secret is configured; every
    /// delivery is then refused.
    pub fn new(
        lifecycle: Arc<SubscriptionLifecycle>,
        payment_ledger: Arc<dyn PaymentLedger>,
        verifier: Option<Arc<StripeWebhookVerifier>>,
    ) -> Self {
        Self {
            redeemer: CheckoutRedeemer::new(lifecycle.clone(), payment_ledger),
            lifecycle,
            verifier,
        }
    }

    pub async fn handle(
        &self,
        cmd: HandleStripeWebhookCommand,
    ) -> Result<HandleStripeWebhookResult, WebhookError> {
        let verifier = self.verifier.as_ref().ok_or(WebhookError::NotConfigured)?;
        let now = self.lifecycle.now()?;

        let event = verifier
            .verify_and_parse(&cmd.payload, &cmd.signature, now)
            .map_err(|e| {
                tracing::warn!(error = %e, "Rejected webhook delivery");
                e
            })?;

        match event.parsed_type() {
            StripeEventType::CheckoutSessionCompleted => self.handle_checkout_completed(&event).await,
            other => {
                tracing::debug!(event_id = %event.id, event_type = other.as_str(), "Webhook event ignored");
                Ok(HandleStripeWebhookResult::Ignored {
                    event_id: event.id.clone(),
                    reason: format!("unhandled event type {}", event.event_type),
                })
            }
        }
    }

    async fn handle_checkout_completed(
        &self,
        event: &StripeEvent,
    ) -> Result<HandleStripeWebhookResult, WebhookError> {
        let session: CheckoutSessionObject = event
            .deserialize_object()
            .map_err(|e| WebhookError::ParseError(e.to_string()))?;
        let verification = session.into_verification();

        // Delayed payment methods complete checkout before the money arrives.
        if !verification.is_paid() {
            tracing::info!(
                event_id = %event.id,
                session_id = %verification.session_id,
                payment_status = %verification.payment_status,
                "Checkout completed without payment, ignoring"
            );
            return Ok(HandleStripeWebhookResult::Ignored {
                event_id: event.id.clone(),
                reason: format!("payment status {}", verification.payment_status),
            });
        }

        let subscriber_id = verification
            .subscriber_id
            .as_deref()
            .ok_or(WebhookError::MissingMetadata("subscriber_id"))?;
        let subscriber_id = SubscriberId::new(subscriber_id)
            .map_err(|e| WebhookError::ParseError(e.to_string()))?;

        if verification.plan.is_none() {
            return Err(WebhookError::MissingMetadata("plan"));
        }
        let plan = verification.paid_plan()?;

        let redemption = self
            .redeemer
            .redeem(&subscriber_id, plan, &verification.session_id)
            .await?;
        if let Redemption::AlreadyRedeemed(_) = redemption {
            return Ok(HandleStripeWebhookResult::Ignored {
                event_id: event.id.clone(),
                reason: format!("checkout session {} already redeemed", verification.session_id),
            });
        }

        tracing::info!(
            event_id = %event.id,
            subscriber_id = %subscriber_id,
            plan = %plan,
            "Subscription activated from checkout webhook"
        );

        Ok(HandleStripeWebhookResult::Activated {
            event_id: event.id.clone(),
            subscriber_id,
            plan,
        })
    }
}
