//! Checkout sessions at the payment gateway: what we ask for when creating
//! one, and what the gateway reports back when we look one up.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::SubscriberId;

use super::{PaidPlan, SubscriptionError};

/// Payment status the gateway reports for a completed charge.
pub const PAYMENT_STATUS_PAID: &str = "paid";

/// Result of looking up a checkout session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutVerification {
    pub session_id: String,
    /// Gateway payment status (`paid`, `unpaid`, `no_payment_required`).
    pub payment_status: String,
    /// Plan recorded in the session metadata.
    pub plan: Option<String>,
    /// Subscriber recorded in the session metadata.
    pub subscriber_id: Option<String>,
    /// Amount charged in minor units.
    pub amount_total: Option<i64>,
    pub currency: Option<String>,
}

impl CheckoutVerification {
    /// Returns true when the gateway reports the session as paid.
    pub fn is_paid(&self) -> bool {
        self.payment_status == PAYMENT_STATUS_PAID
    }

    /// The plan this session paid for.
    ///
    /// # Errors
    ///
    /// Returns `PaymentNotVerified` when the session is not paid or carries
    /// no usable plan in its metadata.
    pub fn paid_plan(&self) -> Result<PaidPlan, SubscriptionError> {
        if !self.is_paid() {
            return Err(SubscriptionError::payment_not_verified(format!(
                "session {} has payment status '{}'",
                self.session_id, self.payment_status
            )));
        }

        let plan = self.plan.as_deref().ok_or_else(|| {
            SubscriptionError::payment_not_verified(format!(
                "session {} has no plan metadata",
                self.session_id
            ))
        })?;

        plan.parse::<PaidPlan>().map_err(|_| {
            SubscriptionError::payment_not_verified(format!(
                "session {} paid for unknown plan '{}'",
                self.session_id, plan
            ))
        })
    }

    /// Checks that this session paid for `plan` on behalf of `subscriber`.
    ///
    /// Sessions without `subscriber_id` metadata are refused: they could be
    /// presented by anyone.
    ///
    /// # Errors
    ///
    /// Returns `PaymentNotVerified` when the session is unpaid, paid for a
    /// different plan, or is not bound to `subscriber`.
    pub fn confirm_for(
        &self,
        subscriber: &SubscriberId,
        plan: PaidPlan,
    ) -> Result<(), SubscriptionError> {
        let paid_plan = self.paid_plan()?;
        if paid_plan != plan {
            return Err(SubscriptionError::payment_not_verified(format!(
                "session {} paid for {}, not {}",
                self.session_id, paid_plan, plan
            )));
        }

        match self.subscriber_id.as_deref() {
            Some(owner) if owner == subscriber.as_str() => Ok(()),
            Some(_) => Err(SubscriptionError::payment_not_verified(format!(
                "session {} belongs to another subscriber",
                self.session_id
            ))),
            None => Err(SubscriptionError::payment_not_verified(format!(
                "session {} is not bound to a subscriber",
                self.session_id
            ))),
        }
    }
}

/// Request to open a hosted checkout page for one paid plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    /// Written into the session metadata so the payment can only ever be
    /// redeemed by this subscriber.
    pub subscriber_id: SubscriberId,
    pub plan: PaidPlan,
    /// Where the gateway redirects after payment. The session id is
    /// appended as a `session_id` query parameter.
    pub success_url: String,
    pub cancel_url: String,
    /// Pre-fills the payment form.
    pub customer_email: Option<String>,
}

/// A checkout session the customer can be redirected to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub session_id: String,
    pub url: String,
}
