//! Mock payment verifier for testing.
//!
//! Supports pre-configured sessions, checkout creation, error injection and
//! call tracking.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::subscription::{
    CheckoutRequest, CheckoutSession, CheckoutVerification, PaidPlan, PAYMENT_STATUS_PAID,
};
use crate::ports::{PaymentError, PaymentVerifier};

/// Mock payment verifier.
///
/// ```ignore
/// let mock = MockPaymentVerifier::new();
/// mock.add_paid_session("cs_1", "user-1", PaidPlan::Yearly);
/// let session = mock.verify_checkout_session("cs_1").await?;
/// ```
#[derive(Clone, Default)]
pub struct MockPaymentVerifier {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    sessions: HashMap<String, CheckoutVerification>,
    created: Vec<CheckoutRequest>,
    next_error: Option<PaymentError>,
    call_log: Vec<String>,
}

impl MockPaymentVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Registers a session exactly as the gateway would report it.
    pub fn add_session(&self, session: CheckoutVerification) {
        self.state()
            .sessions
            .insert(session.session_id.clone(), session);
    }

    /// Registers a session paid by `subscriber_id` for `plan`.
    pub fn add_paid_session(&self, session_id: &str, subscriber_id: &str, plan: PaidPlan) {
        self.add_session(CheckoutVerification {
            session_id: session_id.to_string(),
            payment_status: PAYMENT_STATUS_PAID.to_string(),
            plan: Some(plan.to_string()),
            subscriber_id: Some(subscriber_id.to_string()),
            amount_total: None,
            currency: None,
        });
    }

    /// Marks a registered session as paid, as if the customer completed the
    /// hosted checkout page. Returns false for an unknown session.
    pub fn mark_paid(&self, session_id: &str) -> bool {
        match self.state().sessions.get_mut(session_id) {
            Some(session) => {
                session.payment_status = PAYMENT_STATUS_PAID.to_string();
                true
            }
            None => false,
        }
    }

    /// Makes the next call fail with `error`.
    pub fn set_error(&self, error: PaymentError) {
        self.state().next_error = Some(error);
    }

    /// Session ids looked up so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.state().call_log.clone()
    }

    /// Checkout requests received so far, in order.
    pub fn created(&self) -> Vec<CheckoutRequest> {
        self.state().created.clone()
    }
}

#[async_trait]
impl PaymentVerifier for MockPaymentVerifier {
    async fn create_checkout_session(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let mut state = self.state();
        if let Some(error) = state.next_error.take() {
            return Err(error);
        }

        let session_id = format!("cs_mock_{}", state.created.len() + 1);
        state.sessions.insert(
            session_id.clone(),
            CheckoutVerification {
                session_id: session_id.clone(),
                payment_status: "unpaid".to_string(),
                plan: Some(request.plan.to_string()),
                subscriber_id: Some(request.subscriber_id.as_str().to_string()),
                amount_total: None,
                currency: None,
            },
        );
        state.created.push(request);

        Ok(CheckoutSession {
            url: format!("https://checkout.stripe.test/pay/{}", session_id),
            session_id,
        })
    }

    async fn verify_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<CheckoutVerification, PaymentError> {
        let mut state = self.state();
        state.call_log.push(session_id.to_string());

        if let Some(error) = state.next_error.take() {
            return Err(error);
        }

        state
            .sessions
            .get(session_id)
            .cloned()
            .ok_or_else(|| PaymentError::not_found("checkout session"))
    }
}
