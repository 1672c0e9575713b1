//! CreateCheckoutHandler - Command handler for opening a hosted checkout page.
//!
//! The session is created with the subscriber and plan in its metadata, which
//! is what later lets activation and the webhook tie the payment to exactly
//! one subscriber. Nothing is written to the subscription record here.

use std::sync::Arc;

use crate::domain::foundation::SubscriberId;
use crate::domain::subscription::{
    CheckoutRequest, CheckoutSession, PaidPlan, Plan, SubscriptionError,
};
use crate::ports::PaymentVerifier;

/// Command to start checkout for a paid plan.
#[derive(Debug, Clone)]
pub struct CreateCheckoutCommand {
    pub subscriber_id: SubscriberId,
    pub plan: Plan,
    pub success_url: String,
    pub cancel_url: String,
    pub customer_email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateCheckoutResult {
    pub session: CheckoutSession,
}

/// Handler for checkout creation.
pub struct CreateCheckoutHandler {
    payment_verifier: Option<Arc<dyn PaymentVerifier>>,
}

impl CreateCheckoutHandler {
    pub fn new(payment_verifier: Option<Arc<dyn PaymentVerifier>>) -> Self {
        Self { payment_verifier }
    }

    pub async fn handle(
        &self,
        cmd: CreateCheckoutCommand,
    ) -> Result<CreateCheckoutResult, SubscriptionError> {
        let plan = PaidPlan::try_from(cmd.plan)?;
        let success_url = redirect_url("success_url", &cmd.success_url)?;
        let cancel_url = redirect_url("cancel_url", &cmd.cancel_url)?;
        let customer_email = cmd
            .customer_email
            .map(|email| email.trim().to_string())
            .filter(|email| !email.is_empty());

        let gateway = self.payment_verifier.as_ref().ok_or_else(|| {
            SubscriptionError::payment_provider("payment gateway is not configured")
        })?;

        let session = gateway
            .create_checkout_session(CheckoutRequest {
                subscriber_id: cmd.subscriber_id,
                plan,
                success_url,
                cancel_url,
                customer_email,
            })
            .await
            .map_err(|e| SubscriptionError::payment_provider(e.to_string()))?;

        Ok(CreateCheckoutResult { session })
    }
}

fn redirect_url(field: &str, raw: &str) -> Result<String, SubscriptionError> {
    let url = raw.trim();
    let has_host = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .is_some_and(|rest| !rest.is_empty());
    if !has_host {
        return Err(SubscriptionError::validation(
            field,
            "must be an absolute http(s) URL",
        ));
    }
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::stripe::MockPaymentVerifier;
    use crate::ports::PaymentError;

    fn cmd(plan: Plan) -> CreateCheckoutCommand {
        CreateCheckoutCommand {
            subscriber_id: SubscriberId::new("user-1").unwrap(),
            plan,
            success_url: "https://app.test/paid".to_string(),
            cancel_url: "https://app.test/plans".to_string(),
            customer_email: Some("  ".to_string()),
        }
    }

    fn handler(mock: &MockPaymentVerifier) -> CreateCheckoutHandler {
        CreateCheckoutHandler::new(Some(Arc::new(mock.clone())))
    }

    #[tokio::test]
    async fn session_is_bound_to_subscriber_and_plan() {
        let mock = MockPaymentVerifier::new();

        let result = handler(&mock).handle(cmd(Plan::Yearly)).await.unwrap();

        assert!(result.session.url.contains(&result.session.session_id));
        let created = mock.created();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].subscriber_id.as_str(), "user-1");
        assert_eq!(created[0].plan, PaidPlan::Yearly);
        assert_eq!(created[0].customer_email, None);
    }

    #[tokio::test]
    async fn free_trial_cannot_be_bought() {
        let mock = MockPaymentVerifier::new();
        let err = handler(&mock).handle(cmd(Plan::FreeTrial)).await.unwrap_err();

        assert!(matches!(err, SubscriptionError::InvalidPlan(_)));
        assert!(mock.created().is_empty());
    }

    #[tokio::test]
    async fn relative_redirect_is_rejected() {
        let mock = MockPaymentVerifier::new();
        let mut command = cmd(Plan::Monthly);
        command.cancel_url = "/plans".to_string();

        let err = handler(&mock).handle(command).await.unwrap_err();
        assert!(matches!(
            err,
            SubscriptionError::ValidationFailed { ref field, .. } if field == "cancel_url"
        ));
    }

    #[tokio::test]
    async fn missing_gateway_is_provider_error() {
        let err = CreateCheckoutHandler::new(None)
            .handle(cmd(Plan::Monthly))
            .await
            .unwrap_err();
        assert!(matches!(err, SubscriptionError::PaymentProvider(_)));
    }

    #[tokio::test]
    async fn gateway_failure_is_provider_error() {
        let mock = MockPaymentVerifier::new();
        mock.set_error(PaymentError::not_configured());

        let err = handler(&mock).handle(cmd(Plan::Lifetime)).await.unwrap_err();
        assert!(matches!(err, SubscriptionError::PaymentProvider(_)));
    }
}
