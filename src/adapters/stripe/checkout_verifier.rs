//! Stripe checkout sessions.
//!
//! Implements the `PaymentVerifier` port with `POST /v1/checkout/sessions`
//! and `GET /v1/checkout/sessions/{id}`. The secret key is held in a
//! `secrecy::SecretString` and only exposed to build the basic-auth header.

use std::collections::HashMap;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::domain::subscription::{
    CheckoutRequest, CheckoutSession, CheckoutSessionObject, CheckoutVerification, PaidPlan,
};
use crate::ports::{PaymentError, PaymentErrorCode, PaymentVerifier};

/// Default Stripe API origin.
pub const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com";

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Secret API key (`sk_live_...` or `sk_test_...`).
    api_key: SecretString,
    api_base_url: String,
    /// Stripe price id (`price_...`) charged for each plan.
    prices: HashMap<PaidPlan, String>,
}

impl StripeConfig {
    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            api_base_url: DEFAULT_STRIPE_API_BASE.to_string(),
            prices: HashMap::new(),
        }
    }

    /// Sets the price charged for `plan`.
    pub fn with_price(mut self, plan: PaidPlan, price_id: impl Into<String>) -> Self {
        self.prices.insert(plan, price_id.into());
        self
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

/// Looks up checkout sessions through the Stripe REST API.
pub struct StripeCheckoutVerifier {
    config: StripeConfig,
    http_client: reqwest::Client,
}

impl StripeCheckoutVerifier {
    pub fn new(config: StripeConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    fn sessions_url(&self) -> String {
        format!("{}/v1/checkout/sessions", self.config.api_base_url)
    }

    fn session_url(&self, session_id: &str) -> String {
        format!("{}/{}", self.sessions_url(), session_id)
    }

    fn get_price_id(&self, plan: PaidPlan) -> Result<&str, PaymentError> {
        self.config
            .prices
            .get(&plan)
            .map(String::as_str)
            .ok_or_else(|| {
                PaymentError::new(
                    PaymentErrorCode::NotConfigured,
                    format!("no Stripe price configured for the {} plan", plan),
                )
            })
    }

    /// Form parameters for a checkout session. Lifetime is a one-off
    /// payment, the other plans are recurring.
    fn checkout_params(
        &self,
        request: CheckoutRequest,
    ) -> Result<Vec<(&'static str, String)>, PaymentError> {
        let price_id = self.get_price_id(request.plan)?;
        let mode = match request.plan {
            PaidPlan::Lifetime => "payment",
            PaidPlan::Monthly | PaidPlan::Yearly => "subscription",
        };

        let mut params = vec![
            ("mode", mode.to_string()),
            ("line_items[0][price]", price_id.to_string()),
            ("line_items[0][quantity]", "1".to_string()),
            ("success_url", with_session_placeholder(&request.success_url)),
            ("cancel_url", request.cancel_url),
            ("client_reference_id", request.subscriber_id.as_str().to_string()),
            ("metadata[plan]", request.plan.to_string()),
            ("metadata[subscriber_id]", request.subscriber_id.as_str().to_string()),
        ];

        if let Some(email) = request.customer_email {
            params.push(("customer_email", email));
        }

        Ok(params)
    }
}

/// Appends Stripe's `{CHECKOUT_SESSION_ID}` template so the success page
/// learns which session to activate.
fn with_session_placeholder(success_url: &str) -> String {
    let separator = if success_url.contains('?') { '&' } else { '?' };
    format!("{}{}session_id={{CHECKOUT_SESSION_ID}}", success_url, separator)
}

/// The fields of a newly created session we hand back to the caller.
#[derive(Debug, Deserialize)]
struct CreatedSession {
    id: String,
    url: Option<String>,
}

fn error_for_status(status: reqwest::StatusCode, body: String) -> PaymentError {
    if status == reqwest::StatusCode::NOT_FOUND {
        PaymentError::not_found("checkout session")
    } else if status == reqwest::StatusCode::UNAUTHORIZED {
        PaymentError::authentication("Stripe rejected the API key")
    } else if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        PaymentError::rate_limited()
    } else {
        PaymentError::provider(format!("Stripe API error ({}): {}", status, body))
    }
}

/// Session ids are interpolated into the request path, so only Stripe's
/// `cs_...` alphabet is accepted.
fn is_valid_session_id(session_id: &str) -> bool {
    !session_id.is_empty()
        && session_id.len() <= 255
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[async_trait]
impl PaymentVerifier for StripeCheckoutVerifier {
    async fn create_checkout_session(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let subscriber_id = request.subscriber_id.clone();
        let plan = request.plan;
        let params = self.checkout_params(request)?;

        let response = self
            .http_client
            .post(self.sessions_url())
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .form(&params)
            .send()
            .await
            .map_err(|e| PaymentError::network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(error_for_status(status, error_text));
        }

        let created: CreatedSession = response.json().await.map_err(|e| {
            PaymentError::provider(format!("Failed to parse Stripe response: {}", e))
        })?;
        let url = created.url.ok_or_else(|| {
            PaymentError::provider(format!("checkout session {} has no hosted URL", created.id))
        })?;

        tracing::info!(
            session_id = %created.id,
            subscriber_id = %subscriber_id,
            plan = %plan,
            "Created checkout session"
        );

        Ok(CheckoutSession {
            session_id: created.id,
            url,
        })
    }

    async fn verify_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<CheckoutVerification, PaymentError> {
        if !is_valid_session_id(session_id) {
            return Err(PaymentError::new(
                PaymentErrorCode::NotFound,
                "checkout session id is malformed",
            ));
        }

        let response = self
            .http_client
            .get(self.session_url(session_id))
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .send()
            .await
            .map_err(|e| PaymentError::network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(error_for_status(status, error_text));
        }

        let session: CheckoutSessionObject = response.json().await.map_err(|e| {
            PaymentError::provider(format!("Failed to parse Stripe response: {}", e))
        })?;

        tracing::debug!(
            session_id = %session.id,
            payment_status = %session.payment_status,
            "Fetched checkout session"
        );

        Ok(session.into_verification())
    }
}
