//! Payment verifier port.
//!
//! Opens hosted checkout sessions at the payment gateway and looks up what
//! the gateway knows about them, so that a paid plan is only activated after
//! the gateway confirms the charge.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::subscription::{
    CheckoutRequest, CheckoutSession, CheckoutVerification, SubscriptionError,
};

/// Port for confirming checkout sessions with the payment gateway.
#[async_trait]
pub trait PaymentVerifier: Send + Sync {
    /// Opens a checkout session for one paid plan.
    ///
    /// The session carries `plan` and `subscriber_id` metadata; a session
    /// without them can never be redeemed.
    async fn create_checkout_session(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError>;

    /// Fetches the session. Does not judge whether it is paid; see
    /// [`CheckoutVerification::paid_plan`].
    async fn verify_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<CheckoutVerification, PaymentError>;
}

/// Error from the payment gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentError {
    pub code: PaymentErrorCode,
    pub message: String,
}

impl PaymentError {
    pub fn new(code: PaymentErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::NetworkError, message)
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::AuthenticationError, message)
    }

    pub fn not_found(resource: &str) -> Self {
        Self::new(PaymentErrorCode::NotFound, format!("{} not found", resource))
    }

    pub fn rate_limited() -> Self {
        Self::new(PaymentErrorCode::RateLimitExceeded, "rate limit exceeded")
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::ProviderError, message)
    }

    pub fn not_configured() -> Self {
        Self::new(
            PaymentErrorCode::NotConfigured,
            "payment gateway credentials are not configured",
        )
    }
}

impl std::fmt::Display for PaymentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for PaymentError {}

impl From<PaymentError> for SubscriptionError {
    fn from(err: PaymentError) -> Self {
        match err.code {
            // An unknown session id is the caller's problem, not an outage.
            PaymentErrorCode::NotFound => SubscriptionError::payment_not_verified(err.message),
            _ => SubscriptionError::payment_provider(err.to_string()),
        }
    }
}

/// Payment error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentErrorCode {
    NetworkError,
    AuthenticationError,
    NotFound,
    RateLimitExceeded,
    ProviderError,
    NotConfigured,
}

impl PaymentErrorCode {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PaymentErrorCode::NetworkError | PaymentErrorCode::RateLimitExceeded
        )
    }
}

impl std::fmt::Display for PaymentErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentErrorCode::NetworkError => "network_error",
            PaymentErrorCode::AuthenticationError => "authentication_error",
            PaymentErrorCode::NotFound => "not_found",
            PaymentErrorCode::RateLimitExceeded => "rate_limit_exceeded",
            PaymentErrorCode::ProviderError => "provider_error",
            PaymentErrorCode::NotConfigured => "not_configured",
        };
        write!(f, "{}", s)
    }
}
