//! HTTP handlers for subscription endpoints.
//!
//! Each route builds the matching application handler from the shared
//! state, runs it, and maps the outcome onto a DTO or an error body.

use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{Json, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;

use crate::adapters::storage::InMemoryPaymentLedger;
use crate::application::handlers::subscription::{
    ActivateSubscriptionCommand, ActivateSubscriptionHandler, CheckAccessHandler,
    CheckAccessQuery, CreateCheckoutCommand, CreateCheckoutHandler, GetSubscriptionStatusHandler, GetSubscriptionStatusQuery,
    HandleStripeWebhookCommand, HandleStripeWebhookHandler, HandleStripeWebhookResult,
    ResetTrialCommand, ResetTrialHandler,
};
use crate::application::SubscriptionLifecycle;
use crate::domain::foundation::{ErrorCode, SubscriberId};
use crate::domain::subscription::{
    Plan, StripeWebhookVerifier, SubscriptionError, WebhookError,
};
use crate::ports::{PaymentLedger, PaymentVerifier};

use super::dto::{
    AccessCheckResponse, ActivateSubscriptionRequest, CheckoutSessionResponse,
    CreateCheckoutRequest, ErrorResponse, PlansResponse, SubscriptionStatusResponse,
    WebhookAckResponse,
};

/// Header carrying the subscriber scope.
pub const SUBSCRIBER_ID_HEADER: &str = "X-Subscriber-Id";

/// Header carrying the Stripe webhook signature.
pub const STRIPE_SIGNATURE_HEADER: &str = "Stripe-Signature";

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Router state. Cloned per request; everything heavy sits behind an `Arc`.
#[derive(Clone)]
pub struct SubscriptionAppState {
    pub lifecycle: Arc<SubscriptionLifecycle>,
    /// Checkout sessions already turned into an activation.
    pub payment_ledger: Arc<dyn PaymentLedger>,
    pub payment_verifier: Option<Arc<dyn PaymentVerifier>>,
    pub webhook_verifier: Option<Arc<StripeWebhookVerifier>>,
    pub require_payment_verification: bool,
    /// Expose internal error details in 5xx responses.
    pub verbose_errors: bool,
}

impl SubscriptionAppState {
    /// State with no payment gateway; activations are trusted.
    pub fn unverified(lifecycle: Arc<SubscriptionLifecycle>) -> Self {
        Self {
            lifecycle,
            payment_ledger: Arc::new(InMemoryPaymentLedger::new()),
            payment_verifier: None,
            webhook_verifier: None,
            require_payment_verification: false,
            verbose_errors: false,
        }
    }

    /// Create handlers on demand from the shared state.
    pub fn get_status_handler(&self) -> GetSubscriptionStatusHandler {
        GetSubscriptionStatusHandler::new(self.lifecycle.clone())
    }

    pub fn check_access_handler(&self) -> CheckAccessHandler {
        CheckAccessHandler::new(self.lifecycle.clone())
    }

    pub fn activate_handler(&self) -> ActivateSubscriptionHandler {
        ActivateSubscriptionHandler::new(
            self.lifecycle.clone(),
            self.payment_ledger.clone(),
            self.payment_verifier.clone(),
            self.require_payment_verification,
        )
    }

    pub fn checkout_handler(&self) -> CreateCheckoutHandler {
        CreateCheckoutHandler::new(self.payment_verifier.clone())
    }

    pub fn reset_trial_handler(&self) -> ResetTrialHandler {
        ResetTrialHandler::new(self.lifecycle.clone())
    }

    pub fn webhook_handler(&self) -> HandleStripeWebhookHandler {
        HandleStripeWebhookHandler::new(
            self.lifecycle.clone(),
            self.payment_ledger.clone(),
            self.webhook_verifier.clone(),
        )
    }

    fn api_error(&self, error: SubscriptionError) -> SubscriptionApiError {
        SubscriptionApiError {
            error,
            verbose: self.verbose_errors,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Subscriber Context
// ════════════════════════════════════════════════════════════════════════════════

/// Subscriber scope extracted from the `X-Subscriber-Id` header.
///
/// Identity is established upstream; this service trusts the header.
#[derive(Debug, Clone)]
pub struct SubscriberScope {
    pub subscriber_id: SubscriberId,
}

/// Rejection type for SubscriberScope extraction.
pub struct SubscriberScopeRequired;

impl IntoResponse for SubscriberScopeRequired {
    fn into_response(self) -> axum::response::Response {
        let error = ErrorResponse::new(
            ErrorCode::Unauthorized.to_string(),
            format!("A valid {} header is required", SUBSCRIBER_ID_HEADER),
        );
        (StatusCode::UNAUTHORIZED, Json(error)).into_response()
    }
}

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for SubscriberScope
where
    S: Send + Sync,
{
    type Rejection = SubscriberScopeRequired;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let subscriber_id = parts
            .headers
            .get(SUBSCRIBER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| SubscriberId::new(s).ok())
            .ok_or(SubscriberScopeRequired)?;

        Ok(SubscriberScope { subscriber_id })
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Query Handlers (GET endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/subscription - Get the subscriber's status, creating the trial on first call
pub async fn get_subscription(
    State(state): State<SubscriptionAppState>,
    scope: SubscriberScope,
) -> Result<impl IntoResponse, SubscriptionApiError> {
    let handler = state.get_status_handler();
    let query = GetSubscriptionStatusQuery {
        subscriber_id: scope.subscriber_id,
    };

    let result = handler.handle(query).await.map_err(|e| state.api_error(e))?;

    Ok(Json(SubscriptionStatusResponse::from(result.status)))
}

/// GET /api/subscription/access - Check if the subscriber has access
pub async fn check_access(
    State(state): State<SubscriptionAppState>,
    scope: SubscriberScope,
) -> impl IntoResponse {
    let handler = state.check_access_handler();
    let query = CheckAccessQuery {
        subscriber_id: scope.subscriber_id,
    };

    let result = handler.handle(query).await;

    Json(AccessCheckResponse {
        has_access: result.has_access,
    })
}

/// GET /api/subscription/plans - Pricing table
pub async fn list_plans() -> impl IntoResponse {
    Json(PlansResponse::catalog())
}

// ════════════════════════════════════════════════════════════════════════════════
// Command Handlers (POST endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/subscription/checkout - Open a hosted checkout page for a paid plan
pub async fn create_checkout(
    State(state): State<SubscriptionAppState>,
    scope: SubscriberScope,
    Json(request): Json<CreateCheckoutRequest>,
) -> Result<impl IntoResponse, SubscriptionApiError> {
    let plan = Plan::from_str(&request.plan).map_err(|e| state.api_error(e))?;

    let handler = state.checkout_handler();
    let cmd = CreateCheckoutCommand {
        subscriber_id: scope.subscriber_id,
        plan,
        success_url: request.success_url,
        cancel_url: request.cancel_url,
        customer_email: request.customer_email,
    };

    let result = handler.handle(cmd).await.map_err(|e| state.api_error(e))?;

    Ok(Json(CheckoutSessionResponse::from(result.session)))
}

/// POST /api/subscription/activate - Switch to a paid plan
pub async fn activate_subscription(
    State(state): State<SubscriptionAppState>,
    scope: SubscriberScope,
    Json(request): Json<ActivateSubscriptionRequest>,
) -> Result<impl IntoResponse, SubscriptionApiError> {
    let plan = Plan::from_str(&request.plan).map_err(|e| state.api_error(e))?;

    let handler = state.activate_handler();
    let cmd = ActivateSubscriptionCommand {
        subscriber_id: scope.subscriber_id,
        plan,
        checkout_session_id: request.checkout_session_id,
    };

    let result = handler.handle(cmd).await.map_err(|e| state.api_error(e))?;

    Ok(Json(SubscriptionStatusResponse::from(result.status)))
}

/// POST /api/subscription/reset - Start a fresh trial (demo deployments only)
pub async fn reset_trial(
    State(state): State<SubscriptionAppState>,
    scope: SubscriberScope,
) -> Result<impl IntoResponse, SubscriptionApiError> {
    let handler = state.reset_trial_handler();
    let cmd = ResetTrialCommand {
        subscriber_id: scope.subscriber_id,
    };

    let result = handler.handle(cmd).await.map_err(|e| state.api_error(e))?;

    Ok(Json(SubscriptionStatusResponse::from(result.status)))
}

/// POST /api/webhooks/stripe - Handle Stripe webhook events
pub async fn handle_stripe_webhook(
    State(state): State<SubscriptionAppState>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Result<impl IntoResponse, WebhookApiError> {
    let signature = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(WebhookApiError(WebhookError::InvalidSignature))?;

    let handler = state.webhook_handler();
    let cmd = HandleStripeWebhookCommand {
        payload: body.to_vec(),
        signature: signature.to_string(),
    };

    let outcome = match handler.handle(cmd).await? {
        HandleStripeWebhookResult::Activated { .. } => "activated",
        HandleStripeWebhookResult::Ignored { .. } => "ignored",
    };

    Ok(Json(WebhookAckResponse {
        received: true,
        outcome: outcome.to_string(),
    }))
}

/// GET /health - Liveness check
pub async fn health() -> &'static str {
    "ok"
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// HTTP status for a subscription error.
pub fn status_for(error: &SubscriptionError) -> StatusCode {
    match error {
        SubscriptionError::InvalidPlan(_) | SubscriptionError::ValidationFailed { .. } => {
            StatusCode::BAD_REQUEST
        }
        SubscriptionError::PaymentNotVerified(_) => StatusCode::PAYMENT_REQUIRED,
        SubscriptionError::TrialResetDisabled => StatusCode::FORBIDDEN,
        SubscriptionError::WriteConflict { .. } => StatusCode::CONFLICT,
        SubscriptionError::PaymentProvider(_) => StatusCode::BAD_GATEWAY,
        SubscriptionError::PersistenceUnavailable(_) | SubscriptionError::ClockUnavailable(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        SubscriptionError::CorruptRecord(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Subscription failure rendered as `{ code, message }` with its HTTP status.
pub struct SubscriptionApiError {
    error: SubscriptionError,
    verbose: bool,
}

impl From<SubscriptionError> for SubscriptionApiError {
    fn from(error: SubscriptionError) -> Self {
        Self {
            error,
            verbose: false,
        }
    }
}

impl IntoResponse for SubscriptionApiError {
    fn into_response(self) -> axum::response::Response {
        let status = status_for(&self.error);

        let message = if status.is_server_error() {
            tracing::error!(code = %self.error.code(), error = %self.error, "Subscription request failed");
            if self.verbose {
                self.error.message()
            } else {
                status
                    .canonical_reason()
                    .unwrap_or("Internal error")
                    .to_string()
            }
        } else {
            self.error.message()
        };

        let body = ErrorResponse::new(self.error.code().to_string(), message);
        (status, Json(body)).into_response()
    }
}

/// Webhook error wrapper; status codes steer Stripe's redelivery.
pub struct WebhookApiError(WebhookError);

impl From<WebhookError> for WebhookApiError {
    fn from(err: WebhookError) -> Self {
        Self(err)
    }
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.0.status_code();
        let code = match &self.0 {
            WebhookError::InvalidSignature
            | WebhookError::TimestampOutOfRange
            | WebhookError::InvalidTimestamp => ErrorCode::InvalidWebhookSignature,
            WebhookError::ParseError(_) | WebhookError::MissingMetadata(_) => {
                ErrorCode::ValidationFailed
            }
            WebhookError::NotConfigured => ErrorCode::PaymentProviderError,
            WebhookError::Subscription(err) => err.code(),
        };

        if status.is_server_error() {
            tracing::error!(code = %code, error = %self.0, "Webhook processing failed");
        }

        let body = ErrorResponse::new(code.to_string(), self.0.to_string());
        (status, Json(body)).into_response()
    }
}
