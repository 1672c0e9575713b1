//! HTTP DTOs (Data Transfer Objects) for subscription endpoints.
//!
//! These types define the JSON request/response structure for the subscription API.
//! They serve as the boundary between HTTP and the application layer.

use serde::{Deserialize, Serialize};

use crate::domain::subscription::{
    BillingInterval, CheckoutSession, Plan, PlanOffer, SubscriptionStatus, TrialNotice,
};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to activate a paid plan.
#[derive(Debug, Clone, Deserialize)]
pub struct ActivateSubscriptionRequest {
    /// Target plan. Kept as a string so unknown names surface as `INVALID_PLAN`.
    pub plan: String,
    /// Checkout session that paid for the plan.
    #[serde(default)]
    pub checkout_session_id: Option<String>,
}

/// Request to open a checkout session.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCheckoutRequest {
    pub plan: String,
    /// Page the customer returns to after paying; `session_id` is appended.
    pub success_url: String,
    pub cancel_url: String,
    #[serde(default)]
    pub customer_email: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Subscription status as returned by every status-producing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionStatusResponse {
    pub plan: Plan,
    /// RFC 3339.
    pub start_date: String,
    /// RFC 3339, or null for lifetime.
    pub expiry_date: Option<String>,
    /// Whole days left, rounded up. Null for lifetime.
    pub days_remaining: Option<u32>,
    pub is_active: bool,
    pub has_access: bool,
    pub notice: TrialNotice,
}

impl From<SubscriptionStatus> for SubscriptionStatusResponse {
    fn from(status: SubscriptionStatus) -> Self {
        Self {
            has_access: status.has_access(),
            plan: status.plan,
            start_date: status.start_date.to_string(),
            expiry_date: status.expiry.at().map(|t| t.to_string()),
            days_remaining: status.days_remaining.as_days(),
            is_active: status.is_active,
            notice: status.notice,
        }
    }
}

/// Checkout session the client redirects to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSessionResponse {
    pub session_id: String,
    pub url: String,
}

impl From<CheckoutSession> for CheckoutSessionResponse {
    fn from(session: CheckoutSession) -> Self {
        Self {
            session_id: session.session_id,
            url: session.url,
        }
    }
}

/// Response for the access gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessCheckResponse {
    pub has_access: bool,
}

/// One entry of the pricing table.
#[derive(Debug, Clone, Serialize)]
pub struct PlanOfferResponse {
    pub plan: Plan,
    pub display_name: &'static str,
    pub price_minor: u32,
    /// Formatted price, e.g. `¥299`.
    pub price: String,
    pub currency: &'static str,
    pub interval: BillingInterval,
    pub popular: bool,
    pub features: Vec<&'static str>,
}

impl From<&PlanOffer> for PlanOfferResponse {
    fn from(offer: &PlanOffer) -> Self {
        Self {
            plan: offer.plan,
            display_name: offer.display_name,
            price_minor: offer.price_minor,
            price: offer.display_price(),
            currency: offer.currency,
            interval: offer.interval,
            popular: offer.popular,
            features: offer.features.clone(),
        }
    }
}

/// Response for the plan catalog.
#[derive(Debug, Clone, Serialize)]
pub struct PlansResponse {
    pub trial: PlanOfferResponse,
    pub plans: Vec<PlanOfferResponse>,
}

impl PlansResponse {
    pub fn catalog() -> Self {
        Self {
            trial: PlanOfferResponse::from(PlanOffer::trial()),
            plans: PlanOffer::paid().iter().map(PlanOfferResponse::from).collect(),
        }
    }
}

/// Acknowledgement for a processed webhook delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookAckResponse {
    pub received: bool,
    /// `activated` or `ignored`.
    pub outcome: String,
}

/// Standard error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}
