//! Axum router configuration for subscription endpoints.
//!
//! This module defines the route structure for subscription-related API endpoints
//! and wires them to their corresponding handlers.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    activate_subscription, check_access, create_checkout, get_subscription, handle_stripe_webhook, health,
    list_plans, reset_trial, SubscriptionAppState,
};

/// Create the subscription API router.
///
/// # Routes
///
/// ## Subscriber Endpoints (require `X-Subscriber-Id`)
/// - `GET /` - Current status (creates the trial on first call)
/// - `GET /access` - Access gate
/// - `POST /checkout` - Open a hosted checkout page for a paid plan
/// - `POST /activate` - Switch to a paid plan
/// - `POST /reset` - Start a fresh trial (demo deployments only)
///
/// ## Public Endpoints
/// - `GET /plans` - Pricing table
pub fn subscription_routes() -> Router<SubscriptionAppState> {
    Router::new()
        .route("/", get(get_subscription))
        .route("/access", get(check_access))
        .route("/checkout", post(create_checkout))
        .route("/activate", post(activate_subscription))
        .route("/reset", post(reset_trial))
        .route("/plans", get(list_plans))
}

/// Create the Stripe webhook router.
///
/// Webhooks carry no subscriber header; they are verified via signature.
///
/// # Routes
/// - `POST /stripe` - Handle Stripe webhooks
pub fn webhook_routes() -> Router<SubscriptionAppState> {
    Router::new().route("/stripe", post(handle_stripe_webhook))
}

/// Create the complete application router.
///
/// Mounts subscription routes at `/api/subscription`, webhooks at
/// `/api/webhooks` and the liveness check at `/health`.
///
/// # Example
///
/// ```ignore
/// use research_pilot::adapters::http::{app_router, SubscriptionAppState};
///
/// let app = app_router(SubscriptionAppState::unverified(lifecycle));
/// ```
pub fn app_router(state: SubscriptionAppState) -> Router {
    let api = Router::new()
        .nest("/subscription", subscription_routes())
        .nest("/webhooks", webhook_routes());

    Router::new()
        .nest("/api", api)
        .route("/health", get(health))
        .with_state(state)
}
