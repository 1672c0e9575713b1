//! HTTP adapter for subscription endpoints.
//!
//! Exposes the subscription lifecycle via REST API:
//! - `GET /api/subscription` - Current status
//! - `GET /api/subscription/access` - Access gate
//! - `POST /api/subscription/checkout` - Open a checkout session
//! - `POST /api/subscription/activate` - Activate a paid plan
//! - `POST /api/subscription/reset` - Restart the trial (demo only)
//! - `GET /api/subscription/plans` - Pricing table
//! - `POST /api/webhooks/stripe` - Handle Stripe webhooks

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;
pub use handlers::{
    status_for, SubscriberScope, SubscriptionApiError, SubscriptionAppState, WebhookApiError,
    STRIPE_SIGNATURE_HEADER, SUBSCRIBER_ID_HEADER,
};
pub use routes::{app_router, subscription_routes, webhook_routes};
