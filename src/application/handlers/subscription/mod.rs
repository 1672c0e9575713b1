//! Subscription handlers.
//!
//! ## Commands
//! - Opening a checkout session for a paid plan
//! - Activating a paid plan (optionally payment-verified)
//! - Resetting to a fresh trial (demo deployments)
//! - Processing Stripe webhooks
//!
//! ## Queries
//! - Get subscription status
//! - Check access

mod activate_subscription;
mod check_access;
mod create_checkout;
mod get_status;
mod handle_stripe_webhook;
mod reset_trial;

// Commands
pub use activate_subscription::{
    ActivateSubscriptionCommand, ActivateSubscriptionHandler, ActivateSubscriptionResult,
};
pub use create_checkout::{CreateCheckoutCommand, CreateCheckoutHandler, CreateCheckoutResult};
pub use handle_stripe_webhook::{
    HandleStripeWebhookCommand, HandleStripeWebhookHandler, HandleStripeWebhookResult,
};
pub use reset_trial::{ResetTrialCommand, ResetTrialHandler, ResetTrialResult};

// Queries
pub use check_access::{CheckAccessHandler, CheckAccessQuery, CheckAccessResult};
pub use get_status::{
    GetSubscriptionStatusHandler, GetSubscriptionStatusQuery, GetSubscriptionStatusResult,
};
