//! Subscription domain module.
//!
//! The trial/paid lifecycle of a single subscriber: plan tiers, the stored
//! record, and the status derived from it at query time.

mod catalog;
mod checkout;
mod errors;
mod expiry;
mod plan;
mod record;
mod status;
pub mod stripe_event;
pub mod webhook_errors;
pub mod webhook_verifier;

pub use catalog::{BillingInterval, PlanOffer, CATALOG_CURRENCY};
pub use checkout::{CheckoutRequest, CheckoutSession, CheckoutVerification, PAYMENT_STATUS_PAID};
pub use errors::SubscriptionError;
pub use expiry::Expiry;
pub use plan::{PaidPlan, Plan, Term, MONTHLY_TERM_DAYS, TRIAL_DAYS, YEARLY_TERM_DAYS};
pub use record::SubscriptionRecord;
pub use status::{
    DaysRemaining, SubscriptionStatus, TrialNotice, REMINDER_WINDOW_DAYS, URGENT_WINDOW_DAYS,
};
pub use stripe_event::{CheckoutSessionObject, StripeEvent, StripeEventType};
pub use webhook_errors::WebhookError;
pub use webhook_verifier::StripeWebhookVerifier;
