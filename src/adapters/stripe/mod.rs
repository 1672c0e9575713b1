//! Stripe payment adapters.
//!
//! Implements the `PaymentVerifier` port:
//! - `StripeCheckoutVerifier` - Checkout creation and lookup through the Stripe REST API
//! - `MockPaymentVerifier` - Configurable test double
//!
//! Webhook signature checks live in the domain
//! (`domain::subscription::StripeWebhookVerifier`) because they need no I/O.
//!
//! # Configuration
//!
//! - `RESEARCH_PILOT__PAYMENT__STRIPE_API_KEY`: Stripe secret API key
//! - `RESEARCH_PILOT__PAYMENT__STRIPE_WEBHOOK_SECRET`: Webhook signing secret (whsec_...)
//! - `RESEARCH_PILOT__PAYMENT__PRICE_MONTHLY` / `PRICE_YEARLY` / `PRICE_LIFETIME`:
//!   Stripe price ids (price_...) charged at checkout

mod checkout_verifier;
mod mock_payment_verifier;

pub use checkout_verifier::{StripeCheckoutVerifier, StripeConfig, DEFAULT_STRIPE_API_BASE};
pub use mock_payment_verifier::MockPaymentVerifier;
