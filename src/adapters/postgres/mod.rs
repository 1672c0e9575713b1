//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresSubscriptionStore` - Versioned subscription rows
//! - `PostgresPaymentLedger` - Redeemed checkout sessions

mod payment_ledger;
mod subscription_store;

pub use payment_ledger::{PostgresPaymentLedger, CHECKOUT_REDEMPTIONS_SCHEMA};
pub use subscription_store::{PostgresSubscriptionStore, SUBSCRIPTIONS_SCHEMA};
