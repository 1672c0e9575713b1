//! Storage Adapters
//!
//! Local implementations of the SubscriptionStore and PaymentLedger ports.
//!
//! ## Available Adapters
//!
//! - **FileSubscriptionStore** - One JSON document per subscriber on disk
//! - **InMemorySubscriptionStore** - Process-local map (testing/development)
//! - **FilePaymentLedger** / **InMemoryPaymentLedger** - Redeemed checkout sessions
//!
//! Networked backends live in `adapters::postgres` and `adapters::redis`.

mod file_payment_ledger;
mod file_subscription_store;
mod in_memory_payment_ledger;
mod in_memory_subscription_store;

pub use file_payment_ledger::FilePaymentLedger;
pub use file_subscription_store::FileSubscriptionStore;
pub use in_memory_payment_ledger::InMemoryPaymentLedger;
pub use in_memory_subscription_store::InMemorySubscriptionStore;
