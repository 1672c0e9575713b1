//! Redis adapters.

mod payment_ledger;
mod subscription_store;

pub use payment_ledger::RedisPaymentLedger;
pub use subscription_store::RedisSubscriptionStore;
