//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Following CQRS, it separates command handlers (write) from query handlers (read).

mod checkout_redemption;
pub mod handlers;
mod subscription_lifecycle;

pub use checkout_redemption::{CheckoutRedeemer, Redemption};
pub use subscription_lifecycle::{
    LifecyclePolicy, SubscriptionLifecycle, DEFAULT_MAX_WRITE_ATTEMPTS,
};
