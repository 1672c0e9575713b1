//! HTTP adapters - REST API implementations.

pub mod middleware;
pub mod subscription;

// Re-export key types for convenience
pub use middleware::with_middleware;
pub use subscription::{app_router, SubscriptionAppState};
