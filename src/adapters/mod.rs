//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `clock` - System and manual clocks
//! - `storage` - In-memory and file-backed subscription stores
//! - `postgres` - PostgreSQL subscription store
//! - `redis` - Redis subscription store
//! - `stripe` - Checkout session verification (Stripe API, mock)
//! - `http` - REST API

pub mod clock;
pub mod http;
pub mod postgres;
pub mod redis;
pub mod storage;
pub mod stripe;

pub use clock::{ManualClock, SystemClock};
pub use self::postgres::PostgresSubscriptionStore;
pub use self::redis::RedisSubscriptionStore;
pub use storage::{FileSubscriptionStore, InMemorySubscriptionStore};
pub use stripe::{MockPaymentVerifier, StripeCheckoutVerifier, StripeConfig};
