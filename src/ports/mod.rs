//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `SubscriptionStore` - Compare-and-swap persistence of the subscription record
//! - `Clock` - Current time for every expiry decision
//! - `PaymentVerifier` - Checkout session creation and lookup at the payment gateway
//! - `PaymentLedger` - Checkout sessions already redeemed for an activation

mod clock;
mod payment_ledger;
mod payment_verifier;
mod subscription_store;

pub use clock::{Clock, ClockError};
pub use payment_ledger::{PaymentLedger, PaymentRedemption, RedeemOutcome};
pub use payment_verifier::{PaymentError, PaymentErrorCode, PaymentVerifier};
pub use subscription_store::{
    PutOutcome, RecordVersion, StoreError, StoredSubscription, SubscriptionStore,
};
