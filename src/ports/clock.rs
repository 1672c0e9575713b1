//! Clock port.
//!
//! Every lifecycle decision reads the time through this port so that trial
//! expiry can be tested without waiting and so that a broken wall clock is
//! reported instead of silently granting or denying access.

use crate::domain::foundation::Timestamp;
use crate::domain::subscription::SubscriptionError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClockError {
    #[error("Clock unavailable: {0}")]
    Unavailable(String),
}

impl From<ClockError> for SubscriptionError {
    fn from(err: ClockError) -> Self {
        match err {
            ClockError::Unavailable(msg) => SubscriptionError::clock(msg),
        }
    }
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Result<Timestamp, ClockError>;
}
