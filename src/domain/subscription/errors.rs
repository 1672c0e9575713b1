//! Subscription-specific error types.
//!
//! Errors related to the subscription lifecycle, payment confirmation and
//! the persistence layer behind it.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | InvalidPlan | 400 |
//! | ValidationFailed | 400 |
//! | PaymentNotVerified | 402 |
//! | TrialResetDisabled | 403 |
//! | WriteConflict | 409 |
//! | CorruptRecord | 500 |
//! | PaymentProvider | 502 |
//! | PersistenceUnavailable | 503 |
//! | ClockUnavailable | 503 |

use crate::domain::foundation::{ErrorCode, ValidationError};

/// Subscription-specific errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// Activation target outside {monthly, yearly, lifetime}.
    InvalidPlan(String),

    /// The storage layer cannot be read or written.
    PersistenceUnavailable(String),

    /// No trustworthy time source.
    ClockUnavailable(String),

    /// Compare-and-swap lost against concurrent writers.
    WriteConflict { attempts: u32 },

    /// Persisted document violates a record invariant.
    CorruptRecord(String),

    /// Trial reset requested while the demo flag is off.
    TrialResetDisabled,

    /// Checkout session is not paid or does not match the request.
    PaymentNotVerified(String),

    /// Payment gateway failed or was unreachable.
    PaymentProvider(String),

    /// Validation failed.
    ValidationFailed { field: String, message: String },
}

impl SubscriptionError {
    pub fn invalid_plan(plan: impl Into<String>) -> Self {
        SubscriptionError::InvalidPlan(plan.into())
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        SubscriptionError::PersistenceUnavailable(message.into())
    }

    pub fn clock(message: impl Into<String>) -> Self {
        SubscriptionError::ClockUnavailable(message.into())
    }

    pub fn write_conflict(attempts: u32) -> Self {
        SubscriptionError::WriteConflict { attempts }
    }

    pub fn corrupt(message: impl Into<String>) -> Self {
        SubscriptionError::CorruptRecord(message.into())
    }

    pub fn payment_not_verified(reason: impl Into<String>) -> Self {
        SubscriptionError::PaymentNotVerified(reason.into())
    }

    pub fn payment_provider(message: impl Into<String>) -> Self {
        SubscriptionError::PaymentProvider(message.into())
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        SubscriptionError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            SubscriptionError::InvalidPlan(_) => ErrorCode::InvalidPlan,
            SubscriptionError::PersistenceUnavailable(_) => ErrorCode::PersistenceUnavailable,
            SubscriptionError::ClockUnavailable(_) => ErrorCode::ClockUnavailable,
            SubscriptionError::WriteConflict { .. } => ErrorCode::WriteConflict,
            SubscriptionError::CorruptRecord(_) => ErrorCode::CorruptRecord,
            SubscriptionError::TrialResetDisabled => ErrorCode::TrialResetDisabled,
            SubscriptionError::PaymentNotVerified(_) => ErrorCode::PaymentNotVerified,
            SubscriptionError::PaymentProvider(_) => ErrorCode::PaymentProviderError,
            SubscriptionError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
        }
    }

    /// Returns a user-friendly error message.
    pub fn message(&self) -> String {
        match self {
            SubscriptionError::InvalidPlan(plan) => format!(
                "Invalid plan '{}': expected one of monthly, yearly, lifetime",
                plan
            ),
            SubscriptionError::PersistenceUnavailable(msg) => {
                format!("Subscription storage unavailable: {}", msg)
            }
            SubscriptionError::ClockUnavailable(msg) => format!("Clock unavailable: {}", msg),
            SubscriptionError::WriteConflict { attempts } => format!(
                "Subscription was modified concurrently; gave up after {} attempts",
                attempts
            ),
            SubscriptionError::CorruptRecord(msg) => {
                format!("Stored subscription record is invalid: {}", msg)
            }
            SubscriptionError::TrialResetDisabled => {
                "Trial reset is only available in demo deployments".to_string()
            }
            SubscriptionError::PaymentNotVerified(reason) => {
                format!("Payment could not be verified: {}", reason)
            }
            SubscriptionError::PaymentProvider(msg) => format!("Payment provider error: {}", msg),
            SubscriptionError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
        }
    }

    /// Returns true if this error should trigger a retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SubscriptionError::PersistenceUnavailable(_)
                | SubscriptionError::WriteConflict { .. }
                | SubscriptionError::PaymentProvider(_)
        )
    }
}

impl std::fmt::Display for SubscriptionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for SubscriptionError {}

impl From<ValidationError> for SubscriptionError {
    fn from(err: ValidationError) -> Self {
        SubscriptionError::validation(err.field().to_string(), err.to_string())
    }
}
