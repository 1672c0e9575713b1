//! Webhook error types.
//!
//! Status codes steer Stripe's delivery retries: 2xx acknowledges, 4xx is
//! dropped, 5xx is redelivered.

use axum::http::StatusCode;
use thiserror::Error;

use super::SubscriptionError;

/// Errors that occur while handling a payment webhook.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Signature did not match the payload.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Event is older than the accepted window.
    #[error("Timestamp out of range")]
    TimestampOutOfRange,

    /// Event claims to come from the future beyond the skew tolerance.
    #[error("Invalid timestamp")]
    InvalidTimestamp,

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Missing metadata: {0}")]
    MissingMetadata(&'static str),

    /// No webhook secret is configured.
    #[error("Webhook endpoint is not configured")]
    NotConfigured,

    /// Applying the event to the subscription failed.
    #[error("Subscription update failed: {0}")]
    Subscription(#[from] SubscriptionError),
}

impl WebhookError {
    /// Returns true if Stripe should redeliver the event.
    pub fn is_retryable(&self) -> bool {
        match self {
            WebhookError::Subscription(err) => err.is_retryable(),
            _ => false,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::InvalidSignature | WebhookError::TimestampOutOfRange => {
                StatusCode::UNAUTHORIZED
            }
            WebhookError::InvalidTimestamp
            | WebhookError::ParseError(_)
            | WebhookError::MissingMetadata(_) => StatusCode::BAD_REQUEST,
            WebhookError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            WebhookError::Subscription(err) if err.is_retryable() => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            WebhookError::Subscription(SubscriptionError::CorruptRecord(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            WebhookError::Subscription(_) => StatusCode::BAD_REQUEST,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_failures_are_unauthorized() {
        assert_eq!(
            WebhookError::InvalidSignature.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            WebhookError::TimestampOutOfRange.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert!(!WebhookError::InvalidSignature.is_retryable());
    }

    #[test]
    fn malformed_payloads_are_bad_requests() {
        assert_eq!(
            WebhookError::ParseError("eof".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            WebhookError::MissingMetadata("plan").status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn storage_outage_is_redelivered() {
        let err = WebhookError::from(SubscriptionError::persistence("redis down"));
        assert!(err.is_retryable());
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn unpayable_plan_is_not_redelivered() {
        let err = WebhookError::from(SubscriptionError::invalid_plan("free_trial"));
        assert!(!err.is_retryable());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn display_messages() {
        assert_eq!(WebhookError::InvalidSignature.to_string(), "Invalid signature");
        assert_eq!(
            WebhookError::MissingMetadata("subscriber_id").to_string(),
            "Missing metadata: subscriber_id"
        );
    }
}
