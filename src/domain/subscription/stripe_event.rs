//! Stripe payload types.
//!
//! Only the fields the subscription lifecycle reads are captured; the rest of
//! Stripe's schema is ignored on deserialization.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::CheckoutVerification;

/// Metadata key carrying the purchased plan.
pub const METADATA_PLAN: &str = "plan";

/// Metadata key carrying the subscriber the checkout was started for.
pub const METADATA_SUBSCRIBER_ID: &str = "subscriber_id";

/// Stripe webhook event (simplified).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEvent {
    /// Event identifier (`evt_...`).
    pub id: String,

    /// Event type, e.g. `checkout.session.completed`.
    #[serde(rename = "type")]
    pub event_type: String,

    /// Creation time as a Unix timestamp.
    pub created: i64,

    pub data: StripeEventData,

    #[serde(default)]
    pub livemode: bool,
}

/// Container for event-specific data.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEventData {
    /// The object that triggered the event. Shape depends on the event type.
    pub object: serde_json::Value,
}

impl StripeEvent {
    /// Parse the event type into a known variant.
    pub fn parsed_type(&self) -> StripeEventType {
        StripeEventType::parse(&self.event_type)
    }

    /// Deserializes the data object as the given type.
    pub fn deserialize_object<T: serde::de::DeserializeOwned>(
        &self,
    ) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.data.object.clone())
    }
}

/// Event types the payments webhook recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripeEventType {
    CheckoutSessionCompleted,
    CustomerSubscriptionUpdated,
    CustomerSubscriptionDeleted,
    InvoicePaymentSucceeded,
    InvoicePaymentFailed,
    Unknown,
}

impl StripeEventType {
    pub fn parse(s: &str) -> Self {
        match s {
            "checkout.session.completed" => Self::CheckoutSessionCompleted,
            "customer.subscription.updated" => Self::CustomerSubscriptionUpdated,
            "customer.subscription.deleted" => Self::CustomerSubscriptionDeleted,
            "invoice.payment_succeeded" => Self::InvoicePaymentSucceeded,
            "invoice.payment_failed" => Self::InvoicePaymentFailed,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CheckoutSessionCompleted => "checkout.session.completed",
            Self::CustomerSubscriptionUpdated => "customer.subscription.updated",
            Self::CustomerSubscriptionDeleted => "customer.subscription.deleted",
            Self::InvoicePaymentSucceeded => "invoice.payment_succeeded",
            Self::InvoicePaymentFailed => "invoice.payment_failed",
            Self::Unknown => "unknown",
        }
    }
}

/// A Checkout Session object, as returned by the sessions API and embedded
/// in `checkout.session.*` events.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CheckoutSessionObject {
    pub id: String,
    pub payment_status: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
}

impl CheckoutSessionObject {
    /// Flattens the session into the facts the lifecycle needs.
    pub fn into_verification(self) -> CheckoutVerification {
        let mut metadata = self.metadata;
        CheckoutVerification {
            session_id: self.id,
            payment_status: self.payment_status,
            plan: metadata.remove(METADATA_PLAN),
            subscriber_id: metadata.remove(METADATA_SUBSCRIBER_ID),
            amount_total: self.amount_total,
            currency: self.currency,
        }
    }
}
