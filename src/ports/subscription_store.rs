//! Subscription store port.
//!
//! Holds at most one [`SubscriptionRecord`] per subscriber. Writes are
//! compare-and-swap on an opaque version so that concurrent activations
//! from several tabs or instances cannot silently overwrite each other.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::SubscriberId;
use crate::domain::subscription::{SubscriptionError, SubscriptionRecord};

/// Monotonic version of a stored record. Starts at 1 on first write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordVersion(u64);

impl RecordVersion {
    /// Version given to a freshly inserted record.
    pub const INITIAL: RecordVersion = RecordVersion(1);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// The version a successful overwrite of this one produces.
    pub fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// The version produced by writing over `expected`.
    pub fn after(expected: Option<RecordVersion>) -> Self {
        expected.map_or(Self::INITIAL, |v| v.next())
    }
}

impl std::fmt::Display for RecordVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A record together with the version it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSubscription {
    pub record: SubscriptionRecord,
    pub version: RecordVersion,
}

/// Outcome of a conditional write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// The record was stored under the returned version.
    Written(RecordVersion),
    /// The stored version did not match the expectation; nothing was written.
    Conflict,
}

/// Errors raised by store adapters.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to serialize record: {0}")]
    Serialization(String),

    #[error("Failed to deserialize record: {0}")]
    Deserialization(String),
}

impl From<StoreError> for SubscriptionError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) | StoreError::Serialization(msg) => {
                SubscriptionError::persistence(msg)
            }
            StoreError::Deserialization(msg) => SubscriptionError::corrupt(msg),
        }
    }
}

/// Port for the persisted subscription record.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Reads the record for `scope`, or `None` if it was never written.
    async fn get(&self, scope: &SubscriberId) -> Result<Option<StoredSubscription>, StoreError>;

    /// Replaces the record for `scope` if the stored version equals
    /// `expected`.
    ///
    /// `expected = None` writes only when no record exists. The whole record
    /// is replaced; there is no partial update.
    async fn put(
        &self,
        scope: &SubscriberId,
        record: &SubscriptionRecord,
        expected: Option<RecordVersion>,
    ) -> Result<PutOutcome, StoreError>;

    /// Deletes the record for `scope`. Missing records are not an error.
    async fn remove(&self, scope: &SubscriberId) -> Result<(), StoreError>;
}
