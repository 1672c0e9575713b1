//! In-Memory Subscription Store
//!
//! Keeps records in a process-local map. Useful for testing and development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::SubscriberId;
use crate::domain::subscription::SubscriptionRecord;
use crate::ports::{
    PutOutcome, RecordVersion, StoreError, StoredSubscription, SubscriptionStore,
};

/// In-memory storage for subscription records.
#[derive(Debug, Clone, Default)]
pub struct InMemorySubscriptionStore {
    records: Arc<RwLock<HashMap<SubscriberId, StoredSubscription>>>,
    unavailable: Arc<AtomicBool>,
    /// Number of upcoming writes to reject with `Conflict`.
    forced_conflicts: Arc<AtomicUsize>,
}

impl InMemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with `StoreError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Rejects the next `count` writes as if another writer got there first.
    pub fn force_conflicts(&self, count: usize) {
        self.forced_conflicts.store(count, Ordering::SeqCst);
    }

    /// Stores a record directly, bypassing version checks (test seeding).
    pub async fn seed(&self, scope: SubscriberId, record: SubscriptionRecord) -> RecordVersion {
        let mut records = self.records.write().await;
        let version = RecordVersion::after(records.get(&scope).map(|s| s.version));
        records.insert(scope, StoredSubscription { record, version });
        version
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "in-memory store marked unavailable".to_string(),
            ));
        }
        Ok(())
    }

    fn take_forced_conflict(&self) -> bool {
        self.forced_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn get(&self, scope: &SubscriberId) -> Result<Option<StoredSubscription>, StoreError> {
        self.check_available()?;
        Ok(self.records.read().await.get(scope).cloned())
    }

    async fn put(
        &self,
        scope: &SubscriberId,
        record: &SubscriptionRecord,
        expected: Option<RecordVersion>,
    ) -> Result<PutOutcome, StoreError> {
        self.check_available()?;

        let mut records = self.records.write().await;
        if self.take_forced_conflict() {
            return Ok(PutOutcome::Conflict);
        }

        let current = records.get(scope).map(|s| s.version);
        if current != expected {
            return Ok(PutOutcome::Conflict);
        }

        let version = RecordVersion::after(expected);
        records.insert(
            scope.clone(),
            StoredSubscription {
                record: record.clone(),
                version,
            },
        );
        Ok(PutOutcome::Written(version))
    }

    async fn remove(&self, scope: &SubscriberId) -> Result<(), StoreError> {
        self.check_available()?;
        self.records.write().await.remove(scope);
        Ok(())
    }
}
