//! File-based Subscription Store
//!
//! One JSON document per subscriber under a base directory. Writes go to a
//! temporary file that is renamed over the target, so readers never see a
//! half-written record. A store-wide lock serializes the read-compare-write
//! of `put` within this process.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;

use crate::domain::foundation::SubscriberId;
use crate::domain::subscription::SubscriptionRecord;
use crate::ports::{
    PutOutcome, RecordVersion, StoreError, StoredSubscription, SubscriptionStore,
};

/// On-disk document layout.
#[derive(Debug, Serialize, Deserialize)]
struct Document {
    version: RecordVersion,
    record: SubscriptionRecord,
}

/// File-based storage for subscription records.
#[derive(Debug, Clone)]
pub struct FileSubscriptionStore {
    base_path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl FileSubscriptionStore {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Subscriber ids are arbitrary strings; hex-encode them into a safe
    /// file name.
    fn record_path(&self, scope: &SubscriberId) -> PathBuf {
        self.base_path
            .join(format!("{}.json", hex::encode(scope.as_str())))
    }

    async fn read_document(&self, path: &Path) -> Result<Option<Document>, StoreError> {
        let raw = match fs::read(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Unavailable(e.to_string())),
        };

        serde_json::from_slice(&raw)
            .map(Some)
            .map_err(|e| StoreError::Deserialization(e.to_string()))
    }

    async fn write_document(&self, path: &Path, document: &Document) -> Result<(), StoreError> {
        fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let json = serde_json::to_vec_pretty(document)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, json)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        fs::rename(&tmp_path, path)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }
}

#[async_trait]
impl SubscriptionStore for FileSubscriptionStore {
    async fn get(&self, scope: &SubscriberId) -> Result<Option<StoredSubscription>, StoreError> {
        let document = self.read_document(&self.record_path(scope)).await?;
        Ok(document.map(|d| StoredSubscription {
            record: d.record,
            version: d.version,
        }))
    }

    async fn put(
        &self,
        scope: &SubscriberId,
        record: &SubscriptionRecord,
        expected: Option<RecordVersion>,
    ) -> Result<PutOutcome, StoreError> {
        let _guard = self.write_lock.lock().await;
        let path = self.record_path(scope);

        let current = self.read_document(&path).await?.map(|d| d.version);
        if current != expected {
            return Ok(PutOutcome::Conflict);
        }

        let version = RecordVersion::after(expected);
        let document = Document {
            version,
            record: record.clone(),
        };
        self.write_document(&path, &document).await?;

        Ok(PutOutcome::Written(version))
    }

    async fn remove(&self, scope: &SubscriberId) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        match fs::remove_file(self.record_path(scope)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Unavailable(e.to_string())),
        }
    }
}
