//! File-based Payment Ledger
//!
//! One JSON document per redeemed checkout session. `record` checks and
//! writes under a ledger-wide lock; documents are written through a
//! temporary file and renamed into place.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;

use crate::ports::{PaymentLedger, PaymentRedemption, RedeemOutcome, StoreError};

/// File-based set of redeemed checkout sessions.
#[derive(Debug, Clone)]
pub struct FilePaymentLedger {
    base_path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl FilePaymentLedger {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    fn redemption_path(&self, session_id: &str) -> PathBuf {
        self.base_path
            .join(format!("{}.json", hex::encode(session_id)))
    }

    async fn read_redemption(&self, path: &Path) -> Result<Option<PaymentRedemption>, StoreError> {
        let raw = match fs::read(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Unavailable(e.to_string())),
        };

        serde_json::from_slice(&raw)
            .map(Some)
            .map_err(|e| StoreError::Deserialization(e.to_string()))
    }
}

#[async_trait]
impl PaymentLedger for FilePaymentLedger {
    async fn record(&self, redemption: &PaymentRedemption) -> Result<RedeemOutcome, StoreError> {
        let _guard = self.write_lock.lock().await;
        let path = self.redemption_path(&redemption.session_id);

        if let Some(existing) = self.read_redemption(&path).await? {
            return Ok(RedeemOutcome::AlreadyRedeemed(existing));
        }

        fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let json = serde_json::to_vec_pretty(redemption)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, json)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok(RedeemOutcome::Recorded)
    }

    async fn release(&self, session_id: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        match fs::remove_file(self.redemption_path(session_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Unavailable(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{SubscriberId, Timestamp};
    use crate::domain::subscription::PaidPlan;
    use tempfile::TempDir;

    fn redemption(session_id: &str, subscriber: &str) -> PaymentRedemption {
        PaymentRedemption {
            session_id: session_id.to_string(),
            subscriber_id: SubscriberId::new(subscriber).unwrap(),
            plan: PaidPlan::Lifetime,
            redeemed_at: Timestamp::from_unix_secs(1_705_276_800).unwrap(),
        }
    }

    #[tokio::test]
    async fn redemption_survives_a_new_ledger_instance() {
        let dir = TempDir::new().unwrap();
        let first = redemption("cs_live_1", "alice");
        FilePaymentLedger::new(dir.path())
            .record(&first)
            .await
            .unwrap();

        let reopened = FilePaymentLedger::new(dir.path());
        let outcome = reopened
            .record(&redemption("cs_live_1", "bob"))
            .await
            .unwrap();
        assert_eq!(outcome, RedeemOutcome::AlreadyRedeemed(first));
    }

    #[tokio::test]
    async fn release_removes_the_document() {
        let dir = TempDir::new().unwrap();
        let ledger = FilePaymentLedger::new(dir.path());
        ledger.record(&redemption("cs_1", "alice")).await.unwrap();
        ledger.release("cs_1").await.unwrap();
        ledger.release("cs_1").await.unwrap();

        let outcome = ledger.record(&redemption("cs_1", "alice")).await.unwrap();
        assert_eq!(outcome, RedeemOutcome::Recorded);
    }

    #[tokio::test]
    async fn unreadable_document_is_a_deserialization_error() {
        let dir = TempDir::new().unwrap();
        let ledger = FilePaymentLedger::new(dir.path());
        std::fs::write(ledger.redemption_path("cs_1"), b"not json").unwrap();

        assert!(matches!(
            ledger.record(&redemption("cs_1", "alice")).await,
            Err(StoreError::Deserialization(_))
        ));
    }
}
