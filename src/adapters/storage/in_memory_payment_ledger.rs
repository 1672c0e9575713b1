//! In-Memory Payment Ledger
//!
//! Redeemed checkout sessions in a process-local map. Useful for testing,
//! development, and the unverified-payments mode.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::ports::{PaymentLedger, PaymentRedemption, RedeemOutcome, StoreError};

/// In-memory set of redeemed checkout sessions.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentLedger {
    redemptions: Arc<RwLock<HashMap<String, PaymentRedemption>>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryPaymentLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with `StoreError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Looks up a redemption by session id.
    pub async fn get(&self, session_id: &str) -> Option<PaymentRedemption> {
        self.redemptions.read().await.get(session_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.redemptions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.redemptions.read().await.is_empty()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "in-memory ledger marked unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl PaymentLedger for InMemoryPaymentLedger {
    async fn record(&self, redemption: &PaymentRedemption) -> Result<RedeemOutcome, StoreError> {
        self.check_available()?;

        let mut redemptions = self.redemptions.write().await;
        if let Some(existing) = redemptions.get(&redemption.session_id) {
            return Ok(RedeemOutcome::AlreadyRedeemed(existing.clone()));
        }
        redemptions.insert(redemption.session_id.clone(), redemption.clone());
        Ok(RedeemOutcome::Recorded)
    }

    async fn release(&self, session_id: &str) -> Result<(), StoreError> {
        self.check_available()?;
        self.redemptions.write().await.remove(session_id);
        Ok(())
    }
}
