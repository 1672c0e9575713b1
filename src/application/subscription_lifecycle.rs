//! SubscriptionLifecycle - the state machine behind every subscription query
//! and command.
//!
//! All reads and writes of the subscription record go through here. The
//! record is created lazily on first access, replaced wholesale on
//! activation or reset, and never mutated in place. Writes are
//! compare-and-swap against the version just read and are retried a bounded
//! number of times.

use std::sync::Arc;

use crate::domain::foundation::{SubscriberId, Timestamp};
use crate::domain::subscription::{
    PaidPlan, Plan, SubscriptionError, SubscriptionRecord, SubscriptionStatus,
};
use crate::ports::{Clock, PutOutcome, StoredSubscription, SubscriptionStore};

/// Default number of compare-and-swap attempts per write.
pub const DEFAULT_MAX_WRITE_ATTEMPTS: u32 = 3;

/// Deployment-specific switches for the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecyclePolicy {
    /// Whether `reset_to_trial` is allowed. Demo deployments only.
    pub allow_trial_reset: bool,
    /// Compare-and-swap attempts before giving up with `WriteConflict`.
    pub max_write_attempts: u32,
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self {
            allow_trial_reset: false,
            max_write_attempts: DEFAULT_MAX_WRITE_ATTEMPTS,
        }
    }
}

/// Owns the subscription record of every subscriber.
pub struct SubscriptionLifecycle {
    store: Arc<dyn SubscriptionStore>,
    clock: Arc<dyn Clock>,
    policy: LifecyclePolicy,
}

impl SubscriptionLifecycle {
    pub fn new(
        store: Arc<dyn SubscriptionStore>,
        clock: Arc<dyn Clock>,
        policy: LifecyclePolicy,
    ) -> Self {
        Self {
            store,
            clock,
            policy: LifecyclePolicy {
                max_write_attempts: policy.max_write_attempts.max(1),
                ..policy
            },
        }
    }

    pub fn policy(&self) -> LifecyclePolicy {
        self.policy
    }

    /// Reads the injected clock.
    pub fn now(&self) -> Result<Timestamp, SubscriptionError> {
        Ok(self.clock.now()?)
    }

    /// Creates the 30-day trial if `scope` has no record yet.
    ///
    /// Idempotent: an existing record is left untouched, whatever its plan or
    /// expiry. Fails only when the store or clock fails.
    pub async fn ensure_initialized(&self, scope: &SubscriberId) -> Result<(), SubscriptionError> {
        self.load_or_init(scope).await.map(|_| ())
    }

    /// Current status of `scope`, creating the trial on first access.
    ///
    /// Apart from that lazy creation, this never writes.
    pub async fn get_status(
        &self,
        scope: &SubscriberId,
    ) -> Result<SubscriptionStatus, SubscriptionError> {
        let stored = self.load_or_init(scope).await?;
        stored.record.validate()?;

        let now = self.now()?;
        Ok(stored.record.status_at(now))
    }

    /// Replaces the record with a fresh paid plan starting now.
    ///
    /// Remaining trial or paid time is discarded, not stacked. `free_trial`
    /// is rejected with `InvalidPlan`.
    pub async fn activate(
        &self,
        scope: &SubscriberId,
        plan: Plan,
    ) -> Result<SubscriptionStatus, SubscriptionError> {
        let paid = PaidPlan::try_from(plan)?;
        self.activate_paid(scope, paid).await
    }

    /// Typed variant of [`SubscriptionLifecycle::activate`].
    ///
    /// A stored record that parses but breaks the plan/expiry invariants is
    /// overwritten. A document the store cannot parse at all surfaces as
    /// `CorruptRecord` and is left on disk for inspection.
    pub async fn activate_paid(
        &self,
        scope: &SubscriberId,
        plan: PaidPlan,
    ) -> Result<SubscriptionStatus, SubscriptionError> {
        for attempt in 1..=self.policy.max_write_attempts {
            let expected = self.store.get(scope).await?.map(|s| s.version);
            let now = self.now()?;
            let record = SubscriptionRecord::paid(plan, now);

            match self.store.put(scope, &record, expected).await? {
                PutOutcome::Written(version) => {
                    tracing::info!(
                        subscriber_id = %scope,
                        plan = %plan,
                        version = %version,
                        "Subscription activated"
                    );
                    return Ok(record.status_at(now));
                }
                PutOutcome::Conflict => {
                    tracing::warn!(
                        subscriber_id = %scope,
                        attempt,
                        "Concurrent write during activation, retrying"
                    );
                }
            }
        }

        Err(SubscriptionError::write_conflict(self.policy.max_write_attempts))
    }

    /// Discards the record and starts a new 30-day trial.
    ///
    /// Only available when the policy allows it.
    pub async fn reset_to_trial(
        &self,
        scope: &SubscriberId,
    ) -> Result<SubscriptionStatus, SubscriptionError> {
        if !self.policy.allow_trial_reset {
            return Err(SubscriptionError::TrialResetDisabled);
        }

        self.store.remove(scope).await?;
        tracing::info!(subscriber_id = %scope, "Subscription reset to trial");

        self.get_status(scope).await
    }

    /// The access gate.
    ///
    /// Never fails: any storage, clock or data error denies access and is
    /// logged.
    pub async fn has_access(&self, scope: &SubscriberId) -> bool {
        match self.get_status(scope).await {
            Ok(status) => status.has_access(),
            Err(err) => {
                tracing::error!(
                    subscriber_id = %scope,
                    error = %err,
                    code = %err.code(),
                    "Access check failed, denying access"
                );
                false
            }
        }
    }

    async fn load_or_init(
        &self,
        scope: &SubscriberId,
    ) -> Result<StoredSubscription, SubscriptionError> {
        for _ in 0..self.policy.max_write_attempts {
            if let Some(stored) = self.store.get(scope).await? {
                return Ok(stored);
            }

            let record = SubscriptionRecord::trial(self.now()?);
            match self.store.put(scope, &record, None).await? {
                PutOutcome::Written(version) => {
                    tracing::info!(subscriber_id = %scope, "Free trial started");
                    return Ok(StoredSubscription { record, version });
                }
                // Another first access won; use its record.
                PutOutcome::Conflict => {
                    tracing::debug!(subscriber_id = %scope, "Trial already created concurrently");
                }
            }
        }

        Err(SubscriptionError::write_conflict(self.policy.max_write_attempts))
    }
}
