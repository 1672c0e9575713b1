//! ResetTrialHandler - Command handler for the demo-only trial reset.

use std::sync::Arc;

use crate::application::SubscriptionLifecycle;
use crate::domain::foundation::SubscriberId;
use crate::domain::subscription::{SubscriptionError, SubscriptionStatus};

#[derive(Debug, Clone)]
pub struct ResetTrialCommand {
    pub subscriber_id: SubscriberId,
}

#[derive(Debug, Clone)]
pub struct ResetTrialResult {
    pub status: SubscriptionStatus,
}

/// Discards the subscriber's record and starts a new trial.
///
/// Refused with `TrialResetDisabled` unless the deployment enables it.
pub struct ResetTrialHandler {
    lifecycle: Arc<SubscriptionLifecycle>,
}

impl ResetTrialHandler {
    pub fn new(lifecycle: Arc<SubscriptionLifecycle>) -> Self {
        Self { lifecycle }
    }

    pub async fn handle(&self, cmd: ResetTrialCommand) -> Result<ResetTrialResult, SubscriptionError> {
        let status = self.lifecycle.reset_to_trial(&cmd.subscriber_id).await?;
        Ok(ResetTrialResult { status })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::clock::ManualClock;
    use crate::adapters::storage::InMemorySubscriptionStore;
    use crate::application::LifecyclePolicy;
    use crate::domain::foundation::Timestamp;
    use crate::domain::subscription::Plan;

    fn handler(allow_trial_reset: bool) -> (Arc<SubscriptionLifecycle>, ResetTrialHandler) {
        let lifecycle = Arc::new(SubscriptionLifecycle::new(
            Arc::new(InMemorySubscriptionStore::new()),
            Arc::new(ManualClock::new(
                Timestamp::from_unix_secs(1_705_276_800).unwrap(),
            )),
            LifecyclePolicy {
                allow_trial_reset,
                ..LifecyclePolicy::default()
            },
        ));
        (lifecycle.clone(), ResetTrialHandler::new(lifecycle))
    }

    fn cmd() -> ResetTrialCommand {
        ResetTrialCommand {
            subscriber_id: SubscriberId::new("user-1").unwrap(),
        }
    }

    #[tokio::test]
    async fn refuses_when_disabled() {
        let (_, handler) = handler(false);
        let err = handler.handle(cmd()).await.unwrap_err();
        assert_eq!(err, SubscriptionError::TrialResetDisabled);
    }

    #[tokio::test]
    async fn replaces_paid_plan_with_trial() {
        let (lifecycle, handler) = handler(true);
        lifecycle
            .activate(&cmd().subscriber_id, Plan::Yearly)
            .await
            .unwrap();

        let result = handler.handle(cmd()).await.unwrap();
        assert_eq!(result.status.plan, Plan::FreeTrial);
    }
}
