//! GetSubscriptionStatusHandler - Query handler for the current subscription.

use std::sync::Arc;

use crate::application::SubscriptionLifecycle;
use crate::domain::foundation::SubscriberId;
use crate::domain::subscription::{SubscriptionError, SubscriptionStatus};

/// Query for a subscriber's current status.
#[derive(Debug, Clone)]
pub struct GetSubscriptionStatusQuery {
    pub subscriber_id: SubscriberId,
}

#[derive(Debug, Clone)]
pub struct GetSubscriptionStatusResult {
    pub status: SubscriptionStatus,
}

/// Handler for status queries. Starts the trial on a subscriber's first visit.
pub struct GetSubscriptionStatusHandler {
    lifecycle: Arc<SubscriptionLifecycle>,
}

impl GetSubscriptionStatusHandler {
    pub fn new(lifecycle: Arc<SubscriptionLifecycle>) -> Self {
        Self { lifecycle }
    }

    pub async fn handle(
        &self,
        query: GetSubscriptionStatusQuery,
    ) -> Result<GetSubscriptionStatusResult, SubscriptionError> {
        let status = self.lifecycle.get_status(&query.subscriber_id).await?;
        Ok(GetSubscriptionStatusResult { status })
    }
}
