//! CheckAccessHandler - Query handler for the access gate.

use std::sync::Arc;

use crate::application::SubscriptionLifecycle;
use crate::domain::foundation::SubscriberId;

/// Query to check if a subscriber may use gated features.
#[derive(Debug, Clone)]
pub struct CheckAccessQuery {
    pub subscriber_id: SubscriberId,
}

/// Result of access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckAccessResult {
    pub has_access: bool,
}

/// Handler for checking access.
///
/// The most frequently called query. Failures deny access rather than
/// surfacing as errors.
pub struct CheckAccessHandler {
    lifecycle: Arc<SubscriptionLifecycle>,
}

impl CheckAccessHandler {
    pub fn new(lifecycle: Arc<SubscriptionLifecycle>) -> Self {
        Self { lifecycle }
    }

    pub async fn handle(&self, query: CheckAccessQuery) -> CheckAccessResult {
        CheckAccessResult {
            has_access: self.lifecycle.has_access(&query.subscriber_id).await,
        }
    }
}
