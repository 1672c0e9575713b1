//! Derived subscription status.
//!
//! Computed on every query from the stored record and the current time.
//! Never persisted.

use serde::{Deserialize, Serialize, Serializer};

use crate::domain::foundation::Timestamp;

use super::{Expiry, Plan};

/// Days left on the current plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "Option<u32>")]
pub enum DaysRemaining {
    /// The plan has no time limit (lifetime).
    Unlimited,
    /// Whole days left, rounded up. 0 once the expiry instant is reached.
    Days(u32),
}

impl DaysRemaining {
    /// Returns the day count, or `None` for unlimited plans.
    pub fn as_days(&self) -> Option<u32> {
        match self {
            DaysRemaining::Unlimited => None,
            DaysRemaining::Days(days) => Some(*days),
        }
    }

    /// Returns true while any time is left.
    pub fn has_time_left(&self) -> bool {
        match self {
            DaysRemaining::Unlimited => true,
            DaysRemaining::Days(days) => *days > 0,
        }
    }
}

impl From<Option<u32>> for DaysRemaining {
    fn from(value: Option<u32>) -> Self {
        value.map_or(DaysRemaining::Unlimited, DaysRemaining::Days)
    }
}

impl Serialize for DaysRemaining {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_days().serialize(serializer)
    }
}

/// Point-in-time view of a subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriptionStatus {
    /// Current plan tier.
    pub plan: Plan,
    /// When the current plan began.
    pub start_date: Timestamp,
    /// When the current plan lapses.
    pub expiry: Expiry,
    /// Days left, rounded up.
    pub days_remaining: DaysRemaining,
    /// True for any paid plan; for a trial, true while days remain.
    pub is_active: bool,
    /// Banner hint for trial subscribers.
    pub notice: TrialNotice,
}

impl SubscriptionStatus {
    /// The access gate.
    ///
    /// Paid plans always pass. A trial passes while days remain.
    pub fn has_access(&self) -> bool {
        self.plan.is_paid() || self.days_remaining.has_time_left()
    }
}

/// Trials with this many days or fewer get a reminder.
pub const REMINDER_WINDOW_DAYS: u32 = 7;

/// Trials with this many days or fewer get an urgent reminder.
pub const URGENT_WINDOW_DAYS: u32 = 3;

/// Hint for the trial banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrialNotice {
    /// Nothing to show.
    None,
    /// Trial ends within a week.
    Reminder { days: u32 },
    /// Trial ends within three days.
    Urgent { days: u32 },
    /// Trial is over.
    Expired,
}

impl TrialNotice {
    /// Picks the notice for a plan and its remaining time.
    pub fn for_status(plan: Plan, days_remaining: DaysRemaining) -> Self {
        if plan.is_paid() {
            return TrialNotice::None;
        }

        match days_remaining {
            DaysRemaining::Unlimited => TrialNotice::None,
            DaysRemaining::Days(0) => TrialNotice::Expired,
            DaysRemaining::Days(days) if days <= URGENT_WINDOW_DAYS => TrialNotice::Urgent { days },
            DaysRemaining::Days(days) if days <= REMINDER_WINDOW_DAYS => {
                TrialNotice::Reminder { days }
            }
            DaysRemaining::Days(_) => TrialNotice::None,
        }
    }
}
