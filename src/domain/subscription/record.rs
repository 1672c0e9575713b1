//! Subscription record - the single persisted entity of the lifecycle.
//!
//! Exactly one record exists per subscriber. Records are never patched:
//! every change (lazy trial creation, activation, reset) builds a fresh
//! record and replaces the stored one wholesale.
//!
//! # Invariants
//!
//! - `lifetime` records never carry an expiry; every other plan does
//! - `start_date` is the clock reading at creation time

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;

use super::{DaysRemaining, Expiry, PaidPlan, Plan, SubscriptionError, SubscriptionStatus, Term, TrialNotice, TRIAL_DAYS};

/// Persisted subscription state for one subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    plan: Plan,
    start_date: Timestamp,
    expiry_date: Expiry,
    /// Activation flag as written at creation time. Advisory only; status
    /// queries re-derive activity from the clock.
    is_active: bool,
}

impl SubscriptionRecord {
    /// A fresh free trial starting at `now`.
    pub fn trial(now: Timestamp) -> Self {
        Self {
            plan: Plan::FreeTrial,
            start_date: now,
            expiry_date: Expiry::At(now.plus_days(TRIAL_DAYS)),
            is_active: true,
        }
    }

    /// A paid plan whose billing period starts at `now`.
    ///
    /// Any previous remaining time is discarded, not stacked.
    pub fn paid(plan: PaidPlan, now: Timestamp) -> Self {
        let expiry_date = match plan.term() {
            Term::Days(days) => Expiry::At(now.plus_days(days)),
            Term::Unbounded => Expiry::Never,
        };

        Self {
            plan: plan.plan(),
            start_date: now,
            expiry_date,
            is_active: true,
        }
    }

    /// Reassembles a record from stored columns.
    ///
    /// No invariant checks; callers run [`SubscriptionRecord::validate`]
    /// before trusting the result.
    pub fn from_parts(
        plan: Plan,
        start_date: Timestamp,
        expiry_date: Expiry,
        is_active: bool,
    ) -> Self {
        Self {
            plan,
            start_date,
            expiry_date,
            is_active,
        }
    }

    pub fn plan(&self) -> Plan {
        self.plan
    }

    pub fn start_date(&self) -> Timestamp {
        self.start_date
    }

    pub fn expiry_date(&self) -> Expiry {
        self.expiry_date
    }

    /// The stored activation flag. Use [`SubscriptionRecord::status_at`] for
    /// access decisions.
    pub fn stored_is_active(&self) -> bool {
        self.is_active
    }

    /// Checks the plan/expiry pairing.
    ///
    /// Records built by the constructors always pass; this guards documents
    /// read back from storage.
    ///
    /// # Errors
    ///
    /// Returns `CorruptRecord` when a lifetime plan has an expiry, when any
    /// other plan lacks one, or when the expiry precedes the start date.
    pub fn validate(&self) -> Result<(), SubscriptionError> {
        match (self.plan, self.expiry_date) {
            (Plan::Lifetime, Expiry::At(_)) => Err(SubscriptionError::corrupt(
                "lifetime plan must not carry an expiry date",
            )),
            (Plan::Lifetime, Expiry::Never) => Ok(()),
            (plan, Expiry::Never) => Err(SubscriptionError::corrupt(format!(
                "{} plan requires an expiry date",
                plan
            ))),
            (_, Expiry::At(expiry)) if expiry.is_before(&self.start_date) => Err(
                SubscriptionError::corrupt("expiry date precedes start date"),
            ),
            _ => Ok(()),
        }
    }

    /// Derives the status as seen at `now`.
    ///
    /// Pure function of the record and the clock reading; the stored
    /// `is_active` flag is not consulted.
    pub fn status_at(&self, now: Timestamp) -> SubscriptionStatus {
        let days_remaining = match self.expiry_date {
            Expiry::Never => DaysRemaining::Unlimited,
            Expiry::At(expiry) => DaysRemaining::Days(now.ceil_days_until(&expiry)),
        };

        let is_active = self.plan.is_paid() || days_remaining.has_time_left();

        SubscriptionStatus {
            plan: self.plan,
            start_date: self.start_date,
            expiry: self.expiry_date,
            days_remaining,
            is_active,
            notice: TrialNotice::for_status(self.plan, days_remaining),
        }
    }
}
