//! Subscription plan definitions.
//!
//! Represents the plan tiers available in Research Pilot and the billing
//! term attached to each one.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::SubscriptionError;

/// Length of the free trial granted to a new subscription record.
pub const TRIAL_DAYS: i64 = 30;

/// Length of one monthly billing term.
pub const MONTHLY_TERM_DAYS: i64 = 30;

/// Length of one yearly billing term.
pub const YEARLY_TERM_DAYS: i64 = 365;

/// Subscription plan tier.
///
/// Determines billing cadence and expiry behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    /// Fixed-length trial handed out on first access.
    FreeTrial,

    /// Paid, 30-day term.
    Monthly,

    /// Paid, 365-day term.
    Yearly,

    /// Paid once, never expires.
    Lifetime,
}

impl Plan {
    /// Returns true if this plan is a paid tier.
    pub fn is_paid(&self) -> bool {
        !matches!(self, Plan::FreeTrial)
    }

    /// Returns the wire name of this plan.
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::FreeTrial => "free_trial",
            Plan::Monthly => "monthly",
            Plan::Yearly => "yearly",
            Plan::Lifetime => "lifetime",
        }
    }

    /// Returns the display name for this plan.
    pub fn display_name(&self) -> &'static str {
        match self {
            Plan::FreeTrial => "Free Trial",
            Plan::Monthly => "Monthly",
            Plan::Yearly => "Yearly",
            Plan::Lifetime => "Lifetime",
        }
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Plan {
    type Err = SubscriptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free_trial" => Ok(Plan::FreeTrial),
            "monthly" => Ok(Plan::Monthly),
            "yearly" => Ok(Plan::Yearly),
            "lifetime" => Ok(Plan::Lifetime),
            other => Err(SubscriptionError::invalid_plan(other)),
        }
    }
}

/// Length of a billing term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Term {
    /// Term ends after the given number of days.
    Days(i64),
    /// Term never ends.
    Unbounded,
}

/// A plan that can be activated after payment.
///
/// `free_trial` is deliberately unrepresentable here; the only way to get a
/// trial is lazy initialization or a reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaidPlan {
    Monthly,
    Yearly,
    Lifetime,
}

impl PaidPlan {
    /// All activatable plans, cheapest first.
    pub const ALL: [PaidPlan; 3] = [PaidPlan::Monthly, PaidPlan::Yearly, PaidPlan::Lifetime];

    /// Billing term started by activating this plan.
    pub fn term(&self) -> Term {
        match self {
            PaidPlan::Monthly => Term::Days(MONTHLY_TERM_DAYS),
            PaidPlan::Yearly => Term::Days(YEARLY_TERM_DAYS),
            PaidPlan::Lifetime => Term::Unbounded,
        }
    }

    /// The general plan tier this paid plan corresponds to.
    pub fn plan(&self) -> Plan {
        match self {
            PaidPlan::Monthly => Plan::Monthly,
            PaidPlan::Yearly => Plan::Yearly,
            PaidPlan::Lifetime => Plan::Lifetime,
        }
    }
}

impl From<PaidPlan> for Plan {
    fn from(plan: PaidPlan) -> Self {
        plan.plan()
    }
}

impl TryFrom<Plan> for PaidPlan {
    type Error = SubscriptionError;

    fn try_from(plan: Plan) -> Result<Self, Self::Error> {
        match plan {
            Plan::Monthly => Ok(PaidPlan::Monthly),
            Plan::Yearly => Ok(PaidPlan::Yearly),
            Plan::Lifetime => Ok(PaidPlan::Lifetime),
            Plan::FreeTrial => Err(SubscriptionError::invalid_plan(plan.as_str())),
        }
    }
}

impl FromStr for PaidPlan {
    type Err = SubscriptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<Plan>().and_then(PaidPlan::try_from)
    }
}

impl std::fmt::Display for PaidPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.plan())
    }
}
