//! Plan catalog.
//!
//! Prices are stored in minor currency units (fen) to avoid floating point.

use once_cell::sync::Lazy;
use serde::Serialize;

use super::{PaidPlan, Plan};

/// Currency every plan is priced in.
pub const CATALOG_CURRENCY: &str = "CNY";

/// How often a plan is billed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingInterval {
    /// Free, no billing.
    Trial,
    Month,
    Year,
    /// Charged once.
    OneTime,
}

/// A purchasable (or trial) plan as shown on the pricing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanOffer {
    pub plan: Plan,
    pub display_name: &'static str,
    /// Price in minor units of `currency`.
    pub price_minor: u32,
    pub currency: &'static str,
    pub interval: BillingInterval,
    /// Highlighted as the recommended choice.
    pub popular: bool,
    pub features: Vec<&'static str>,
}

impl PlanOffer {
    /// The free trial handed out on first access.
    pub fn trial() -> &'static PlanOffer {
        &TRIAL_OFFER
    }

    /// All paid offers, cheapest first.
    pub fn paid() -> &'static [PlanOffer] {
        &PAID_OFFERS
    }

    /// Looks up the offer for a paid plan.
    pub fn for_plan(plan: PaidPlan) -> &'static PlanOffer {
        match plan {
            PaidPlan::Monthly => &PAID_OFFERS[0],
            PaidPlan::Yearly => &PAID_OFFERS[1],
            PaidPlan::Lifetime => &PAID_OFFERS[2],
        }
    }

    /// Price formatted for display, e.g. `¥29`.
    pub fn display_price(&self) -> String {
        let major = self.price_minor / 100;
        let minor = self.price_minor % 100;
        if minor == 0 {
            format!("¥{}", major)
        } else {
            format!("¥{}.{:02}", major, minor)
        }
    }
}

static TRIAL_OFFER: Lazy<PlanOffer> = Lazy::new(|| PlanOffer {
    plan: Plan::FreeTrial,
    display_name: Plan::FreeTrial.display_name(),
    price_minor: 0,
    currency: CATALOG_CURRENCY,
    interval: BillingInterval::Trial,
    popular: false,
    features: vec!["Full access for 30 days", "No payment details required"],
});

static PAID_OFFERS: Lazy<Vec<PlanOffer>> = Lazy::new(|| {
    vec![
        PlanOffer {
            plan: Plan::Monthly,
            display_name: Plan::Monthly.display_name(),
            price_minor: 2_900,
            currency: CATALOG_CURRENCY,
            interval: BillingInterval::Month,
            popular: false,
            features: vec![
                "Unlimited access to all features",
                "Topic recommendations",
                "Paper search and download",
                "AI reading assistant",
                "Research roadmap generation",
                "Task tracking and check-ins",
                "Cloud backup",
                "Priority support",
            ],
        },
        PlanOffer {
            plan: Plan::Yearly,
            display_name: Plan::Yearly.display_name(),
            price_minor: 29_900,
            currency: CATALOG_CURRENCY,
            interval: BillingInterval::Year,
            popular: true,
            features: vec![
                "Everything in Monthly",
                "Advanced research analytics",
                "Tailored topic recommendations",
                "Early access to new features",
                "VIP support",
            ],
        },
        PlanOffer {
            plan: Plan::Lifetime,
            display_name: Plan::Lifetime.display_name(),
            price_minor: 99_900,
            currency: CATALOG_CURRENCY,
            interval: BillingInterval::OneTime,
            popular: false,
            features: vec![
                "Everything in Yearly",
                "Pay once, use forever",
                "All future features included",
                "Unlimited cloud storage",
                "Personal research advisor",
            ],
        },
    ]
});
