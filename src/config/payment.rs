//! Payment configuration

use secrecy::SecretString;
use serde::Deserialize;

use super::error::ValidationError;
use crate::adapters::stripe::DEFAULT_STRIPE_API_BASE;
use crate::domain::subscription::PaidPlan;

/// Payment configuration (Stripe)
///
/// Both keys are optional: without an API key checkout sessions cannot be
/// created or verified, without a webhook secret the webhook endpoint refuses
/// deliveries. A plan without a price id cannot be bought through checkout.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Stripe API key
    pub stripe_api_key: Option<String>,

    /// Stripe webhook signing secret
    pub stripe_webhook_secret: Option<String>,

    /// Stripe API base URL
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Stripe price ids per plan
    pub price_monthly: Option<String>,
    pub price_yearly: Option<String>,
    pub price_lifetime: Option<String>,
}

impl PaymentConfig {
    /// Check if using Stripe test mode
    pub fn is_test_mode(&self) -> bool {
        self.api_key().is_some_and(|k| k.starts_with("sk_test_"))
    }

    /// Check if using Stripe live mode
    pub fn is_live_mode(&self) -> bool {
        self.api_key().is_some_and(|k| k.starts_with("sk_live_"))
    }

    fn api_key(&self) -> Option<&str> {
        self.stripe_api_key.as_deref().filter(|k| !k.is_empty())
    }

    fn webhook_secret(&self) -> Option<&str> {
        self.stripe_webhook_secret.as_deref().filter(|s| !s.is_empty())
    }

    /// Configured Stripe price id for `plan`.
    pub fn price_id(&self, plan: PaidPlan) -> Option<&str> {
        let price = match plan {
            PaidPlan::Monthly => &self.price_monthly,
            PaidPlan::Yearly => &self.price_yearly,
            PaidPlan::Lifetime => &self.price_lifetime,
        };
        price.as_deref().filter(|p| !p.is_empty())
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key().is_some()
    }

    /// API key wrapped so it never shows up in logs.
    pub fn api_key_secret(&self) -> Option<SecretString> {
        self.api_key().map(|k| SecretString::new(k.to_string()))
    }

    pub fn webhook_secret_secret(&self) -> Option<SecretString> {
        self.webhook_secret().map(|s| SecretString::new(s.to_string()))
    }

    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        // Verify key prefixes for safety
        if let Some(key) = self.api_key() {
            if !key.starts_with("sk_") {
                return Err(ValidationError::InvalidStripeKey);
            }
        }
        if let Some(secret) = self.webhook_secret() {
            if !secret.starts_with("whsec_") {
                return Err(ValidationError::InvalidStripeWebhookSecret);
            }
        }
        for plan in PaidPlan::ALL {
            if let Some(price) = self.price_id(plan) {
                if !price.starts_with("price_") {
                    return Err(ValidationError::InvalidStripePriceId(plan.to_string()));
                }
            }
        }
        Ok(())
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            stripe_api_key: None,
            stripe_webhook_secret: None,
            api_base_url: default_api_base_url(),
            price_monthly: None,
            price_yearly: None,
            price_lifetime: None,
        }
    }
}

fn default_api_base_url() -> String {
    DEFAULT_STRIPE_API_BASE.to_string()
}
