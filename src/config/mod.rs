//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `RESEARCH_PILOT` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use research_pilot::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {}", config.server.socket_addr().unwrap());
//! ```

mod error;
mod features;
mod payment;
mod server;
mod storage;

pub use error::{ConfigError, ValidationError};
pub use features::FeatureFlags;
pub use payment::PaymentConfig;
pub use server::{Environment, ServerConfig};
pub use storage::{StorageBackend, StorageConfig};

use serde::Deserialize;

use crate::application::LifecyclePolicy;

/// Root configuration.
///
/// Every section has defaults, so an empty environment yields an in-memory
/// development server.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// Subscription store selection
    #[serde(default)]
    pub storage: StorageConfig,

    /// Stripe credentials.
    #[serde(default)]
    pub payment: PaymentConfig,

    #[serde(default)]
    pub features: FeatureFlags,
}

impl AppConfig {
    /// Read `.env` (when present) and the process environment.
    ///
    /// Variables carry the `RESEARCH_PILOT` prefix and nest with `__`:
    /// `RESEARCH_PILOT__STORAGE__BACKEND=postgres` sets `storage.backend`.
    /// Nothing is validated here; call [`AppConfig::validate`] afterwards.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("RESEARCH_PILOT")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Per-section checks, then the cross-section rules: production keeps
    /// trial reset off and payment verification on, and verification needs
    /// a Stripe key.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.storage.validate()?;
        self.payment.validate()?;

        if self.is_production() {
            if self.features.enable_trial_reset {
                return Err(ValidationError::TrialResetInProduction);
            }
            if !self.features.require_payment_verification {
                return Err(ValidationError::UnverifiedPaymentsInProduction);
            }
        }

        if self.features.require_payment_verification && !self.payment.has_api_key() {
            return Err(ValidationError::VerificationWithoutGateway);
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }

    /// Lifecycle behavior derived from feature flags and storage settings.
    pub fn lifecycle_policy(&self) -> LifecyclePolicy {
        LifecyclePolicy {
            allow_trial_reset: self.features.enable_trial_reset,
            max_write_attempts: self.storage.max_write_attempts,
        }
    }
}
