//! Research Pilot subscription server.
//!
//! Configuration comes from `RESEARCH_PILOT__*` environment variables (and a
//! `.env` file in development); see `research_pilot::config`.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use research_pilot::adapters::clock::SystemClock;
use research_pilot::adapters::http::{app_router, with_middleware, SubscriptionAppState};
use research_pilot::adapters::postgres::{PostgresPaymentLedger, PostgresSubscriptionStore};
use research_pilot::adapters::redis::{RedisPaymentLedger, RedisSubscriptionStore};
use research_pilot::adapters::storage::{
    FilePaymentLedger, FileSubscriptionStore, InMemoryPaymentLedger, InMemorySubscriptionStore,
};
use research_pilot::adapters::stripe::{StripeCheckoutVerifier, StripeConfig};
use research_pilot::application::SubscriptionLifecycle;
use research_pilot::config::{
    AppConfig, ConfigError, ServerConfig, StorageBackend, StorageConfig, ValidationError,
};
use research_pilot::domain::subscription::{PaidPlan, StripeWebhookVerifier};
use research_pilot::ports::{PaymentLedger, PaymentVerifier, StoreError, SubscriptionStore};

/// Failures that abort startup.
#[derive(Debug, Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database connection failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Redis connection failed: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Store initialization failed: {0}")]
    Store(#[from] StoreError),

    #[error("Server I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ValidationError> for StartupError {
    fn from(err: ValidationError) -> Self {
        StartupError::Config(ConfigError::from(err))
    }
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    let config = AppConfig::load()?;
    init_tracing(&config.server);

    if let Err(err) = config.validate() {
        tracing::error!(error = %err, "Invalid configuration");
        return Err(err.into());
    }

    let storage = build_storage(&config.storage).await?;
    let lifecycle = Arc::new(SubscriptionLifecycle::new(
        storage.store,
        Arc::new(SystemClock::new()),
        config.lifecycle_policy(),
    ));

    let payment_verifier = config.payment.api_key_secret().map(|key| {
        let mut stripe =
            StripeConfig::new(key).with_base_url(config.payment.api_base_url.clone());
        for plan in PaidPlan::ALL {
            match config.payment.price_id(plan) {
                Some(price) => stripe = stripe.with_price(plan, price),
                None => tracing::warn!(%plan, "No Stripe price configured; checkout unavailable"),
            }
        }
        Arc::new(StripeCheckoutVerifier::new(stripe)) as Arc<dyn PaymentVerifier>
    });
    let webhook_verifier = config
        .payment
        .webhook_secret_secret()
        .map(|secret| Arc::new(StripeWebhookVerifier::new(secret)));

    if !config.features.require_payment_verification {
        tracing::warn!("Payment verification disabled; activations are trusted");
    }
    if webhook_verifier.is_none() {
        tracing::warn!("No Stripe webhook secret configured; webhook deliveries will be refused");
    }

    let state = SubscriptionAppState {
        lifecycle,
        payment_ledger: storage.ledger,
        payment_verifier,
        webhook_verifier,
        require_payment_verification: config.features.require_payment_verification,
        verbose_errors: config.features.verbose_errors,
    };
    let app = with_middleware(app_router(state), &config.server, &config.features);

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(
        %addr,
        environment = ?config.server.environment,
        storage = ?config.storage.backend,
        trial_reset = config.features.enable_trial_reset,
        "Research Pilot listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// JSON logs in production, human-readable otherwise. `RUST_LOG` wins over
/// the configured level.
fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&server.log_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if server.is_production() {
        builder.json().init();
    } else {
        builder.pretty().init();
    }
}

/// Subscription records and redeemed checkout sessions, always on the same
/// backend.
struct Storage {
    store: Arc<dyn SubscriptionStore>,
    ledger: Arc<dyn PaymentLedger>,
}

async fn build_storage(config: &StorageConfig) -> Result<Storage, StartupError> {
    let storage = match config.backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory subscription store; state is lost on restart");
            Storage {
                store: Arc::new(InMemorySubscriptionStore::new()),
                ledger: Arc::new(InMemoryPaymentLedger::new()),
            }
        }
        StorageBackend::File => {
            let dir = config
                .data_dir
                .as_ref()
                .ok_or(ValidationError::MissingRequired("STORAGE__DATA_DIR"))?;
            let redemptions = config.redemption_dir(dir);
            tokio::fs::create_dir_all(&redemptions).await?;
            Storage {
                store: Arc::new(FileSubscriptionStore::new(dir)),
                ledger: Arc::new(FilePaymentLedger::new(redemptions)),
            }
        }
        StorageBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or(ValidationError::MissingRequired("STORAGE__DATABASE_URL"))?;
            let pool = PgPoolOptions::new()
                .max_connections(config.max_connections)
                .connect(url)
                .await?;
            let store = PostgresSubscriptionStore::new(pool.clone());
            store.ensure_schema().await?;
            let ledger = PostgresPaymentLedger::new(pool);
            ledger.ensure_schema().await?;
            Storage {
                store: Arc::new(store),
                ledger: Arc::new(ledger),
            }
        }
        StorageBackend::Redis => {
            let url = config
                .redis_url
                .as_deref()
                .ok_or(ValidationError::MissingRequired("STORAGE__REDIS_URL"))?;
            let client = redis::Client::open(url)?;
            let conn = client.get_multiplexed_async_connection().await?;
            Storage {
                store: Arc::new(RedisSubscriptionStore::new(
                    conn.clone(),
                    config.key_prefix.clone(),
                )),
                ledger: Arc::new(RedisPaymentLedger::new(conn, config.redemption_key_prefix())),
            }
        }
    };

    Ok(storage)
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
