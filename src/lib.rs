#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::todo)]
#![warn(clippy::panic)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(unreachable_pub)]
#![warn(missing_debug_implementations)]
#![warn(unused_qualifications)]
#![deny(unused_must_use)]

pub mod adapters;
pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod services;
pub mod telemetry;

use crate::adapters::database::{self, message_repo::MessageRepository, user_repo::UserRepository};
use crate::adapters::memory::MemoryStore;
use crate::api::ServiceContainer;
use crate::config::{Config, StorageBackend};
use crate::domain::repository::{MessageStore, UserDirectory};
use crate::services::account_service::AccountService;
use crate::services::auth_service::AuthService;
use crate::services::health_service::HealthService;
use crate::services::message_service::MessageService;
use crate::services::rate_limit_service::RateLimitService;
use anyhow::Context;
use std::sync::Arc;
use tokio::sync::watch;

/// The storage backends the services run against.
#[derive(Clone, Debug)]
pub struct Stores {
    pub messages: Arc<dyn MessageStore>,
    pub users: Arc<dyn UserDirectory>,
}

impl Stores {
    /// Both traits served by one process-local store.
    #[must_use]
    pub fn memory() -> Self {
        let store = MemoryStore::new();
        Self { messages: Arc::new(store.clone()), users: Arc::new(store) }
    }

    /// Connects to Postgres and brings the schema up to date.
    ///
    /// # Errors
    /// Returns an error if the pool cannot connect or a migration fails.
    pub async fn postgres(config: &Config) -> anyhow::Result<Self> {
        let url = config
            .storage
            .database_url
            .as_deref()
            .context("--database-url (JOBBOARD_DATABASE_URL) is required for the postgres backend")?;

        let pool = database::init_pool(&config.storage, url).await.context("failed to connect to Postgres")?;
        database::run_migrations(&pool).await.context("failed to run database migrations")?;
        tracing::info!("Database migrations applied");

        Ok(Self { messages: Arc::new(MessageRepository::new(pool.clone())), users: Arc::new(UserRepository::new(pool)) })
    }

    /// Builds the backend selected by `storage.backend`.
    ///
    /// # Errors
    /// Returns an error if the selected backend cannot be initialized.
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        match config.storage.backend {
            StorageBackend::Postgres => Self::postgres(config).await,
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage; data is lost on restart");
                Ok(Self::memory())
            }
        }
    }
}

/// Everything the two routers need.
#[derive(Debug)]
pub struct App {
    pub services: ServiceContainer,
    pub health_service: HealthService,
}

impl App {
    #[must_use]
    pub fn new(config: &Config, stores: Stores) -> Self {
        let auth_service = AuthService::new(config.auth.clone());
        let account_service = AccountService::new(Arc::clone(&stores.users), auth_service.clone());
        let message_service =
            MessageService::new(Arc::clone(&stores.messages), Arc::clone(&stores.users), config.messaging.clone());
        let rate_limit_service = RateLimitService::new(config.server.trusted_proxies.clone());
        let health_service = HealthService::new(stores.messages, config.health.clone());

        Self {
            services: ServiceContainer { account_service, auth_service, message_service, rate_limit_service },
            health_service,
        }
    }
}

/// Routes panics through `tracing` so they reach the configured log sink.
pub fn setup_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let location = info.location().map(|l| format!("{}:{}", l.file(), l.line())).unwrap_or_default();
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .map(ToString::to_string)
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_default();

        tracing::error!(panic.location = %location, panic.payload = %payload, "Thread panicked");
    }));
}

/// Flips `shutdown_tx` to `true` on SIGINT or SIGTERM.
pub fn spawn_signal_handler(shutdown_tx: watch::Sender<bool>) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to listen for SIGTERM");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            () = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
            () = terminate => tracing::info!("Received SIGTERM, shutting down"),
        }

        let _ = shutdown_tx.send(true);
    });
}
