pub mod message_repo;
pub mod records;
pub mod user_repo;

use crate::config::StorageConfig;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::time::Duration;

pub type DbPool = Pool<Postgres>;

/// Initializes the database connection pool.
///
/// # Errors
/// Returns `sqlx::Error` if the connection fails.
pub async fn init_pool(config: &StorageConfig, database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(database_url)
        .await
}

/// Applies the embedded schema migrations.
///
/// # Errors
/// Returns `sqlx::migrate::MigrateError` if a migration fails to apply.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Pool for repository tests, migrated like production. `None` when `DATABASE_URL` is unset,
/// so the Postgres tests are skipped on machines without a database.
#[cfg(test)]
pub(crate) async fn test_pool() -> Option<DbPool> {
    let database_url = std::env::var("DATABASE_URL").ok()?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB. Is Postgres running?");
    run_migrations(&pool).await.expect("Failed to run migrations");
    Some(pool)
}
