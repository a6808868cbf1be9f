//! Session-store migration commands.
//!
//! Neither web app keeps domain data locally; the only tables are the
//! session stores, created here rather than on server startup.
//!
//! # Usage
//!
//! ```bash
//! pawpal-cli migrate storefront
//! pawpal-cli migrate admin
//! pawpal-cli migrate all
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string for storefront sessions
//! - `ADMIN_DATABASE_URL` - `PostgreSQL` connection string for back-office sessions
//! - `DATABASE_URL` - Fallback for either of the above

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use thiserror::Error;
use tower_sessions_sqlx_store::PostgresStore;

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0} (or DATABASE_URL)")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Create the storefront session table (`tower_sessions.session`).
///
/// # Errors
///
/// Returns an error if the database URL is missing or the migration fails.
pub async fn storefront() -> Result<(), MigrationError> {
    let pool = connect("STOREFRONT_DATABASE_URL").await?;

    tracing::info!("Running storefront session migrations...");
    PostgresStore::new(pool).migrate().await?;

    tracing::info!("Storefront migrations complete");
    Ok(())
}

/// Create the back-office session table (`admin.session`).
///
/// # Errors
///
/// Returns an error if the database URL is missing or the migration fails.
pub async fn admin() -> Result<(), MigrationError> {
    let pool = connect("ADMIN_DATABASE_URL").await?;

    tracing::info!("Running admin session migrations...");
    pawpal_admin::middleware::session_store(&pool).migrate().await?;

    tracing::info!("Admin migrations complete");
    Ok(())
}

async fn connect(key: &'static str) -> Result<PgPool, MigrationError> {
    let _ = dotenvy::dotenv();
    let url = database_url(key, |k| std::env::var(k).ok())?;

    tracing::info!("Connecting to database ({key})...");
    Ok(PgPool::connect(url.expose_secret()).await?)
}

/// Resolve `key`, falling back to `DATABASE_URL`.
fn database_url(
    key: &'static str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<SecretString, MigrationError> {
    let non_empty = |k: &str| lookup(k).filter(|url| !url.trim().is_empty());
    non_empty(key)
        .or_else(|| non_empty("DATABASE_URL"))
        .map(SecretString::from)
        .ok_or(MigrationError::MissingEnvVar(key))
}
