use std::str::FromStr;

use anyhow::{Context, Result};
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

pub static MIGRATOR: Migrator = sqlx::migrate!();

/// Opens the SQLite database (creating it if needed) and applies migrations.
///
/// The pool holds a single connection, so every query in the process is
/// serialized against the one file handle.
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    info!("Opening SQLite database at {database_url}");

    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("Invalid DATABASE_URL '{database_url}'"))?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open database at {database_url}"))?;

    MIGRATOR
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    info!("SQLite pool established, migrations applied");
    Ok(pool)
}

/// In-memory database with the schema applied. The connection is never
/// recycled, otherwise the data would vanish with it.
#[cfg(test)]
pub async fn test_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("valid in-memory url")
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .expect("Failed to create test database");
    MIGRATOR.run(&pool).await.expect("Failed to run migrations");
    pool
}
