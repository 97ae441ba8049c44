// Persistence layer for accounts.
// The identity service only sees the `AccountStore` trait; PostgreSQL and the
// in-memory store are interchangeable behind it.

pub mod config;
pub mod models;
pub mod repositories;

pub use config::DatabaseConfig;
pub use repositories::{AccountRepository, AccountStore, InMemoryAccountStore, StoreError};
pub use sqlx;

use anyhow::{Context, Result};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

/// Database connection manager
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        tracing::info!(database = %config.display_target(), "Connecting to database");
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .connect(&config.database_url)
            .await
            .context("Failed to connect to database")?;
        tracing::info!(max_connections = config.max_connections, "Database pool created");

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run migrations")?;
        Ok(())
    }
}
