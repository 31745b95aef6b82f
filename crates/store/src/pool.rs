//! MySQL connection pool.

use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use tracing::info;

use crate::config::StoreConfig;
use crate::engine::CrudEngine;
use crate::lookup::HashedLookup;
use crate::{Result, StoreError};

/// Owner of the shared pool for one store.
///
/// Hand out [`CrudEngine`]s and [`HashedLookup`]s from it; [`Driver::stop`]
/// consumes the driver, so the pool is closed at most once through it.
#[derive(Debug)]
pub struct Driver {
    pool: MySqlPool,
    database: String,
}

impl Driver {
    /// Open the pool and verify the store answers a round trip.
    pub async fn init(config: &StoreConfig) -> Result<Self> {
        info!(
            dsn = %config.dsn_redacted(),
            max_connections = config.max_connections,
            "connecting to store"
        );
        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout())
            .connect_with(config.connect_options())
            .await
            .map_err(StoreError::Connection)?;

        let driver = Self {
            pool,
            database: config.database.clone(),
        };
        driver.ping().await?;
        info!(database = %driver.database, "store ready");
        Ok(driver)
    }

    /// Round-trip health check.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(StoreError::Connection)?;
        Ok(())
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn engine(&self) -> CrudEngine {
        CrudEngine::new(self.pool.clone())
    }

    /// Fails with `InvalidTable` on names `TablePair` would reject.
    pub fn lookup(&self, content_table: &str, hash_table: &str) -> Result<HashedLookup> {
        HashedLookup::new(self.pool.clone(), content_table, hash_table)
    }

    /// Close the pool, waiting for in-flight operations to finish.
    ///
    /// Engines handed out earlier fail with `Query` errors afterwards.
    pub async fn stop(self) {
        info!(database = %self.database, "closing store");
        self.pool.close().await;
    }
}
