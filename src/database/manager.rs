use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::info;

use crate::config;
use crate::database::todos::StoreError;

/// Process-wide connection pool handle for the record store.
///
/// The pool is created lazily and never connects until the first query, so
/// the server can come up before the database does.
pub struct Db;

static POOL: OnceLock<PgPool> = OnceLock::new();

impl Db {
    pub fn pool() -> Result<PgPool, StoreError> {
        if let Some(pool) = POOL.get() {
            return Ok(pool.clone());
        }

        let db_config = &config::config().database;
        let pool = PgPoolOptions::new()
            .max_connections(db_config.max_connections)
            .acquire_timeout(Duration::from_secs(db_config.acquire_timeout_secs))
            .connect_lazy(&db_config.url)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        // A racing initializer may have won; the extra lazy pool is discarded
        // without ever having connected.
        let pool = POOL.get_or_init(|| pool).clone();
        info!("created record store pool");
        Ok(pool)
    }

    /// Pings the store to ensure connectivity
    pub async fn health_check() -> Result<(), StoreError> {
        let pool = Self::pool()?;
        sqlx::query("SELECT 1")
            .execute(&pool)
            .await
            .map_err(crate::database::todos::map_sqlx_error)?;
        Ok(())
    }

    /// Create the todos table if it does not exist yet.
    pub async fn ensure_schema() -> Result<(), StoreError> {
        let pool = Self::pool()?;
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS todos (
                owner_id       TEXT NOT NULL,
                record_id      UUID NOT NULL,
                name           TEXT NOT NULL,
                due_date       TEXT NOT NULL,
                done           BOOLEAN NOT NULL DEFAULT FALSE,
                created_at     TIMESTAMPTZ NOT NULL,
                attachment_url TEXT,
                PRIMARY KEY (owner_id, record_id)
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(crate::database::todos::map_sqlx_error)?;
        Ok(())
    }
}
