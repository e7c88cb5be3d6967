//! Record store adapter for task records.
//!
//! Thin pass-through to the `todos` table: every keyed operation carries the
//! `(owner_id, record_id)` compound key, so a caller can only ever touch its
//! own records.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{TodoItem, UpdateTodoRequest};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record {record_id} not found for owner {owner_id}")]
    RecordNotFound { owner_id: String, record_id: Uuid },

    #[error("record store unavailable: {0}")]
    Unavailable(String),

    #[error("query failed: {0}")]
    Query(String),
}

pub(crate) fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(err.to_string())
        }
        other => StoreError::Query(other.to_string()),
    }
}

/// Keyed access to task records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn query_by_owner(&self, owner_id: &str) -> Result<Vec<TodoItem>, StoreError>;

    async fn put(&self, item: &TodoItem) -> Result<(), StoreError>;

    async fn update_fields(
        &self,
        owner_id: &str,
        record_id: Uuid,
        update: &UpdateTodoRequest,
    ) -> Result<(), StoreError>;

    async fn update_attachment_url(
        &self,
        owner_id: &str,
        record_id: Uuid,
        attachment_url: &str,
    ) -> Result<(), StoreError>;

    async fn delete(&self, owner_id: &str, record_id: Uuid) -> Result<(), StoreError>;
}

/// Postgres-backed record store.
#[derive(Clone)]
pub struct PgTodoStore {
    pool: PgPool,
}

impl PgTodoStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn not_found(owner_id: &str, record_id: Uuid) -> StoreError {
        StoreError::RecordNotFound {
            owner_id: owner_id.to_string(),
            record_id,
        }
    }
}

#[async_trait]
impl RecordStore for PgTodoStore {
    async fn query_by_owner(&self, owner_id: &str) -> Result<Vec<TodoItem>, StoreError> {
        sqlx::query_as::<_, TodoItem>(
            "SELECT owner_id, record_id, name, due_date, done, created_at, attachment_url \
             FROM todos WHERE owner_id = $1",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }

    async fn put(&self, item: &TodoItem) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO todos (owner_id, record_id, name, due_date, done, created_at, attachment_url) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(&item.owner_id)
        .bind(item.record_id)
        .bind(&item.name)
        .bind(&item.due_date)
        .bind(item.done)
        .bind(item.created_at)
        .bind(&item.attachment_url)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn update_fields(
        &self,
        owner_id: &str,
        record_id: Uuid,
        update: &UpdateTodoRequest,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE todos SET name = $3, due_date = $4, done = $5 \
             WHERE owner_id = $1 AND record_id = $2",
        )
        .bind(owner_id)
        .bind(record_id)
        .bind(&update.name)
        .bind(&update.due_date)
        .bind(update.done)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(Self::not_found(owner_id, record_id));
        }
        Ok(())
    }

    async fn update_attachment_url(
        &self,
        owner_id: &str,
        record_id: Uuid,
        attachment_url: &str,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE todos SET attachment_url = $3 WHERE owner_id = $1 AND record_id = $2",
        )
        .bind(owner_id)
        .bind(record_id)
        .bind(attachment_url)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(Self::not_found(owner_id, record_id));
        }
        Ok(())
    }

    async fn delete(&self, owner_id: &str, record_id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM todos WHERE owner_id = $1 AND record_id = $2")
            .bind(owner_id)
            .bind(record_id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(Self::not_found(owner_id, record_id));
        }
        Ok(())
    }
}
