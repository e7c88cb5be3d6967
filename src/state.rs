//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use crate::auth::TokenVerifier;
use crate::config::AppConfig;
use crate::database::{Db, PgTodoStore};
use crate::services::TodoService;
use crate::storage::{AttachmentError, S3AttachmentStore};

#[derive(Clone)]
pub struct AppState {
    pub service: TodoService,
    pub verifier: TokenVerifier,
}

impl AppState {
    /// Wire the production stores and verifier from configuration.
    pub async fn from_config(config: &AppConfig) -> Result<Self, StateError> {
        let pool = Db::pool().map_err(|e| StateError::Database(e.to_string()))?;
        let records = Arc::new(PgTodoStore::new(pool));
        let attachments = Arc::new(S3AttachmentStore::new(&config.storage).await?);

        let service = TodoService::new(
            records,
            attachments,
            Duration::from_secs(config.storage.url_expiration_secs),
        );
        let verifier = TokenVerifier::new(&config.auth);

        Ok(Self { service, verifier })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("record store setup failed: {0}")]
    Database(String),
    #[error(transparent)]
    Attachments(#[from] AttachmentError),
}
