//! Attachment store adapter backed by an S3-compatible object store.
//!
//! Attachments are uploaded by the client directly against a time-limited
//! pre-signed PUT URL; this service only signs URLs and deletes objects.
//! Objects are keyed by record id.

use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::Client;
use tracing::instrument;

use crate::config::StorageConfig;

#[derive(Debug, thiserror::Error)]
pub enum AttachmentError {
    #[error("attachment store misconfigured: {0}")]
    Config(String),

    #[error("failed to sign upload url for {key}: {message}")]
    Sign { key: String, message: String },

    #[error("failed to delete attachment object {key}: {message}")]
    Delete { key: String, message: String },
}

/// Pre-signed upload URL issuance and object deletion.
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    /// Sign a PUT URL for `key` that the object store rejects after `ttl`.
    async fn sign_upload_url(&self, key: &str, ttl: Duration) -> Result<String, AttachmentError>;

    /// Delete the object stored under `key`. Deleting a key that was never
    /// uploaded is not an error.
    async fn delete_object(&self, key: &str) -> Result<(), AttachmentError>;
}

/// S3-backed attachment store.
#[derive(Clone)]
pub struct S3AttachmentStore {
    client: Client,
    bucket: String,
}

impl std::fmt::Debug for S3AttachmentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3AttachmentStore")
            .field("bucket", &self.bucket)
            .finish_non_exhaustive()
    }
}

impl S3AttachmentStore {
    pub async fn new(config: &StorageConfig) -> Result<Self, AttachmentError> {
        let has_access_key_id = config.access_key_id.is_some();
        let has_secret_access_key = config.secret_access_key.is_some();
        if has_access_key_id ^ has_secret_access_key {
            return Err(AttachmentError::Config(
                "storage config requires both access_key_id and secret_access_key when either is set"
                    .to_string(),
            ));
        }

        let region = aws_config::Region::new(config.region.clone());

        // Explicit credentials when configured, otherwise the ambient AWS
        // credential chain (env, profile, instance role).
        let mut builder = if let (Some(key_id), Some(secret)) =
            (&config.access_key_id, &config.secret_access_key)
        {
            let credentials = aws_sdk_s3::config::Credentials::new(
                key_id.clone(),
                secret.clone(),
                None, // session token
                None, // expiration
                "todo-api-config",
            );
            aws_sdk_s3::config::Builder::new()
                .behavior_version(BehaviorVersion::latest())
                .region(region)
                .credentials_provider(credentials)
        } else {
            let shared = aws_config::defaults(BehaviorVersion::latest())
                .region(region)
                .load()
                .await;
            aws_sdk_s3::config::Builder::from(&shared)
        };

        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }
        if config.force_path_style {
            builder = builder.force_path_style(true);
        }

        Ok(Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket.clone(),
        })
    }
}

#[async_trait]
impl AttachmentStore for S3AttachmentStore {
    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn sign_upload_url(&self, key: &str, ttl: Duration) -> Result<String, AttachmentError> {
        let presigning = PresigningConfig::expires_in(ttl)
            .map_err(|e| AttachmentError::Config(e.to_string()))?;

        let request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| AttachmentError::Sign {
                key: key.to_string(),
                message: e.to_string(),
            })?;

        Ok(request.uri().to_string())
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn delete_object(&self, key: &str) -> Result<(), AttachmentError> {
        // S3 DeleteObject succeeds for missing keys, which is what we want:
        // most records never had an attachment uploaded.
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| AttachmentError::Delete {
                key: key.to_string(),
                message: e.to_string(),
            })?;

        Ok(())
    }
}
