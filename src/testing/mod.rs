//! In-memory store doubles for service-level tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::database::{RecordStore, StoreError};
use crate::models::{TodoItem, UpdateTodoRequest};
use crate::storage::{AttachmentError, AttachmentStore};

/// Record store over a plain map keyed by `(owner_id, record_id)`.
#[derive(Default)]
pub struct MemoryTodoStore {
    items: Mutex<HashMap<(String, Uuid), TodoItem>>,
}

impl MemoryTodoStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn not_found(owner_id: &str, record_id: Uuid) -> StoreError {
        StoreError::RecordNotFound {
            owner_id: owner_id.to_string(),
            record_id,
        }
    }
}

#[async_trait]
impl RecordStore for MemoryTodoStore {
    async fn query_by_owner(&self, owner_id: &str) -> Result<Vec<TodoItem>, StoreError> {
        let items = self.items.lock().unwrap();
        Ok(items
            .values()
            .filter(|item| item.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn put(&self, item: &TodoItem) -> Result<(), StoreError> {
        let mut items = self.items.lock().unwrap();
        items.insert((item.owner_id.clone(), item.record_id), item.clone());
        Ok(())
    }

    async fn update_fields(
        &self,
        owner_id: &str,
        record_id: Uuid,
        update: &UpdateTodoRequest,
    ) -> Result<(), StoreError> {
        let mut items = self.items.lock().unwrap();
        let item = items
            .get_mut(&(owner_id.to_string(), record_id))
            .ok_or_else(|| Self::not_found(owner_id, record_id))?;
        item.name = update.name.clone();
        item.due_date = update.due_date.clone();
        item.done = update.done;
        Ok(())
    }

    async fn update_attachment_url(
        &self,
        owner_id: &str,
        record_id: Uuid,
        attachment_url: &str,
    ) -> Result<(), StoreError> {
        let mut items = self.items.lock().unwrap();
        let item = items
            .get_mut(&(owner_id.to_string(), record_id))
            .ok_or_else(|| Self::not_found(owner_id, record_id))?;
        item.attachment_url = Some(attachment_url.to_string());
        Ok(())
    }

    async fn delete(&self, owner_id: &str, record_id: Uuid) -> Result<(), StoreError> {
        let mut items = self.items.lock().unwrap();
        items
            .remove(&(owner_id.to_string(), record_id))
            .map(|_| ())
            .ok_or_else(|| Self::not_found(owner_id, record_id))
    }
}

/// Attachment store that fabricates signed-looking URLs and records deletes.
pub struct MemoryAttachmentStore {
    bucket: String,
    deleted: Mutex<Vec<String>>,
}

impl MemoryAttachmentStore {
    pub fn new(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            deleted: Mutex::new(Vec::new()),
        }
    }

    pub fn deleted_keys(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl AttachmentStore for MemoryAttachmentStore {
    async fn sign_upload_url(&self, key: &str, ttl: Duration) -> Result<String, AttachmentError> {
        Ok(format!(
            "https://{}.s3.amazonaws.com/{}?X-Amz-Expires={}&X-Amz-Signature=deadbeef",
            self.bucket,
            key,
            ttl.as_secs()
        ))
    }

    async fn delete_object(&self, key: &str) -> Result<(), AttachmentError> {
        self.deleted.lock().unwrap().push(key.to_string());
        Ok(())
    }
}
