//! Task service: orchestrates the record store and the attachment store.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use crate::database::{RecordStore, StoreError};
use crate::models::{CreateTodoRequest, TodoItem, UpdateTodoRequest};
use crate::storage::{AttachmentError, AttachmentStore};

#[derive(Debug, thiserror::Error)]
pub enum TodoError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Attachment(#[from] AttachmentError),
}

/// Orchestrates task-record CRUD and the attachment-upload flow.
///
/// Cloning is cheap; clones share the underlying stores.
#[derive(Clone)]
pub struct TodoService {
    records: Arc<dyn RecordStore>,
    attachments: Arc<dyn AttachmentStore>,
    url_expiration: Duration,
}

impl TodoService {
    pub fn new(
        records: Arc<dyn RecordStore>,
        attachments: Arc<dyn AttachmentStore>,
        url_expiration: Duration,
    ) -> Self {
        Self {
            records,
            attachments,
            url_expiration,
        }
    }

    /// All records owned by `owner`. An owner with no records gets an empty
    /// list, not an error.
    pub async fn list(&self, owner: &str) -> Result<Vec<TodoItem>, TodoError> {
        tracing::info!(owner = %owner, "listing todo items");
        Ok(self.records.query_by_owner(owner).await?)
    }

    /// Create a record with a generated id and creation timestamp. `done`
    /// always starts false.
    pub async fn create(
        &self,
        owner: &str,
        request: CreateTodoRequest,
    ) -> Result<TodoItem, TodoError> {
        let item = TodoItem {
            owner_id: owner.to_string(),
            record_id: Uuid::new_v4(),
            name: request.name,
            due_date: request.due_date,
            done: false,
            created_at: Utc::now(),
            attachment_url: None,
        };

        tracing::info!(owner = %owner, record_id = %item.record_id, "creating todo item");
        self.records.put(&item).await?;
        Ok(item)
    }

    /// Overwrite the caller-mutable fields of an existing record.
    pub async fn update(
        &self,
        owner: &str,
        record_id: Uuid,
        request: UpdateTodoRequest,
    ) -> Result<(), TodoError> {
        tracing::info!(owner = %owner, record_id = %record_id, "updating todo item");
        self.records.update_fields(owner, record_id, &request).await?;
        Ok(())
    }

    /// Issue a pre-signed upload URL for the record's attachment and persist
    /// its query-string-free base onto the record.
    ///
    /// The two steps are not atomic. If persisting the base URL fails, the
    /// signed URL is already issued; the failure is logged with enough
    /// context to reconcile by hand and then propagated.
    pub async fn generate_upload_url(
        &self,
        owner: &str,
        record_id: Uuid,
    ) -> Result<String, TodoError> {
        tracing::info!(owner = %owner, record_id = %record_id, "generating upload url");

        let upload_url = self
            .attachments
            .sign_upload_url(&record_id.to_string(), self.url_expiration)
            .await?;

        let attachment_url = base_url(&upload_url);
        if let Err(e) = self
            .records
            .update_attachment_url(owner, record_id, &attachment_url)
            .await
        {
            tracing::error!(
                owner = %owner,
                record_id = %record_id,
                step = "persist-attachment-url",
                error = %e,
                "upload url issued but not linked to record"
            );
            return Err(e.into());
        }

        Ok(upload_url)
    }

    /// Delete a record and its attachment object.
    ///
    /// The record goes first; if the object deletion then fails the record is
    /// already gone and the object is orphaned. There is no compensation,
    /// only a log line carrying the context needed for manual cleanup.
    pub async fn delete(&self, owner: &str, record_id: Uuid) -> Result<(), TodoError> {
        tracing::info!(owner = %owner, record_id = %record_id, "deleting todo item");
        self.records.delete(owner, record_id).await?;

        if let Err(e) = self.attachments.delete_object(&record_id.to_string()).await {
            tracing::error!(
                owner = %owner,
                record_id = %record_id,
                step = "delete-attachment",
                error = %e,
                "record deleted but attachment object remains"
            );
        }
        Ok(())
    }
}

/// Strip query string and fragment from a URL, leaving the object's base
/// address. Falls back to a plain split for values the url crate rejects.
fn base_url(signed_url: &str) -> String {
    match url::Url::parse(signed_url) {
        Ok(mut parsed) => {
            parsed.set_query(None);
            parsed.set_fragment(None);
            parsed.to_string()
        }
        Err(_) => signed_url
            .split('?')
            .next()
            .unwrap_or(signed_url)
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryAttachmentStore, MemoryTodoStore};

    fn service() -> (TodoService, Arc<MemoryTodoStore>, Arc<MemoryAttachmentStore>) {
        let records = Arc::new(MemoryTodoStore::new());
        let attachments = Arc::new(MemoryAttachmentStore::new("test-bucket"));
        let service = TodoService::new(
            records.clone(),
            attachments.clone(),
            Duration::from_secs(300),
        );
        (service, records, attachments)
    }

    fn create_request(name: &str) -> CreateTodoRequest {
        CreateTodoRequest {
            name: name.to_string(),
            due_date: "2024-01-01".to_string(),
        }
    }

    #[tokio::test]
    async fn create_generates_id_timestamp_and_open_state() {
        let (service, _, _) = service();

        let item = service.create("u1", create_request("Buy milk")).await.unwrap();

        assert_eq!(item.owner_id, "u1");
        assert_eq!(item.name, "Buy milk");
        assert_eq!(item.due_date, "2024-01-01");
        assert!(!item.done, "new records must start not-done");
        assert!(item.attachment_url.is_none());
    }

    #[tokio::test]
    async fn created_record_ids_are_unique_within_owner() {
        let (service, _, _) = service();

        let a = service.create("u1", create_request("a")).await.unwrap();
        let b = service.create("u1", create_request("b")).await.unwrap();
        let c = service.create("u1", create_request("c")).await.unwrap();

        assert_ne!(a.record_id, b.record_id);
        assert_ne!(b.record_id, c.record_id);
        assert_ne!(a.record_id, c.record_id);
    }

    #[tokio::test]
    async fn list_round_trips_created_records() {
        let (service, _, _) = service();

        let created = service.create("u1", create_request("Buy milk")).await.unwrap();
        let listed = service.list("u1").await.unwrap();

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0], created);
    }

    #[tokio::test]
    async fn list_is_scoped_to_the_owner() {
        let (service, _, _) = service();

        service.create("u1", create_request("mine")).await.unwrap();
        service.create("u1", create_request("also mine")).await.unwrap();
        service.create("u2", create_request("theirs")).await.unwrap();

        let mine = service.list("u1").await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|item| item.owner_id == "u1"));

        let theirs = service.list("u2").await.unwrap();
        assert_eq!(theirs.len(), 1);
        assert_eq!(theirs[0].name, "theirs");
    }

    #[tokio::test]
    async fn list_returns_empty_for_unknown_owner() {
        let (service, _, _) = service();
        assert!(service.list("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_overwrites_mutable_fields_and_is_idempotent() {
        let (service, _, _) = service();

        let created = service.create("u1", create_request("Buy milk")).await.unwrap();
        let update = UpdateTodoRequest {
            name: "Buy oat milk".to_string(),
            due_date: "2024-02-01".to_string(),
            done: true,
        };

        service.update("u1", created.record_id, update.clone()).await.unwrap();
        let after_first = service.list("u1").await.unwrap();

        service.update("u1", created.record_id, update).await.unwrap();
        let after_second = service.list("u1").await.unwrap();

        assert_eq!(after_first, after_second, "re-applying an update must not change state");
        let item = &after_second[0];
        assert_eq!(item.name, "Buy oat milk");
        assert_eq!(item.due_date, "2024-02-01");
        assert!(item.done);
        assert_eq!(item.created_at, created.created_at, "creation timestamp is immutable");
    }

    #[tokio::test]
    async fn update_of_unknown_record_is_not_found() {
        let (service, _, _) = service();

        let result = service
            .update(
                "u1",
                Uuid::new_v4(),
                UpdateTodoRequest {
                    name: "x".to_string(),
                    due_date: "2024-01-01".to_string(),
                    done: false,
                },
            )
            .await;

        assert!(matches!(
            result,
            Err(TodoError::Store(StoreError::RecordNotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn update_cannot_cross_owners() {
        let (service, _, _) = service();

        let created = service.create("u1", create_request("mine")).await.unwrap();
        let result = service
            .update(
                "u2",
                created.record_id,
                UpdateTodoRequest {
                    name: "stolen".to_string(),
                    due_date: "2024-01-01".to_string(),
                    done: true,
                },
            )
            .await;

        assert!(matches!(
            result,
            Err(TodoError::Store(StoreError::RecordNotFound { .. }))
        ));
        assert_eq!(service.list("u1").await.unwrap()[0].name, "mine");
    }

    #[tokio::test]
    async fn delete_removes_record_and_attachment_object() {
        let (service, _, attachments) = service();

        let created = service.create("u1", create_request("Buy milk")).await.unwrap();
        service.delete("u1", created.record_id).await.unwrap();

        assert!(service.list("u1").await.unwrap().is_empty());
        assert_eq!(
            attachments.deleted_keys(),
            vec![created.record_id.to_string()],
            "attachment object keyed by record id must be deleted too"
        );
    }

    #[tokio::test]
    async fn second_delete_is_not_found_and_does_not_resurrect() {
        let (service, _, _) = service();

        let created = service.create("u1", create_request("Buy milk")).await.unwrap();
        service.delete("u1", created.record_id).await.unwrap();

        let second = service.delete("u1", created.record_id).await;
        assert!(matches!(
            second,
            Err(TodoError::Store(StoreError::RecordNotFound { .. }))
        ));
        assert!(service.list("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn upload_url_base_is_persisted_on_the_record() {
        let (service, _, _) = service();

        let created = service.create("u1", create_request("Buy milk")).await.unwrap();
        let upload_url = service
            .generate_upload_url("u1", created.record_id)
            .await
            .unwrap();

        assert!(upload_url.contains('?'), "signed url must carry signature parameters");
        assert!(upload_url.contains(&created.record_id.to_string()));

        let listed = service.list("u1").await.unwrap();
        let stored = listed[0].attachment_url.as_deref().unwrap();
        assert_eq!(stored, base_url(&upload_url));
        assert!(upload_url.starts_with(stored));
    }

    #[tokio::test]
    async fn upload_url_for_unknown_record_is_not_found() {
        let (service, _, _) = service();

        let result = service.generate_upload_url("u1", Uuid::new_v4()).await;
        assert!(matches!(
            result,
            Err(TodoError::Store(StoreError::RecordNotFound { .. }))
        ));
    }

    #[test]
    fn base_url_strips_query_and_fragment() {
        assert_eq!(
            base_url("https://bucket.s3.amazonaws.com/key?X-Amz-Signature=abc&X-Amz-Expires=300"),
            "https://bucket.s3.amazonaws.com/key"
        );
        assert_eq!(
            base_url("https://bucket.s3.amazonaws.com/key"),
            "https://bucket.s3.amazonaws.com/key"
        );
        assert_eq!(base_url("not a url?x=1"), "not a url");
    }
}
