use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A single task record, keyed by `(owner_id, record_id)`.
///
/// `owner_id` is the subject claim of the authenticated caller; `record_id`
/// is generated at creation and unique within the owner's set. `created_at`
/// and the initial `done = false` are set once at creation and never touched
/// by updates. `attachment_url` is populated only by the upload-URL flow and
/// holds the query-string-free base of the last issued pre-signed URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    pub owner_id: String,
    pub record_id: Uuid,
    pub name: String,
    pub due_date: String,
    pub done: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_url: Option<String>,
}

/// Caller-supplied fields for creating a task record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodoRequest {
    pub name: String,
    pub due_date: String,
}

/// Caller-supplied fields for updating a task record.
///
/// All three fields are required: the update always overwrites all of them,
/// so a request with an absent field is rejected at deserialization instead
/// of silently blanking the stored value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodoRequest {
    pub name: String,
    pub due_date: String,
    pub done: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn todo_item_serializes_to_camel_case() {
        let item = TodoItem {
            owner_id: "u1".to_string(),
            record_id: Uuid::nil(),
            name: "Buy milk".to_string(),
            due_date: "2024-01-01".to_string(),
            done: false,
            created_at: Utc::now(),
            attachment_url: None,
        };

        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["ownerId"], "u1");
        assert_eq!(value["dueDate"], "2024-01-01");
        assert_eq!(value["done"], false);
        assert!(
            value.get("attachmentUrl").is_none(),
            "unset attachment url must be omitted from the wire format"
        );
    }

    #[test]
    fn todo_item_serializes_attachment_url_when_present() {
        let item = TodoItem {
            owner_id: "u1".to_string(),
            record_id: Uuid::nil(),
            name: "Buy milk".to_string(),
            due_date: "2024-01-01".to_string(),
            done: true,
            created_at: Utc::now(),
            attachment_url: Some("https://bucket.s3.amazonaws.com/key".to_string()),
        };

        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["attachmentUrl"], "https://bucket.s3.amazonaws.com/key");
    }

    #[test]
    fn update_request_requires_all_fields() {
        let err = serde_json::from_str::<UpdateTodoRequest>(r#"{"name": "x", "dueDate": "2024-01-01"}"#);
        assert!(err.is_err(), "missing done must be rejected");

        let ok = serde_json::from_str::<UpdateTodoRequest>(
            r#"{"name": "x", "dueDate": "2024-01-01", "done": true}"#,
        );
        assert!(ok.is_ok());
    }

    #[test]
    fn create_request_accepts_camel_case() {
        let req: CreateTodoRequest =
            serde_json::from_str(r#"{"name": "Buy milk", "dueDate": "2024-01-01"}"#).unwrap();
        assert_eq!(req.name, "Buy milk");
        assert_eq!(req.due_date, "2024-01-01");
    }
}
