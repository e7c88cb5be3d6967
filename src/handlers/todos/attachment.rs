use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlResponse {
    pub upload_url: String,
}

/// POST /todos/:todoId/attachment - issue a pre-signed upload URL and link
/// its base address to the record
pub async fn generate_upload_url(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(todo_id): Path<Uuid>,
) -> Result<Json<UploadUrlResponse>, ApiError> {
    let upload_url = state
        .service
        .generate_upload_url(&user.user_id, todo_id)
        .await?;
    Ok(Json(UploadUrlResponse { upload_url }))
}
