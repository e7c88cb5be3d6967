use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::models::UpdateTodoRequest;
use crate::state::AppState;

/// PATCH /todos/:todoId - overwrite the mutable fields of a task record
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(todo_id): Path<Uuid>,
    Json(payload): Json<UpdateTodoRequest>,
) -> Result<StatusCode, ApiError> {
    state.service.update(&user.user_id, todo_id, payload).await?;
    Ok(StatusCode::OK)
}
