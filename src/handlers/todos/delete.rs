use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension,
};
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::state::AppState;

/// DELETE /todos/:todoId - delete a task record and its attachment
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(todo_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.service.delete(&user.user_id, todo_id).await?;
    Ok(StatusCode::OK)
}
