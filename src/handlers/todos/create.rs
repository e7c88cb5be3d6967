use axum::{extract::State, Extension, Json};

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::models::{CreateTodoRequest, TodoItem};
use crate::state::AppState;

/// POST /todos - create a task record for the caller
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateTodoRequest>,
) -> Result<Json<TodoItem>, ApiError> {
    let item = state.service.create(&user.user_id, payload).await?;
    Ok(Json(item))
}
