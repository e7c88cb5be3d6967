use axum::{extract::State, Extension, Json};

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::models::TodoItem;
use crate::state::AppState;

/// GET /todos - list the caller's task records
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<TodoItem>>, ApiError> {
    let items = state.service.list(&user.user_id).await?;
    Ok(Json(items))
}
