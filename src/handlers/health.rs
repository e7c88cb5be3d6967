use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::database::Db;

/// GET / - service metadata
pub async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "name": "Todo API (Rust)",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "todos": "/todos (bearer token required)",
            "attachment": "/todos/:todoId/attachment (bearer token required)",
            "health": "/health (public)"
        }
    }))
}

/// GET /health - liveness check, reports record store connectivity
pub async fn health() -> impl IntoResponse {
    let now = chrono::Utc::now();

    match Db::health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "degraded",
                "timestamp": now,
                "database_error": e.to_string()
            })),
        ),
    }
}
