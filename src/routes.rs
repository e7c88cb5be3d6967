//! Route configuration.

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers::{health, todos};
use crate::middleware::{auth_middleware, cors_middleware};
use crate::state::AppState;

/// Create the application router.
pub fn app(state: AppState) -> Router {
    // Every /todos route requires a verified bearer token
    let todo_routes = Router::new()
        .route("/todos", get(todos::list).post(todos::create))
        .route("/todos/:todo_id", patch(todos::update).delete(todos::delete))
        .route("/todos/:todo_id/attachment", post(todos::generate_upload_url))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        // Public
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .merge(todo_routes)
        // Global middleware (outermost first: trace, then CORS on every response)
        .layer(middleware::from_fn(cors_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
