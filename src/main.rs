use todo_api_rust::config;
use todo_api_rust::database::Db;
use todo_api_rust::routes::app;
use todo_api_rust::state::AppState;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, AUTH_JWKS_URL, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();
    tracing::info!("Starting Todo API in {:?} mode", config.environment);

    // Best-effort schema setup; the store may come up after the server does
    match tokio::time::timeout(std::time::Duration::from_secs(5), Db::ensure_schema()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "schema setup skipped, record store unavailable at startup")
        }
        Err(_) => tracing::warn!("schema setup timed out, record store unavailable at startup"),
    }

    let state = AppState::from_config(config)
        .await
        .unwrap_or_else(|e| panic!("failed to initialize application state: {}", e));

    let app = app(state);

    // Allow tests or deployments to override port via env
    let port = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(config.server.port);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("Todo API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}
