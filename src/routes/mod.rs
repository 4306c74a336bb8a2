use std::sync::Arc;
use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use crate::AppState;

pub mod datasets;

/// Full application router: dataset routes, health check, CORS and tracing.
pub fn app(state: Arc<AppState>) -> Router {
    let cors = datasets::cors_layer(&state.config.allowed_origins);

    Router::new()
        .merge(routes())
        .merge(datasets::routes(state.config.max_file_size))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
}

async fn root() -> Json<Value> {
    Json(json!({
        "message": "API running. Use /upload_csv to upload a CSV file."
    }))
}

async fn health_check() -> &'static str {
    "OK"
}
