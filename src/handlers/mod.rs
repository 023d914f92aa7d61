pub mod path;

use axum::{response::IntoResponse, routing::get, Json, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use path::{compute_path, SharedPathProvider};

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "route-sync",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// HTTP routes of the path service
pub fn router(provider: SharedPathProvider) -> Router {
    Router::new()
        .route("/", get(compute_path))
        .route("/health", get(health))
        .route("/api/health", get(health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(provider)
}
