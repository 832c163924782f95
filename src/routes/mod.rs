mod api;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::registration::MAX_PHOTO_BYTES;
use crate::state::AppState;
use crate::storage::UPLOADS_ROUTE;

// Photo limit plus room for the text fields and multipart framing.
const MAX_BODY_BYTES: usize = MAX_PHOTO_BYTES + 1024 * 1024;

pub fn router(state: Arc<AppState>) -> Router {
    let uploads = ServeDir::new(&state.config.upload_folder);

    Router::new()
        .route("/", get(index))
        .route("/api/health", get(health))
        .route("/api/noc/register", post(api::register_noc))
        .route("/api/noc/qr/:noc_id", get(api::get_qr_code))
        .route("/api/noc/pdf/:noc_id", get(api::download_pdf))
        .route("/api/noc/all", get(api::list_nocs))
        .nest_service(UPLOADS_ROUTE, uploads)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn index() -> &'static str {
    "Welcome to the NOC Registration API"
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
