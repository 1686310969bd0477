pub mod api;
pub mod config;
pub mod error;
pub mod handlers;
pub mod registry;
pub mod storage;
pub mod store;

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{any, get, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::storage::ObjectStorage;
use crate::store::Store;

/// Shared application state: built once at startup, cloned into every
/// handler by the router.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Store,
    pub storage: Arc<dyn ObjectStorage>,
}

pub fn app(state: AppState) -> Router {
    // the whole multipart body is buffered, so the limit covers all files
    let upload_limit =
        state.config.upload.max_file_bytes * state.config.upload.max_files + 1024 * 1024;

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route(
            "/api/upload",
            post(handlers::upload::upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/:resource", any(handlers::collection))
        .route("/api/:resource/:id", any(handlers::item))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Portfolio API",
            "version": version,
            "description": "Content API for a personal portfolio site",
            "endpoints": {
                "about": "/api/about (GET, POST, PUT - singleton)",
                "categories": "/api/categories[/:id] (GET supports ?type=)",
                "skills": "/api/skills[/:id]",
                "services": "/api/services[/:id]",
                "projects": "/api/projects[/:id]",
                "journey": "/api/journey[/:id]",
                "certifications": "/api/certifications (GET)",
                "upload": "/api/upload (POST multipart)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.ping().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
