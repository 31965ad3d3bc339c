use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::{auth, bills, entries, insights, profile, voice, SharedState};

/// Create the main application router with all API endpoints.
pub fn create_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let upload_dir = state.config.upload_dir.clone();
    let frontend_dir = state.config.frontend_dir.clone();
    let index = std::path::Path::new(&frontend_dir).join("index.html");

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Auth
        .route("/api/register", post(auth::register))
        .route("/api/login", post(auth::login))
        .route("/api/logout", post(auth::logout))
        .route("/api/me", get(auth::me))
        // Ledger entries
        .route("/api/entries", get(entries::list).post(entries::create))
        // Voice entry
        .route("/api/voice/process", post(voice::process))
        // Bills / OCR
        .route("/api/bills/upload", post(bills::upload))
        .route("/api/bills", get(bills::list))
        .route("/api/bills/:id", get(bills::get_one))
        // Insights
        .route("/api/insights/summary", get(insights::summary))
        .route("/api/insights/ask", post(insights::ask))
        // Business profile
        .route("/api/profile", get(profile::get_profile).post(profile::update_profile))
        // Stored bill images
        .nest_service("/uploads", ServeDir::new(upload_dir))
        // Built frontend, with an SPA index fallback
        .fallback_service(ServeDir::new(frontend_dir).fallback(ServeFile::new(index)))
        // Shared state
        .with_state(state)
        // Middleware; bill photos routinely exceed the default body limit
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// GET /health
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "ledgerly-api"
    }))
}
