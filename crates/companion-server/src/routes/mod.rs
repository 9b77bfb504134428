pub mod analytics;
pub mod profile;
pub mod sessions;
pub mod tasks;

use std::sync::Arc;

use axum::routing::get;
use axum::{middleware, Json, Router};
use chrono_tz::Tz;
use companion_core::repository::SqliteRepository;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{self, TokenSigner};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<SqliteRepository>,
    pub tokens: Arc<TokenSigner>,
    /// Resolved once at startup; "today" is always evaluated here.
    pub timezone: Tz,
}

/// Assemble the full application router. The auth gate sits below the
/// trace and CORS layers so preflight requests never need a token.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(service_info))
        .route("/health", get(health))
        .merge(sessions::routes())
        .merge(profile::routes())
        .merge(tasks::routes())
        .merge(analytics::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---- GET / ----

async fn service_info() -> Json<serde_json::Value> {
    Json(json!({ "ok": true, "service": "care-companion" }))
}

// ---- GET /health ----

async fn health() -> &'static str {
    "OK"
}
