pub mod auth;
pub mod community;
pub mod destinations;
pub mod trips;
pub mod users;

use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the full application router. Shared by the binary and the
/// integration tests.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .merge(auth::router())
        .merge(users::router())
        .merge(trips::router())
        .merge(destinations::router())
        .merge(community::router())
        .nest_service("/uploads", ServeDir::new(state.config.uploads_path()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn index() -> Response {
    Json(serde_json::json!({ "message": "Welcome to the GlobeTrotter API" })).into_response()
}
