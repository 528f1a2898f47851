//! API route configuration.

use crate::api::handlers::{shorten_handler, stats_handler};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// Versioned JSON API, nested under `/api/v1`.
///
/// # Endpoints
///
/// - `POST /links`               - Create a short link
/// - `GET  /links/{code}/stats`  - Total clicks for a link
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/links", post(shorten_handler))
        .route("/links/{code}/stats", get(stats_handler))
}
