//! Handler for link creation endpoint.

use axum::{Json, extract::State, http::StatusCode};
use validator::Validate;

use crate::api::dto::links::{CreateLinkRequest, CreateLinkResponse};
use crate::error::AppError;
use crate::state::AppState;

/// Creates a short link for a long URL.
///
/// # Endpoint
///
/// `POST /api/v1/links`
///
/// # Request Body
///
/// ```json
/// { "long_url": "https://example.com/some/long/path" }
/// ```
///
/// # Response
///
/// `201 Created`
///
/// ```json
/// {
///   "short_code": "aZ3kP9",
///   "long_url": "https://example.com/some/long/path",
///   "full_short_url": "http://localhost:8080/aZ3kP9"
/// }
/// ```
///
/// # Errors
///
/// - 400 Bad Request if the URL is missing or not an absolute http(s) URL
/// - 500 Internal Server Error if no unique code could be generated
/// - 503 Service Unavailable if the store is unreachable
pub async fn shorten_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreateLinkRequest>,
) -> Result<(StatusCode, Json<CreateLinkResponse>), AppError> {
    payload.validate()?;

    let link = state.link_service.create_link(&payload.long_url).await?;
    let full_short_url = state.short_url(&link.short_code);

    Ok((
        StatusCode::CREATED,
        Json(CreateLinkResponse {
            short_code: link.short_code,
            long_url: link.long_url,
            full_short_url,
        }),
    ))
}
