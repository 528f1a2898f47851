//! Handler for short URL redirect.

use axum::{
    extract::{Path, State},
    http::{Extensions, HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::domain::click_event::ClickEvent;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::client_ip::client_ip;

/// Redirects a short code to its original URL.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// # Click Tracking
///
/// A click event is handed to the ingestion pipeline without waiting. If the
/// queue is full the click is dropped; the redirect is never delayed or
/// failed because of it.
///
/// # Errors
///
/// Returns 404 Not Found if the short code doesn't exist.
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    extensions: Extensions,
) -> Result<Response, AppError> {
    let link = state.link_service.get_link_by_code(&code).await?;

    let event = ClickEvent::new(
        link.id,
        headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok()),
        client_ip(&headers, &extensions, state.behind_proxy),
    );

    if !state.clicks.submit(event) {
        debug!(link_id = link.id, "Click not recorded");
    }

    Ok((StatusCode::FOUND, [(header::LOCATION, link.long_url)]).into_response())
}
