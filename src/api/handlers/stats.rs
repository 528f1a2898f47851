//! Handler for link statistics endpoint.

use axum::{
    Json,
    extract::{Path, State},
};

use crate::api::dto::stats::LinkStatsResponse;
use crate::error::AppError;
use crate::state::AppState;

/// Returns the total number of recorded clicks for a short link.
///
/// # Endpoint
///
/// `GET /api/v1/links/{code}/stats`
///
/// Clicks still waiting in the ingestion queue are not counted yet. The
/// `liveness` field reports the monitor's last observation of the long URL.
///
/// # Errors
///
/// Returns 404 Not Found if the short code doesn't exist.
pub async fn stats_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<LinkStatsResponse>, AppError> {
    let (link, total_clicks) = state.link_service.get_link_stats(&code).await?;

    Ok(Json(LinkStatsResponse {
        short_code: link.short_code,
        long_url: link.long_url,
        total_clicks,
        liveness: state.liveness.get(link.id),
    }))
}
