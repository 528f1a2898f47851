//! DTOs for link statistics.

use serde::Serialize;

use crate::domain::liveness::LivenessState;

/// Response body for `GET /api/v1/links/{code}/stats`.
#[derive(Debug, Serialize)]
pub struct LinkStatsResponse {
    pub short_code: String,
    pub long_url: String,
    pub total_clicks: i64,
    /// Last state seen by the liveness monitor; `null` before the first check.
    pub liveness: Option<LivenessState>,
}
