//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: Store reachable and click queue open
/// - **503 Service Unavailable**: One or more components degraded
///
/// The liveness monitor is informational and never degrades the status.
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "checks": {
///     "database": { "status": "ok", "message": "Connected" },
///     "click_queue": { "status": "ok", "message": "0/1000 queued, 0 dropped" },
///     "monitor": { "status": "ok", "message": "12 accessible, 1 inaccessible" }
///   }
/// }
/// ```
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let db_check = check_database(&state).await;

    let queue_check = check_click_queue(&state);

    let monitor_check = check_monitor(&state);

    let all_healthy = db_check.is_ok() && queue_check.is_ok();

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            database: db_check,
            click_queue: queue_check,
            monitor: monitor_check,
        },
    };

    if all_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

async fn check_database(state: &AppState) -> CheckStatus {
    match state.link_service.ping().await {
        Ok(()) => CheckStatus::ok("Connected"),
        Err(e) => CheckStatus::error(format!("Database error: {e}")),
    }
}

fn check_click_queue(state: &AppState) -> CheckStatus {
    if state.clicks.is_closed() {
        return CheckStatus::error("Click queue is closed");
    }

    let stats = state.clicks.stats();
    CheckStatus::ok(format!(
        "{}/{} queued, {} dropped",
        stats.queued, stats.capacity, stats.dropped
    ))
}

fn check_monitor(state: &AppState) -> CheckStatus {
    if !state.monitor_enabled {
        return CheckStatus::ok("Disabled");
    }

    let (accessible, inaccessible) = state.liveness.counts();
    CheckStatus::ok(format!(
        "{accessible} accessible, {inaccessible} inaccessible"
    ))
}
