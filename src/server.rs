//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, background task startup, the Axum server
//! lifecycle and the ordered shutdown that follows it.

use crate::application::click_pipeline::ClickPipeline;
use crate::application::monitor::{HttpProbe, LivenessMonitor};
use crate::application::services::LinkService;
use crate::config::Config;
use crate::domain::liveness::LivenessTracker;
use crate::domain::repositories::{ClickRepository, LinkRepository};
use crate::infrastructure::persistence::{self, SqliteClickRepository, SqliteLinkRepository};
use crate::routes::app_router;
use crate::shutdown::shutdown_signal;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - SQLite connection pool
/// - Apply migrations
/// - Click ingestion pipeline
/// - Liveness monitor (unless disabled)
/// - Axum HTTP server
///
/// On Ctrl+C or SIGTERM the server stops accepting connections, the monitor
/// finishes its current sweep and the click queue is drained, each within the
/// shutdown timeout.
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - The probe client cannot be built
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let pool = persistence::connect(&config.database_url, config.db_max_connections)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Connected to database");

    persistence::migrate(&pool)
        .await
        .context("Failed to run migrations")?;

    let link_repository: Arc<dyn LinkRepository> =
        Arc::new(SqliteLinkRepository::new(pool.clone()));
    let click_repository: Arc<dyn ClickRepository> =
        Arc::new(SqliteClickRepository::new(pool.clone()));

    let pipeline = ClickPipeline::start(click_repository, config.pipeline_config());

    let tracker = Arc::new(LivenessTracker::new());
    let monitor_config = config.monitor_config();
    let (monitor_stop_tx, monitor_stop_rx) = watch::channel(false);

    let monitor_task = if monitor_config.is_enabled() {
        let probe = HttpProbe::new()
            .context("Failed to build probe HTTP client")?
            .with_timeout(config.probe_timeout());
        tracing::info!(probe_timeout = ?probe.timeout(), "Starting liveness monitor");
        let monitor = Arc::new(LivenessMonitor::new(
            Arc::clone(&link_repository),
            Arc::new(probe),
            Arc::clone(&tracker),
            monitor_config,
        ));
        Some(monitor.spawn(monitor_stop_rx))
    } else {
        tracing::info!("Liveness monitor disabled");
        None
    };

    let link_service = Arc::new(LinkService::new(link_repository, config.code_settings()));
    let state = AppState::new(link_service, pipeline.submitter(), tracker, &config.base_url)
        .with_monitor_enabled(monitor_task.is_some())
        .with_behind_proxy(config.behind_proxy);

    let app = app_router(state);

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid listen address '{}'", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("HTTP server stopped");

    monitor_stop_tx.send_replace(true);
    if let Some(task) = monitor_task {
        match tokio::time::timeout(config.shutdown_timeout(), task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(error = %e, "Liveness monitor task failed"),
            Err(_) => tracing::warn!("Liveness monitor did not finish its sweep before the timeout"),
        }
    }

    if !pipeline.shutdown(config.shutdown_timeout()).await {
        tracing::warn!("Some clicks may not have been recorded");
    }

    pool.close().await;
    tracing::info!("Shutdown complete");

    Ok(())
}
