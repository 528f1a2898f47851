#![allow(dead_code)]

use axum::extract::ConnectInfo;
use snaplink::application::click_pipeline::{ClickPipeline, PipelineConfig};
use snaplink::application::services::{CodeSettings, LinkService};
use snaplink::domain::entities::{Link, NewLink};
use snaplink::domain::liveness::LivenessTracker;
use snaplink::domain::repositories::{ClickRepository, LinkRepository};
use snaplink::infrastructure::persistence::{self, InMemoryStore};
use snaplink::state::AppState;
use sqlx::SqlitePool;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::Layer;

pub const BASE_URL: &str = "http://sl.test";

/// Everything a handler test needs: state for the router, the store behind
/// it and the running click pipeline.
pub struct TestContext {
    pub state: AppState,
    pub store: Arc<InMemoryStore>,
    pub pipeline: ClickPipeline,
}

pub fn create_test_state() -> TestContext {
    create_test_state_with(PipelineConfig {
        buffer_size: 100,
        worker_count: 2,
        write_retries: 0,
    })
}

pub fn create_test_state_with(pipeline_config: PipelineConfig) -> TestContext {
    let store = Arc::new(InMemoryStore::new());

    let link_repo: Arc<dyn LinkRepository> = store.clone();
    let click_repo: Arc<dyn ClickRepository> = store.clone();

    let pipeline = ClickPipeline::start(click_repo, pipeline_config);
    let link_service = Arc::new(LinkService::new(link_repo, CodeSettings::default()));

    let state = AppState::new(
        link_service,
        pipeline.submitter(),
        Arc::new(LivenessTracker::new()),
        BASE_URL,
    );

    TestContext {
        state,
        store,
        pipeline,
    }
}

pub async fn create_test_link(store: &InMemoryStore, code: &str, url: &str) -> Link {
    LinkRepository::create(store, NewLink::new(code.to_string(), url.to_string()))
        .await
        .unwrap()
}

pub async fn create_sqlite_pool() -> SqlitePool {
    let pool = persistence::connect("sqlite::memory:", 1).await.unwrap();
    persistence::migrate(&pool).await.unwrap();
    pool
}

pub async fn insert_sqlite_link(pool: &SqlitePool, code: &str, url: &str) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO links (short_code, long_url, created_at) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(code)
    .bind(url)
    .bind(chrono::Utc::now())
    .fetch_one(pool)
    .await
    .unwrap()
}

/// Inserts `ConnectInfo` the way `into_make_service_with_connect_info` would.
#[derive(Clone)]
pub struct MockConnectInfoLayer;

impl<S> Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService { inner }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
}

impl<S, B> tower::Service<axum::http::Request<B>> for MockConnectInfoService<S>
where
    S: tower::Service<axum::http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        let addr: SocketAddr = "127.0.0.1:12345".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        self.inner.call(req)
    }
}
