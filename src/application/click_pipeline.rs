//! Asynchronous click ingestion.
//!
//! Redirect handlers hand [`ClickEvent`]s to a [`ClickSubmitter`], which never
//! blocks: when the bounded queue is full the event is dropped and counted.
//! A fixed pool of workers drains the queue and writes each event to the
//! [`ClickRepository`].
//!
//! # Shutdown
//!
//! [`ClickPipeline::shutdown`] closes the queue to new events, lets the
//! workers drain whatever is still buffered and waits for them up to a
//! caller-supplied timeout. In-flight writes are never cancelled.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::join_all;
use serde::Serialize;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, error, info, warn};

use crate::domain::click_event::ClickEvent;
use crate::domain::entities::{Click, NewClick};
use crate::domain::repositories::{ClickRepository, StoreError};

/// Default queue capacity.
pub const DEFAULT_BUFFER_SIZE: usize = 1000;

/// Default number of workers.
pub const DEFAULT_WORKER_COUNT: usize = 5;

/// Pipeline sizing and write policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Queue capacity. Zero drops every event.
    pub buffer_size: usize,
    /// Number of concurrent workers, at least one.
    pub worker_count: usize,
    /// Extra write attempts per event after a failed store write.
    pub write_retries: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            worker_count: DEFAULT_WORKER_COUNT,
            write_retries: 0,
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    submitted: AtomicU64,
    dropped: AtomicU64,
    persisted: AtomicU64,
    failed: AtomicU64,
}

/// Point-in-time view of the pipeline counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    pub submitted: u64,
    pub dropped: u64,
    pub persisted: u64,
    pub failed: u64,
    pub queued: usize,
    pub capacity: usize,
}

/// Cloneable, non-blocking producer handle.
#[derive(Clone)]
pub struct ClickSubmitter {
    tx: Option<mpsc::Sender<ClickEvent>>,
    capacity: usize,
    counters: Arc<Counters>,
    closing: Arc<AtomicBool>,
}

impl ClickSubmitter {
    fn bounded(capacity: usize) -> (Self, Option<mpsc::Receiver<ClickEvent>>) {
        // tokio rejects zero-capacity channels; no channel means always full.
        let (tx, rx) = match capacity {
            0 => (None, None),
            n => {
                let (tx, rx) = mpsc::channel(n);
                (Some(tx), Some(rx))
            }
        };

        let submitter = Self {
            tx,
            capacity,
            counters: Arc::new(Counters::default()),
            closing: Arc::new(AtomicBool::new(false)),
        };

        (submitter, rx)
    }

    /// Enqueues `event` without waiting.
    ///
    /// Returns `false` if the event was dropped because the queue is full or
    /// the pipeline is shutting down.
    pub fn submit(&self, event: ClickEvent) -> bool {
        self.counters.submitted.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("clicks_submitted_total").increment(1);

        if self.closing.load(Ordering::Acquire) {
            self.record_drop(event.link_id, "pipeline shutting down");
            return false;
        }

        let Some(tx) = &self.tx else {
            self.record_drop(event.link_id, "queue has no capacity");
            return false;
        };

        match tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                self.record_drop(event.link_id, "queue full");
                false
            }
            Err(TrySendError::Closed(event)) => {
                self.record_drop(event.link_id, "queue closed");
                false
            }
        }
    }

    fn record_drop(&self, link_id: i64, reason: &'static str) {
        self.counters.dropped.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("clicks_dropped_total").increment(1);
        warn!(link_id, reason, "Click event dropped");
    }

    /// True once shutdown has begun or the workers have stopped accepting events.
    pub fn is_closed(&self) -> bool {
        self.closing.load(Ordering::Acquire)
            || self.tx.as_ref().is_some_and(mpsc::Sender::is_closed)
    }

    pub fn stats(&self) -> PipelineStats {
        let queued = self
            .tx
            .as_ref()
            .map_or(0, |tx| self.capacity.saturating_sub(tx.capacity()));

        PipelineStats {
            submitted: self.counters.submitted.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
            persisted: self.counters.persisted.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            queued,
            capacity: self.capacity,
        }
    }
}

/// Running click ingestion pipeline: the queue plus its worker pool.
pub struct ClickPipeline {
    submitter: ClickSubmitter,
    shutdown_tx: watch::Sender<bool>,
    workers: Vec<JoinHandle<()>>,
}

impl ClickPipeline {
    /// Creates the queue and spawns `config.worker_count` workers.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(repository: Arc<dyn ClickRepository>, config: PipelineConfig) -> Self {
        let (submitter, rx) = ClickSubmitter::bounded(config.buffer_size);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let workers = match rx {
            Some(rx) => {
                let rx = Arc::new(Mutex::new(rx));
                (0..config.worker_count.max(1))
                    .map(|id| {
                        let worker = ClickWorker {
                            id,
                            rx: Arc::clone(&rx),
                            shutdown: shutdown_rx.clone(),
                            repository: Arc::clone(&repository),
                            counters: Arc::clone(&submitter.counters),
                            write_retries: config.write_retries,
                        };
                        tokio::spawn(worker.run())
                    })
                    .collect()
            }
            None => {
                warn!("Click buffer size is 0: every click will be dropped");
                Vec::new()
            }
        };

        info!(
            buffer_size = config.buffer_size,
            workers = workers.len(),
            write_retries = config.write_retries,
            "Click pipeline started"
        );

        Self {
            submitter,
            shutdown_tx,
            workers,
        }
    }

    /// Returns a producer handle. Handles are cheap to clone.
    pub fn submitter(&self) -> ClickSubmitter {
        self.submitter.clone()
    }

    pub fn stats(&self) -> PipelineStats {
        self.submitter.stats()
    }

    /// Closes the queue and waits for the workers to drain it.
    ///
    /// Returns `true` if every worker finished within `timeout`. Workers still
    /// running after the timeout are left to finish on their own.
    pub async fn shutdown(self, timeout: Duration) -> bool {
        self.submitter.closing.store(true, Ordering::Release);
        info!(queued = self.stats().queued, "Stopping click pipeline");
        self.shutdown_tx.send_replace(true);

        match tokio::time::timeout(timeout, join_all(self.workers)).await {
            Ok(results) => {
                for result in results.into_iter().filter_map(Result::err) {
                    error!(error = %result, "Click worker panicked");
                }
                let stats = self.submitter.stats();
                info!(
                    persisted = stats.persisted,
                    failed = stats.failed,
                    dropped = stats.dropped,
                    "Click pipeline drained"
                );
                true
            }
            Err(_) => {
                warn!(?timeout, "Click pipeline did not drain before the timeout");
                false
            }
        }
    }
}

struct ClickWorker {
    id: usize,
    rx: Arc<Mutex<mpsc::Receiver<ClickEvent>>>,
    shutdown: watch::Receiver<bool>,
    repository: Arc<dyn ClickRepository>,
    counters: Arc<Counters>,
    write_retries: usize,
}

impl ClickWorker {
    async fn run(mut self) {
        debug!(worker = self.id, "Click worker started");

        while let Some(event) = self.next_event().await {
            self.persist(event).await;
        }

        debug!(worker = self.id, "Click worker stopped");
    }

    /// Waits for the next event. Returns `None` once the queue is closed and empty.
    async fn next_event(&mut self) -> Option<ClickEvent> {
        let mut rx = self.rx.lock().await;

        tokio::select! {
            biased;
            event = rx.recv() => event,
            // Err means the pipeline handle was dropped; drain the same way.
            _ = self.shutdown.wait_for(|stop| *stop).map(|_| ()) => {
                rx.close();
                rx.recv().await
            }
        }
    }

    async fn persist(&self, event: ClickEvent) {
        let link_id = event.link_id;

        match self.write(event.into_new_click()).await {
            Ok(click) => {
                self.counters.persisted.fetch_add(1, Ordering::Relaxed);
                metrics::counter!("clicks_persisted_total").increment(1);
                debug!(worker = self.id, link_id, click_id = click.id, "Click recorded");
            }
            Err(e) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                metrics::counter!("clicks_failed_total").increment(1);
                error!(worker = self.id, link_id, error = %e, "Failed to record click");
            }
        }
    }

    async fn write(&self, click: NewClick) -> Result<Click, StoreError> {
        if self.write_retries == 0 {
            return self.repository.create(click).await;
        }

        let strategy = ExponentialBackoff::from_millis(10)
            .max_delay(Duration::from_secs(1))
            .map(jitter)
            .take(self.write_retries);

        Retry::spawn(strategy, || self.repository.create(click.clone())).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::MockClickRepository;
    use crate::infrastructure::persistence::InMemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::time::Instant;
    use tokio::sync::Semaphore;

    fn event(link_id: i64) -> ClickEvent {
        ClickEvent::new(link_id, Some("test-agent"), Some("127.0.0.1".to_string()))
    }

    /// Click store whose writes wait for a permit.
    struct GatedStore {
        gate: Semaphore,
        inner: InMemoryStore,
    }

    #[async_trait]
    impl ClickRepository for GatedStore {
        async fn create(&self, new_click: NewClick) -> Result<Click, StoreError> {
            let permit = self
                .gate
                .acquire()
                .await
                .map_err(|e| StoreError::Unavailable(e.to_string()))?;
            permit.forget();
            ClickRepository::create(&self.inner, new_click).await
        }
    }

    #[tokio::test]
    async fn test_submit_drops_when_full_before_any_dequeue() {
        let (submitter, _rx) = ClickSubmitter::bounded(3);

        for i in 0..3 {
            assert!(submitter.submit(event(i)));
        }

        let started = Instant::now();
        assert!(!submitter.submit(event(99)));
        assert!(started.elapsed() < Duration::from_millis(50));

        let stats = submitter.stats();
        assert_eq!(stats.submitted, 4);
        assert_eq!(stats.dropped, 1);
        assert_eq!(stats.queued, 3);
    }

    #[tokio::test]
    async fn test_zero_capacity_drops_everything() {
        let store = Arc::new(InMemoryStore::new());
        let config = PipelineConfig {
            buffer_size: 0,
            worker_count: 2,
            write_retries: 0,
        };
        let pipeline = ClickPipeline::start(store.clone(), config);
        let submitter = pipeline.submitter();

        for i in 0..5 {
            assert!(!submitter.submit(event(i)));
        }

        assert!(pipeline.shutdown(Duration::from_secs(1)).await);
        assert_eq!(submitter.stats().dropped, 5);
        assert!(store.clicks().is_empty());
    }

    #[tokio::test]
    async fn test_all_submitted_events_are_persisted_after_drain() {
        let store = Arc::new(InMemoryStore::new());
        let config = PipelineConfig {
            buffer_size: 500,
            worker_count: 4,
            write_retries: 0,
        };
        let pipeline = ClickPipeline::start(store.clone(), config);
        let submitter = pipeline.submitter();

        for i in 0..200 {
            assert!(submitter.submit(event(i % 7)));
        }

        assert!(pipeline.shutdown(Duration::from_secs(5)).await);

        assert_eq!(store.clicks().len(), 200);
        let stats = submitter.stats();
        assert_eq!(stats.persisted, 200);
        assert_eq!(stats.dropped, 0);
        assert_eq!(stats.failed, 0);
    }

    #[tokio::test]
    async fn test_shutdown_drains_buffered_events() {
        let store = Arc::new(GatedStore {
            gate: Semaphore::new(0),
            inner: InMemoryStore::new(),
        });
        let config = PipelineConfig {
            buffer_size: 10,
            worker_count: 2,
            write_retries: 0,
        };
        let pipeline = ClickPipeline::start(store.clone(), config);
        let submitter = pipeline.submitter();

        for i in 0..8 {
            assert!(submitter.submit(event(i)));
        }

        store.gate.add_permits(8);
        assert!(pipeline.shutdown(Duration::from_secs(5)).await);

        assert_eq!(store.inner.clicks().len(), 8);
        assert!(submitter.is_closed());
    }

    #[tokio::test]
    async fn test_submit_after_shutdown_is_dropped() {
        let store = Arc::new(InMemoryStore::new());
        let pipeline = ClickPipeline::start(store.clone(), PipelineConfig::default());
        let submitter = pipeline.submitter();

        assert!(pipeline.shutdown(Duration::from_secs(1)).await);

        assert!(submitter.is_closed());
        assert!(!submitter.submit(event(1)));
        assert_eq!(submitter.stats().dropped, 1);
    }

    #[tokio::test]
    async fn test_submit_dropped_once_shutdown_begins_with_busy_workers() {
        let store = Arc::new(GatedStore {
            gate: Semaphore::new(0),
            inner: InMemoryStore::new(),
        });
        let config = PipelineConfig {
            buffer_size: 4,
            worker_count: 1,
            write_retries: 0,
        };
        let pipeline = ClickPipeline::start(store.clone(), config);
        let submitter = pipeline.submitter();

        // The only worker blocks inside the store write.
        assert!(submitter.submit(event(1)));
        tokio::time::sleep(Duration::from_millis(20)).await;

        let shutdown = tokio::spawn(pipeline.shutdown(Duration::from_secs(5)));
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(submitter.is_closed());
        assert!(!submitter.submit(event(2)));
        assert_eq!(submitter.stats().dropped, 1);
        assert_eq!(submitter.stats().queued, 0);

        store.gate.add_permits(1);
        assert!(shutdown.await.unwrap());
        let link_ids: Vec<i64> = store.inner.clicks().iter().map(|c| c.link_id).collect();
        assert_eq!(link_ids, vec![1]);
    }

    #[tokio::test]
    async fn test_shutdown_times_out_on_stuck_write() {
        let store = Arc::new(GatedStore {
            gate: Semaphore::new(0),
            inner: InMemoryStore::new(),
        });
        let config = PipelineConfig {
            buffer_size: 4,
            worker_count: 1,
            write_retries: 0,
        };
        let pipeline = ClickPipeline::start(store.clone(), config);
        let submitter = pipeline.submitter();

        assert!(submitter.submit(event(1)));

        assert!(!pipeline.shutdown(Duration::from_millis(50)).await);
    }

    #[tokio::test]
    async fn test_failed_write_is_counted_and_not_retried_by_default() {
        let mut mock_repo = MockClickRepository::new();
        mock_repo
            .expect_create()
            .times(1)
            .returning(|_| Err(StoreError::Unavailable("database is locked".to_string())));

        let config = PipelineConfig {
            buffer_size: 4,
            worker_count: 1,
            write_retries: 0,
        };
        let pipeline = ClickPipeline::start(Arc::new(mock_repo), config);
        let submitter = pipeline.submitter();

        assert!(submitter.submit(event(1)));
        assert!(pipeline.shutdown(Duration::from_secs(1)).await);

        let stats = submitter.stats();
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.persisted, 0);
    }

    #[tokio::test]
    async fn test_write_retries_recover_transient_failure() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);

        let mut mock_repo = MockClickRepository::new();
        mock_repo.expect_create().times(2).returning(move |new_click| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(StoreError::Unavailable("database is locked".to_string()))
            } else {
                Ok(Click::new(
                    1,
                    new_click.link_id,
                    new_click.timestamp,
                    new_click.user_agent,
                    new_click.ip_address,
                ))
            }
        });

        let config = PipelineConfig {
            buffer_size: 4,
            worker_count: 1,
            write_retries: 2,
        };
        let pipeline = ClickPipeline::start(Arc::new(mock_repo), config);
        let submitter = pipeline.submitter();

        assert!(submitter.submit(event(1)));
        assert!(pipeline.shutdown(Duration::from_secs(5)).await);

        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert_eq!(submitter.stats().persisted, 1);
        assert_eq!(submitter.stats().failed, 0);
    }

    #[tokio::test]
    async fn test_each_event_is_handled_once() {
        let store = Arc::new(InMemoryStore::new());
        let config = PipelineConfig {
            buffer_size: 100,
            worker_count: 5,
            write_retries: 0,
        };
        let pipeline = ClickPipeline::start(store.clone(), config);
        let submitter = pipeline.submitter();

        for i in 0..50 {
            assert!(submitter.submit(event(i)));
        }
        assert!(pipeline.shutdown(Duration::from_secs(5)).await);

        let mut link_ids: Vec<i64> = store.clicks().iter().map(|c| c.link_id).collect();
        link_ids.sort_unstable();
        assert_eq!(link_ids, (0..50).collect::<Vec<_>>());
    }
}
