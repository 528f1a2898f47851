//! Periodic liveness checks of every link's long URL.
//!
//! The monitor sweeps all links once at start and then once per interval.
//! Each sweep probes the long URLs concurrently (up to a configured limit),
//! records the outcome in a [`LivenessTracker`] and reports every state
//! change as a [`Transition`]: logged, counted and broadcast to subscribers.

pub mod probe;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use futures_util::stream::{self, StreamExt};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::domain::entities::Link;
use crate::domain::liveness::{LivenessState, LivenessTracker, Observation, Transition};
use crate::domain::repositories::{LinkRepository, StoreError};

pub use probe::{HttpProbe, Probe, ProbeError, is_accessible_status};

/// Default time between sweeps.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(300);

/// Default number of probes in flight during a sweep.
pub const DEFAULT_CONCURRENCY: usize = 8;

const TRANSITION_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Time between sweeps. Zero disables the monitor.
    pub interval: Duration,
    /// Maximum concurrent probes per sweep.
    pub concurrency: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl MonitorConfig {
    pub fn is_enabled(&self) -> bool {
        !self.interval.is_zero()
    }
}

/// Outcome of one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub checked: usize,
    pub accessible: usize,
    pub transitions: Vec<Transition>,
}

pub struct LivenessMonitor {
    links: Arc<dyn LinkRepository>,
    probe: Arc<dyn Probe>,
    tracker: Arc<LivenessTracker>,
    config: MonitorConfig,
    transitions: broadcast::Sender<Transition>,
    sweeps: AtomicU64,
}

impl LivenessMonitor {
    pub fn new(
        links: Arc<dyn LinkRepository>,
        probe: Arc<dyn Probe>,
        tracker: Arc<LivenessTracker>,
        config: MonitorConfig,
    ) -> Self {
        let (transitions, _) = broadcast::channel(TRANSITION_CHANNEL_CAPACITY);

        Self {
            links,
            probe,
            tracker,
            config,
            transitions,
            sweeps: AtomicU64::new(0),
        }
    }

    pub fn tracker(&self) -> Arc<LivenessTracker> {
        Arc::clone(&self.tracker)
    }

    /// Receives every transition emitted after the call.
    pub fn subscribe(&self) -> broadcast::Receiver<Transition> {
        self.transitions.subscribe()
    }

    /// Number of completed sweeps.
    pub fn sweeps(&self) -> u64 {
        self.sweeps.load(Ordering::Relaxed)
    }

    /// Probes every link once.
    ///
    /// # Errors
    ///
    /// Returns the store error if the link list cannot be loaded. Probe
    /// failures never fail the sweep; they mark the link inaccessible.
    pub async fn sweep(&self) -> Result<SweepReport, StoreError> {
        let links = self.links.list_all().await?;
        let checked = links.len();

        let outcomes: Vec<(LivenessState, Option<Transition>)> = stream::iter(links)
            .map(|link| self.check_link(link))
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;

        let accessible = outcomes
            .iter()
            .filter(|(state, _)| state.is_accessible())
            .count();
        let transitions: Vec<Transition> = outcomes.into_iter().filter_map(|(_, t)| t).collect();

        self.sweeps.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("monitor_sweeps_total").increment(1);

        debug!(
            checked,
            accessible,
            transitions = transitions.len(),
            "Liveness sweep finished"
        );

        Ok(SweepReport {
            checked,
            accessible,
            transitions,
        })
    }

    async fn check_link(&self, link: Link) -> (LivenessState, Option<Transition>) {
        let current = match self.probe.head(&link.long_url).await {
            Ok(status) => LivenessState::from_accessible(is_accessible_status(status)),
            Err(e) => {
                debug!(link_id = link.id, url = %link.long_url, error = %e, "Probe failed");
                LivenessState::Inaccessible
            }
        };

        let previous = match self.tracker.observe(link.id, current) {
            Observation::Changed { previous } => previous,
            Observation::Baseline => {
                info!(
                    link_id = link.id,
                    short_code = %link.short_code,
                    url = %link.long_url,
                    state = %current,
                    "Initial link liveness"
                );
                return (current, None);
            }
            Observation::Unchanged => return (current, None),
        };

        let transition = Transition {
            link_id: link.id,
            short_code: link.short_code,
            long_url: link.long_url,
            previous,
            current,
            observed_at: Utc::now(),
        };

        metrics::counter!("monitor_transitions_total").increment(1);
        warn!(
            link_id = transition.link_id,
            short_code = %transition.short_code,
            url = %transition.long_url,
            previous = %transition.previous,
            current = %transition.current,
            "Link liveness changed"
        );
        // No subscribers is fine.
        let _ = self.transitions.send(transition.clone());

        (current, Some(transition))
    }

    /// Sweeps immediately, then once per interval, until `shutdown` turns true.
    ///
    /// Shutdown is only observed between sweeps: a sweep in progress runs to
    /// completion. Callers bound the wait on the returned task.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        if !self.config.is_enabled() {
            info!("Liveness monitor disabled");
            return;
        }

        info!(
            interval = ?self.config.interval,
            concurrency = self.config.concurrency,
            "Liveness monitor started"
        );

        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.wait_for(|stop| *stop) => break,
                _ = ticker.tick() => {}
            }

            if let Err(e) = self.sweep().await {
                error!(error = %e, "Liveness sweep aborted: could not list links");
            }
        }

        info!("Liveness monitor stopped");
    }

    pub fn spawn(self: Arc<Self>, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::NewLink;
    use crate::domain::repositories::MockLinkRepository;
    use crate::infrastructure::persistence::InMemoryStore;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::{HashMap, VecDeque};

    /// Probe answering from a per-URL script; an exhausted script means 200.
    #[derive(Default)]
    struct ScriptedProbe {
        script: Mutex<HashMap<String, VecDeque<Result<u16, ProbeError>>>>,
    }

    impl ScriptedProbe {
        fn push(&self, url: &str, outcome: Result<u16, ProbeError>) {
            self.script
                .lock()
                .entry(url.to_string())
                .or_default()
                .push_back(outcome);
        }
    }

    #[async_trait]
    impl Probe for ScriptedProbe {
        async fn head(&self, url: &str) -> Result<u16, ProbeError> {
            self.script
                .lock()
                .get_mut(url)
                .and_then(VecDeque::pop_front)
                .unwrap_or(Ok(200))
        }
    }

    async fn store_with(urls: &[&str]) -> Arc<InMemoryStore> {
        let store = Arc::new(InMemoryStore::new());
        for (i, url) in urls.iter().enumerate() {
            LinkRepository::create(
                store.as_ref(),
                NewLink::new(format!("code{i}"), url.to_string()),
            )
            .await
            .unwrap();
        }
        store
    }

    fn monitor(store: Arc<InMemoryStore>, probe: Arc<dyn Probe>) -> LivenessMonitor {
        LivenessMonitor::new(
            store,
            probe,
            Arc::new(LivenessTracker::new()),
            MonitorConfig {
                interval: Duration::from_millis(20),
                concurrency: 4,
            },
        )
    }

    #[tokio::test]
    async fn test_transitions_only_on_state_change() {
        let url = "https://example.com";
        let store = store_with(&[url]).await;
        let probe = Arc::new(ScriptedProbe::default());
        probe.push(url, Ok(200));
        probe.push(url, Ok(204));
        probe.push(url, Ok(500));
        probe.push(url, Ok(302));

        let monitor = monitor(store, probe);
        let mut per_sweep = Vec::new();
        for _ in 0..4 {
            per_sweep.push(monitor.sweep().await.unwrap().transitions);
        }

        assert!(per_sweep[0].is_empty());
        assert!(per_sweep[1].is_empty());
        assert_eq!(per_sweep[2].len(), 1);
        assert_eq!(per_sweep[2][0].previous, LivenessState::Accessible);
        assert_eq!(per_sweep[2][0].current, LivenessState::Inaccessible);
        assert_eq!(per_sweep[3].len(), 1);
        assert_eq!(per_sweep[3][0].previous, LivenessState::Inaccessible);
        assert_eq!(per_sweep[3][0].current, LivenessState::Accessible);
        assert_eq!(monitor.sweeps(), 4);
    }

    #[tokio::test]
    async fn test_first_observation_inaccessible_is_silent() {
        let url = "https://down.example.com";
        let store = store_with(&[url]).await;
        let probe = Arc::new(ScriptedProbe::default());
        probe.push(url, Err(ProbeError::Timeout));

        let monitor = monitor(store, probe);
        let report = monitor.sweep().await.unwrap();

        assert_eq!(report.checked, 1);
        assert_eq!(report.accessible, 0);
        assert!(report.transitions.is_empty());
        assert_eq!(monitor.tracker().get(1), Some(LivenessState::Inaccessible));
    }

    #[tokio::test]
    async fn test_probe_error_marks_only_that_link() {
        let store = store_with(&["https://a.example.com", "https://b.example.com"]).await;
        let probe = Arc::new(ScriptedProbe::default());
        probe.push(
            "https://b.example.com",
            Err(ProbeError::Transport("connection reset".to_string())),
        );

        let monitor = monitor(store, probe);
        let report = monitor.sweep().await.unwrap();

        assert_eq!(report.checked, 2);
        assert_eq!(report.accessible, 1);
        assert_eq!(monitor.tracker().counts(), (1, 1));
    }

    #[tokio::test]
    async fn test_transitions_are_broadcast() {
        let url = "https://flaky.example.com";
        let store = store_with(&[url]).await;
        let probe = Arc::new(ScriptedProbe::default());
        probe.push(url, Ok(200));
        probe.push(url, Ok(404));

        let monitor = monitor(store, probe);
        let mut rx = monitor.subscribe();

        monitor.sweep().await.unwrap();
        monitor.sweep().await.unwrap();

        let transition = rx.try_recv().unwrap();
        assert_eq!(transition.short_code, "code0");
        assert_eq!(transition.long_url, url);
        assert_eq!(transition.current, LivenessState::Inaccessible);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_list_failure_aborts_sweep() {
        let mut mock_link_repo = MockLinkRepository::new();
        mock_link_repo
            .expect_list_all()
            .times(1)
            .returning(|| Err(StoreError::Unavailable("database is locked".to_string())));

        let tracker = Arc::new(LivenessTracker::new());
        let monitor = LivenessMonitor::new(
            Arc::new(mock_link_repo),
            Arc::new(ScriptedProbe::default()),
            Arc::clone(&tracker),
            MonitorConfig::default(),
        );

        assert!(monitor.sweep().await.is_err());
        assert_eq!(monitor.sweeps(), 0);
        assert_eq!(tracker.counts(), (0, 0));
    }

    #[tokio::test]
    async fn test_run_recovers_after_list_failure() {
        let mut mock_link_repo = MockLinkRepository::new();
        let mut seq = mockall::Sequence::new();
        mock_link_repo
            .expect_list_all()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Err(StoreError::Unavailable("database is locked".to_string())));
        mock_link_repo
            .expect_list_all()
            .in_sequence(&mut seq)
            .returning(|| {
                Ok(vec![Link::new(
                    7,
                    "back01".to_string(),
                    "https://example.com".to_string(),
                    Utc::now(),
                )])
            });

        let tracker = Arc::new(LivenessTracker::new());
        let monitor = Arc::new(LivenessMonitor::new(
            Arc::new(mock_link_repo),
            Arc::new(ScriptedProbe::default()),
            Arc::clone(&tracker),
            MonitorConfig {
                interval: Duration::from_millis(20),
                concurrency: 1,
            },
        ));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = Arc::clone(&monitor).spawn(shutdown_rx);
        tokio::time::sleep(Duration::from_millis(80)).await;
        shutdown_tx.send_replace(true);

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("monitor should stop")
            .unwrap();
        assert!(monitor.sweeps() >= 1);
        assert_eq!(tracker.get(7), Some(LivenessState::Accessible));
    }

    /// Probe that answers 200 after a fixed delay.
    struct SlowProbe {
        delay: Duration,
    }

    #[async_trait]
    impl Probe for SlowProbe {
        async fn head(&self, _url: &str) -> Result<u16, ProbeError> {
            tokio::time::sleep(self.delay).await;
            Ok(200)
        }
    }

    #[tokio::test]
    async fn test_shutdown_lets_running_sweep_finish() {
        let store = store_with(&["https://slow.example.com"]).await;
        let tracker = Arc::new(LivenessTracker::new());
        let monitor = Arc::new(LivenessMonitor::new(
            store,
            Arc::new(SlowProbe {
                delay: Duration::from_millis(200),
            }),
            Arc::clone(&tracker),
            MonitorConfig {
                interval: Duration::from_secs(60),
                concurrency: 1,
            },
        ));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = Arc::clone(&monitor).spawn(shutdown_rx);
        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown_tx.send_replace(true);

        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("monitor should stop after the sweep")
            .unwrap();
        assert_eq!(monitor.sweeps(), 1);
        assert_eq!(tracker.get(1), Some(LivenessState::Accessible));
    }

    #[tokio::test]
    async fn test_run_sweeps_until_shutdown() {
        let store = store_with(&["https://example.com"]).await;
        let monitor = Arc::new(monitor(store, Arc::new(ScriptedProbe::default())));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = Arc::clone(&monitor).spawn(shutdown_rx);
        tokio::time::sleep(Duration::from_millis(70)).await;
        shutdown_tx.send_replace(true);

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("monitor should stop")
            .unwrap();
        assert!(monitor.sweeps() >= 2);
    }

    #[tokio::test]
    async fn test_zero_interval_disables_monitor() {
        let store = store_with(&["https://example.com"]).await;
        let monitor = Arc::new(LivenessMonitor::new(
            store,
            Arc::new(ScriptedProbe::default()),
            Arc::new(LivenessTracker::new()),
            MonitorConfig {
                interval: Duration::ZERO,
                concurrency: 1,
            },
        ));
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        Arc::clone(&monitor).run(shutdown_rx).await;

        assert_eq!(monitor.sweeps(), 0);
    }
}
