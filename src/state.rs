//! Shared application state injected into handlers.

use std::sync::Arc;

use crate::application::click_pipeline::ClickSubmitter;
use crate::application::services::LinkService;
use crate::domain::liveness::LivenessTracker;
use crate::domain::repositories::LinkRepository;

/// State cloned into every request handler.
///
/// Everything inside is either `Arc`-backed or a cheap handle.
#[derive(Clone)]
pub struct AppState {
    pub link_service: Arc<LinkService<dyn LinkRepository>>,
    pub clicks: ClickSubmitter,
    pub liveness: Arc<LivenessTracker>,
    pub monitor_enabled: bool,
    pub base_url: Arc<str>,
    /// Read client IPs from forwarding headers instead of the peer address.
    pub behind_proxy: bool,
}

impl AppState {
    pub fn new(
        link_service: Arc<LinkService<dyn LinkRepository>>,
        clicks: ClickSubmitter,
        liveness: Arc<LivenessTracker>,
        base_url: &str,
    ) -> Self {
        Self {
            link_service,
            clicks,
            liveness,
            monitor_enabled: false,
            base_url: Arc::from(base_url.trim_end_matches('/')),
            behind_proxy: false,
        }
    }

    pub fn with_monitor_enabled(mut self, enabled: bool) -> Self {
        self.monitor_enabled = enabled;
        self
    }

    pub fn with_behind_proxy(mut self, behind_proxy: bool) -> Self {
        self.behind_proxy = behind_proxy;
        self
    }

    /// Full public URL for a short code.
    pub fn short_url(&self, short_code: &str) -> String {
        format!("{}/{}", self.base_url, short_code)
    }
}
