//! Reachability probes for long URLs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::redirect::Policy;

/// Default per-request probe timeout.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Why a probe could not obtain a status code.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("probe timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),
}

/// Checks whether a URL answers.
///
/// Implementations return the HTTP status of a `HEAD` request. Classifying
/// the status is left to the caller.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Probe: Send + Sync {
    async fn head(&self, url: &str) -> Result<u16, ProbeError>;
}

/// Returns true for 2xx and 3xx statuses.
pub fn is_accessible_status(status: u16) -> bool {
    (200..400).contains(&status)
}

/// [`Probe`] issuing `HEAD` requests with `reqwest`.
///
/// Redirects are not followed: a 3xx already counts as reachable.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: Client,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .redirect(Policy::none())
            .user_agent(concat!("snaplink-monitor/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            timeout: DEFAULT_PROBE_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn head(&self, url: &str) -> Result<u16, ProbeError> {
        let response = self
            .client
            .head(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProbeError::Timeout
                } else {
                    ProbeError::Transport(e.to_string())
                }
            })?;

        Ok(response.status().as_u16())
    }
}
