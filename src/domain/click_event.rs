//! Click event model for asynchronous click tracking.

use chrono::{DateTime, Utc};

use crate::domain::entities::NewClick;

/// An in-memory click event queued for asynchronous persistence.
///
/// Passed from the redirect handler to the click workers through the
/// ingestion pipeline. Never persisted directly: a worker turns it into a
/// [`NewClick`] before calling the click store.
///
/// # Usage Flow
///
/// 1. Created in the redirect handler once the link has been resolved
/// 2. Submitted to [`crate::application::click_pipeline::ClickSubmitter`] (non-blocking)
/// 3. Dequeued by exactly one worker
/// 4. Converted with [`ClickEvent::into_new_click`] and written to the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickEvent {
    pub link_id: i64,
    pub timestamp: DateTime<Utc>,
    pub user_agent: String,
    pub ip_address: String,
}

impl ClickEvent {
    /// Creates a click event stamped with the current time.
    ///
    /// Missing client metadata is recorded as an empty string.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let event = ClickEvent::new(42, Some("Mozilla/5.0"), Some("192.168.1.1".to_string()));
    /// assert_eq!(event.link_id, 42);
    /// ```
    pub fn new(link_id: i64, user_agent: Option<&str>, ip_address: Option<String>) -> Self {
        Self {
            link_id,
            timestamp: Utc::now(),
            user_agent: user_agent.unwrap_or_default().to_string(),
            ip_address: ip_address.unwrap_or_default(),
        }
    }

    /// Maps the event to the record a worker persists.
    pub fn into_new_click(self) -> NewClick {
        NewClick {
            link_id: self.link_id,
            timestamp: self.timestamp,
            user_agent: self.user_agent,
            ip_address: self.ip_address,
        }
    }
}
