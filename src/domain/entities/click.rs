//! Click entity representing a single redirect event.

use chrono::{DateTime, Utc};

/// A click recorded when a shortened link is followed.
///
/// Clicks are append-only: the service never updates or deletes them.
/// `user_agent` and `ip_address` are empty strings when the client did not
/// provide them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Click {
    pub id: i64,
    pub link_id: i64,
    pub timestamp: DateTime<Utc>,
    pub user_agent: String,
    pub ip_address: String,
}

impl Click {
    /// Creates a new Click instance.
    pub fn new(
        id: i64,
        link_id: i64,
        timestamp: DateTime<Utc>,
        user_agent: String,
        ip_address: String,
    ) -> Self {
        Self {
            id,
            link_id,
            timestamp,
            user_agent,
            ip_address,
        }
    }
}

/// Input data for recording a click.
///
/// The `link_id` must reference an existing link; referential integrity is
/// enforced by the store, not in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClick {
    pub link_id: i64,
    pub timestamp: DateTime<Utc>,
    pub user_agent: String,
    pub ip_address: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_click_creation_with_all_fields() {
        let now = Utc::now();
        let click = Click::new(
            1,
            42,
            now,
            "Mozilla/5.0".to_string(),
            "192.168.1.1".to_string(),
        );

        assert_eq!(click.id, 1);
        assert_eq!(click.link_id, 42);
        assert_eq!(click.timestamp, now);
        assert_eq!(click.user_agent, "Mozilla/5.0");
        assert_eq!(click.ip_address, "192.168.1.1");
    }

    #[test]
    fn test_click_allows_empty_metadata() {
        let click = Click::new(1, 10, Utc::now(), String::new(), String::new());

        assert_eq!(click.link_id, 10);
        assert!(click.user_agent.is_empty());
        assert!(click.ip_address.is_empty());
    }
}
