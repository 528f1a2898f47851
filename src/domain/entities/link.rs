//! Link entity representing a shortened URL mapping.

use chrono::{DateTime, Utc};

/// A shortened URL link.
///
/// Represents the mapping between a short code and a long URL. Links are
/// immutable once created; the `id` is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub id: i64,
    pub short_code: String,
    pub long_url: String,
    pub created_at: DateTime<Utc>,
}

impl Link {
    /// Creates a new Link instance.
    pub fn new(
        id: i64,
        short_code: String,
        long_url: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            short_code,
            long_url,
            created_at,
        }
    }
}

/// Input data for creating a new link.
///
/// `created_at` is fixed by the creation service so that the record carries
/// the moment the code was reserved, not the moment the store accepted it.
#[derive(Debug, Clone)]
pub struct NewLink {
    pub short_code: String,
    pub long_url: String,
    pub created_at: DateTime<Utc>,
}

impl NewLink {
    pub fn new(short_code: String, long_url: String) -> Self {
        Self {
            short_code,
            long_url,
            created_at: Utc::now(),
        }
    }
}
