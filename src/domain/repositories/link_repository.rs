//! Repository trait for short link data access.

use crate::domain::entities::{Link, NewLink};
use crate::domain::repositories::StoreError;
use async_trait::async_trait;

/// Repository interface for managing short links.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::SqliteLinkRepository`] - SQLite implementation
/// - [`crate::infrastructure::persistence::InMemoryStore`] - In-process store
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Persists a new short link and returns it with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UniqueViolation`] if the short code is already taken.
    /// This check is authoritative; a lookup before insert is only advisory.
    async fn create(&self, new_link: NewLink) -> Result<Link, StoreError>;

    /// Finds a link by its short code.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Link))` if found
    /// - `Ok(None)` if no link uses this code
    async fn find_by_code(&self, short_code: &str) -> Result<Option<Link>, StoreError>;

    /// Returns every known link. Used by the liveness monitor.
    async fn list_all(&self) -> Result<Vec<Link>, StoreError>;

    /// Counts clicks recorded for a link.
    async fn count_clicks_for(&self, link_id: i64) -> Result<i64, StoreError>;

    /// Cheap connectivity check used by the health endpoint.
    async fn ping(&self) -> Result<(), StoreError>;
}
