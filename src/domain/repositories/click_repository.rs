//! Repository trait for click persistence.

use crate::domain::entities::{Click, NewClick};
use crate::domain::repositories::StoreError;
use async_trait::async_trait;

/// Append-only store for click records.
///
/// Implementations must be safe for concurrent use: every click worker
/// shares the same instance.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClickRepository: Send + Sync {
    /// Records a click.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the referenced link does not exist
    /// or the write fails.
    async fn create(&self, new_click: NewClick) -> Result<Click, StoreError>;
}
