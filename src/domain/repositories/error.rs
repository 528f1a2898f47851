//! Error type shared by all repository implementations.

/// Failure reported by a link or click store.
///
/// `NotFound` is an expected outcome used for branching, not an anomaly.
/// `UniqueViolation` is how a store reports that a concurrent writer claimed
/// the same short code first; callers treat it as a signal to retry.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("unique constraint violation")]
    UniqueViolation { constraint: Option<String> },

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation { .. })
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if matches!(e, sqlx::Error::RowNotFound) {
            return Self::NotFound;
        }

        if let Some(db) = e.as_database_error()
            && db.is_unique_violation()
        {
            return Self::UniqueViolation {
                constraint: db.constraint().map(str::to_string),
            };
        }

        Self::Database(e)
    }
}
