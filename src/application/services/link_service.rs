//! Link creation and retrieval service.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::entities::{Link, NewLink};
use crate::domain::repositories::{LinkRepository, StoreError};
use crate::utils::code_generator::{CodeGenerator, RandomSourceError, SecureCodeGenerator};
use crate::utils::url_validator::{UrlValidationError, validate_long_url};

/// Default number of characters in a generated code.
pub const DEFAULT_CODE_LENGTH: usize = 6;

/// Default number of generation attempts before giving up.
pub const DEFAULT_MAX_RETRIES: usize = 5;

/// Errors surfaced by [`LinkService`].
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] UrlValidationError),

    #[error("short link not found")]
    NotFound,

    #[error("could not generate a unique short code after {attempts} attempts")]
    ExhaustedRetries { attempts: usize },

    #[error(transparent)]
    RandomSource(#[from] RandomSourceError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Code generation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeSettings {
    pub length: usize,
    pub max_retries: usize,
}

impl Default for CodeSettings {
    fn default() -> Self {
        Self {
            length: DEFAULT_CODE_LENGTH,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

/// Service for creating and retrieving shortened links.
///
/// Generic over the repository so unit tests can use mocks while the server
/// stores a `LinkService<dyn LinkRepository>`.
pub struct LinkService<L: LinkRepository + ?Sized> {
    link_repository: Arc<L>,
    generator: Arc<dyn CodeGenerator>,
    settings: CodeSettings,
}

impl<L: LinkRepository + ?Sized> LinkService<L> {
    /// Creates a link service using the OS-backed code generator.
    pub fn new(link_repository: Arc<L>, settings: CodeSettings) -> Self {
        Self {
            link_repository,
            generator: Arc::new(SecureCodeGenerator),
            settings,
        }
    }

    /// Replaces the code generator.
    pub fn with_generator(mut self, generator: Arc<dyn CodeGenerator>) -> Self {
        self.generator = generator;
        self
    }

    /// Creates a short link for `long_url`.
    ///
    /// # Code Generation
    ///
    /// Each attempt generates a candidate, looks it up, and inserts it if the
    /// lookup found nothing. The store's unique constraint is authoritative: a
    /// violation on insert means a concurrent creator took the code between
    /// lookup and insert, and the attempt is retried like a lookup collision.
    ///
    /// # Errors
    ///
    /// - [`LinkError::InvalidUrl`] if the URL is not an absolute http(s) URL
    /// - [`LinkError::ExhaustedRetries`] if every attempt collided
    /// - [`LinkError::RandomSource`] if the entropy source failed
    /// - [`LinkError::Store`] on any other store failure
    pub async fn create_link(&self, long_url: &str) -> Result<Link, LinkError> {
        validate_long_url(long_url)?;

        let CodeSettings {
            length,
            max_retries,
        } = self.settings;

        for attempt in 1..=max_retries {
            let code = self.generator.generate(length)?;

            match self.link_repository.find_by_code(&code).await {
                Ok(None) => {}
                Err(e) if e.is_not_found() => {}
                Ok(Some(_)) => {
                    debug!(attempt, short_code = %code, "Short code already in use, retrying");
                    continue;
                }
                Err(e) => return Err(e.into()),
            }

            match self
                .link_repository
                .create(NewLink::new(code.clone(), long_url.to_string()))
                .await
            {
                Ok(link) => {
                    info!(link_id = link.id, short_code = %link.short_code, "Link created");
                    return Ok(link);
                }
                Err(e) if e.is_unique_violation() => {
                    warn!(attempt, short_code = %code, "Short code claimed concurrently, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        warn!(attempts = max_retries, "Gave up generating a unique short code");
        Err(LinkError::ExhaustedRetries {
            attempts: max_retries,
        })
    }

    /// Retrieves a link by its short code.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::NotFound`] if no link uses the code.
    pub async fn get_link_by_code(&self, short_code: &str) -> Result<Link, LinkError> {
        match self.link_repository.find_by_code(short_code).await {
            Ok(Some(link)) => Ok(link),
            Ok(None) => Err(LinkError::NotFound),
            Err(e) if e.is_not_found() => Err(LinkError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    /// Retrieves a link together with its total click count.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::NotFound`] if no link uses the code.
    pub async fn get_link_stats(&self, short_code: &str) -> Result<(Link, i64), LinkError> {
        let link = self.get_link_by_code(short_code).await?;
        let total_clicks = self.link_repository.count_clicks_for(link.id).await?;

        Ok((link, total_clicks))
    }

    /// Checks that the link store is reachable.
    pub async fn ping(&self) -> Result<(), LinkError> {
        self.link_repository.ping().await.map_err(LinkError::from)
    }
}
