//! In-process link and click store.
//!
//! Shares the uniqueness semantics of the SQLite store: a second link with the
//! same short code is rejected with [`StoreError::UniqueViolation`]. Click
//! writes do not check that the link exists.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::entities::{Click, Link, NewClick, NewLink};
use crate::domain::repositories::{ClickRepository, LinkRepository, StoreError};

#[derive(Debug, Default)]
struct Tables {
    links: Vec<Link>,
    by_code: HashMap<String, usize>,
    clicks: Vec<Click>,
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
    unavailable: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Copies all recorded clicks.
    pub fn clicks(&self) -> Vec<Click> {
        self.tables.lock().clicks.clone()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("in-memory store switched off".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl LinkRepository for InMemoryStore {
    async fn create(&self, new_link: NewLink) -> Result<Link, StoreError> {
        self.check_available()?;
        let mut tables = self.tables.lock();

        if tables.by_code.contains_key(&new_link.short_code) {
            return Err(StoreError::UniqueViolation {
                constraint: Some("links_short_code_key".to_string()),
            });
        }

        let link = Link::new(
            tables.links.len() as i64 + 1,
            new_link.short_code,
            new_link.long_url,
            new_link.created_at,
        );
        let index = tables.links.len();
        tables.by_code.insert(link.short_code.clone(), index);
        tables.links.push(link.clone());

        Ok(link)
    }

    async fn find_by_code(&self, short_code: &str) -> Result<Option<Link>, StoreError> {
        self.check_available()?;
        let tables = self.tables.lock();

        Ok(tables
            .by_code
            .get(short_code)
            .map(|&index| tables.links[index].clone()))
    }

    async fn list_all(&self) -> Result<Vec<Link>, StoreError> {
        self.check_available()?;
        Ok(self.tables.lock().links.clone())
    }

    async fn count_clicks_for(&self, link_id: i64) -> Result<i64, StoreError> {
        self.check_available()?;
        let count = self
            .tables
            .lock()
            .clicks
            .iter()
            .filter(|c| c.link_id == link_id)
            .count();

        Ok(count as i64)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_available()
    }
}

#[async_trait]
impl ClickRepository for InMemoryStore {
    async fn create(&self, new_click: NewClick) -> Result<Click, StoreError> {
        self.check_available()?;
        let mut tables = self.tables.lock();

        let click = Click::new(
            tables.clicks.len() as i64 + 1,
            new_click.link_id,
            new_click.timestamp,
            new_click.user_agent,
            new_click.ip_address,
        );
        tables.clicks.push(click.clone());

        Ok(click)
    }
}
