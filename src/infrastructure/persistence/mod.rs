//! Repository implementations.
//!
//! # Repositories
//!
//! - [`SqliteLinkRepository`] - Link storage and retrieval
//! - [`SqliteClickRepository`] - Click recording
//! - [`InMemoryStore`] - Both traits in process memory

pub mod db;
pub mod memory;
pub mod sqlite_click_repository;
pub mod sqlite_link_repository;

pub use db::{connect, migrate};
pub use memory::InMemoryStore;
pub use sqlite_click_repository::SqliteClickRepository;
pub use sqlite_link_repository::SqliteLinkRepository;
