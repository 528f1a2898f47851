//! Repository trait definitions for the domain layer.
//!
//! These traits abstract data access following the Repository pattern.
//! Concrete implementations live in `crate::infrastructure::persistence`;
//! mock implementations are generated via `mockall` for unit tests.
//!
//! # Available Repositories
//!
//! - [`LinkRepository`] - Short link creation, lookup and listing
//! - [`ClickRepository`] - Click recording

pub mod click_repository;
pub mod error;
pub mod link_repository;

pub use click_repository::ClickRepository;
pub use error::StoreError;
pub use link_repository::LinkRepository;

#[cfg(test)]
pub use click_repository::MockClickRepository;
#[cfg(test)]
pub use link_repository::MockLinkRepository;
