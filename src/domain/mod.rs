//! Domain layer containing business entities and repository contracts.
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Data access trait definitions and the store error type
//! - [`click_event`] - Click message carried by the ingestion queue
//! - [`liveness`] - Per-link reachability state and transitions
//!
//! # Click Processing Flow
//!
//! 1. HTTP handler resolves the short code and redirects
//! 2. A [`click_event::ClickEvent`] is submitted to the bounded queue
//! 3. One of the click workers dequeues it
//! 4. The click is persisted via [`repositories::ClickRepository`]

pub mod click_event;
pub mod entities;
pub mod liveness;
pub mod repositories;
