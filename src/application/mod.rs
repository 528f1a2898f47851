//! Application layer services implementing business logic.
//!
//! This layer orchestrates domain operations by coordinating repository calls,
//! validation, and background work. Services consume repository traits and
//! provide a clean API for HTTP handlers.
//!
//! # Available Services
//!
//! - [`services::link_service::LinkService`] - Short link creation and retrieval
//! - [`click_pipeline::ClickPipeline`] - Bounded asynchronous click ingestion
//! - [`monitor::LivenessMonitor`] - Periodic reachability checks of long URLs

pub mod click_pipeline;
pub mod monitor;
pub mod services;
