//! # snaplink
//!
//! A URL shortening service built with Axum and SQLite.
//!
//! ## Architecture
//!
//! This crate follows Clean Architecture principles with clear layer separation:
//!
//! - **Domain Layer** ([`domain`]) - Core business entities, repository traits and liveness state
//! - **Application Layer** ([`application`]) - Link creation, click ingestion and liveness monitoring
//! - **Infrastructure Layer** ([`infrastructure`]) - SQLite and in-memory stores
//! - **API Layer** ([`api`]) - REST API handlers, DTOs, and middleware
//!
//! ## Features
//!
//! - Collision-checked random short codes from a CSPRNG
//! - Redirects that never wait on analytics: clicks go through a bounded queue
//!   drained by a worker pool, and are dropped (and counted) when it is full
//! - Periodic reachability checks of every long URL with transition reporting
//!
//! ## Quick Start
//!
//! ```bash
//! export DATABASE_URL="sqlite://snaplink.db?mode=rwc"
//! export BASE_URL="http://localhost:8080"
//!
//! cargo run
//! ```
//!
//! ## Configuration
//!
//! Service configuration is loaded from environment variables via [`config::Config`].
//! See [`config`] module for available options.

pub mod api;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod state;
pub mod utils;

pub mod config;
pub mod server;
pub mod shutdown;

pub mod routes;

pub use error::AppError;
pub use state::AppState;

/// Commonly used types for external consumers.
///
/// Re-exports frequently used types to simplify imports for library users
/// and integration tests.
pub mod prelude {
    pub use crate::application::click_pipeline::{ClickPipeline, ClickSubmitter, PipelineConfig};
    pub use crate::application::monitor::{LivenessMonitor, MonitorConfig};
    pub use crate::application::services::{CodeSettings, LinkError, LinkService};
    pub use crate::domain::entities::{Click, Link, NewClick, NewLink};
    pub use crate::domain::liveness::{LivenessState, LivenessTracker, Transition};
    pub use crate::error::AppError;
    pub use crate::state::AppState;
}
