//! Utility functions shared across layers.
//!
//! - [`code_generator`] - Random short code generation
//! - [`url_validator`] - Long URL validation
//! - [`client_ip`] - Client address extraction for click events

pub mod client_ip;
pub mod code_generator;
pub mod url_validator;
