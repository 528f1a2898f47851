//! DTOs for link creation.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request body for `POST /api/v1/links`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLinkRequest {
    #[validate(length(min = 1, message = "long_url is required"))]
    pub long_url: String,
}

/// Created short link.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateLinkResponse {
    pub short_code: String,
    pub long_url: String,
    pub full_short_url: String,
}
