use thiserror::Error;

use crate::utils::truncate_body;

#[derive(Error, Debug)]
pub enum GeocodeError {
    #[error("Access denied by geocoding provider: {0}")]
    AccessDenied(String),

    #[error("Rate limited by geocoding provider")]
    RateLimited,

    #[error("Provider error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl GeocodeError {
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = truncate_body(body, MAX_ERROR_BODY_LENGTH);
        match status.as_u16() {
            401 | 403 => GeocodeError::AccessDenied(truncated),
            429 => GeocodeError::RateLimited,
            500..=599 => GeocodeError::ServerError(truncated),
            _ => GeocodeError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }
}
