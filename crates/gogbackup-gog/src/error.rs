//! Internal error types for GOG API operations.
//!
//! These errors are internal to `gogbackup-gog` and are mapped to
//! [`CatalogError`] at the port boundary.

use gogbackup_core::CatalogError;
use thiserror::Error;

/// Result type alias for GOG operations.
pub type GogResult<T> = Result<T, GogError>;

/// Errors related to GOG API operations.
#[derive(Debug, Error)]
pub enum GogError {
    /// The token endpoint rejected the refresh token.
    #[error("Token refresh failed with status {status}: {body}")]
    TokenRefresh {
        /// HTTP status code
        status: u16,
        /// Response body, for diagnosing revoked tokens
        body: String,
    },

    /// API request failed with an HTTP error status.
    #[error("GOG request failed with status {status}: {url}")]
    ApiRequestFailed {
        /// HTTP status code
        status: u16,
        /// The URL that was requested
        url: String,
    },

    /// Network or HTTP client error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON parsing error.
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl From<GogError> for CatalogError {
    fn from(err: GogError) -> Self {
        match err {
            GogError::TokenRefresh { .. } => Self::auth(err.to_string()),
            GogError::ApiRequestFailed { status, .. } => {
                Self::network_with_status(err.to_string(), status)
            }
            GogError::Network(ref e) => match e.status() {
                Some(status) => Self::network_with_status(err.to_string(), status.as_u16()),
                None => Self::network(err.to_string()),
            },
            GogError::InvalidUrl(_) | GogError::JsonParse(_) => {
                Self::invalid_response(err.to_string())
            }
        }
    }
}
