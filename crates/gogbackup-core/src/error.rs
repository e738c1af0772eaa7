//! Port error types.
//!
//! These errors do not depend on adapter error types (reqwest, object_store).
//! Adapters capture the message and map into these at the boundary.

use thiserror::Error;

/// Error returned by a [`CatalogClient`](crate::ports::CatalogClient).
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// Access token could not be obtained or renewed.
    #[error("Authentication failed: {message}")]
    Auth {
        /// Detailed error message.
        message: String,
    },

    /// Network/HTTP error.
    #[error("Network error: {message}")]
    Network {
        /// Detailed error message.
        message: String,
        /// HTTP status code if available.
        status_code: Option<u16>,
    },

    /// The response body could not be decoded.
    #[error("Invalid response: {message}")]
    InvalidResponse {
        /// Detailed error message.
        message: String,
    },
}

impl CatalogError {
    /// Create an authentication error.
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            status_code: None,
        }
    }

    /// Create a network error with HTTP status code.
    pub fn network_with_status(message: impl Into<String>, status_code: u16) -> Self {
        Self::Network {
            message: message.into(),
            status_code: Some(status_code),
        }
    }

    /// Create an invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    /// HTTP status code, if this error carries one.
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::Network { status_code, .. } => *status_code,
            _ => None,
        }
    }
}

/// Error returned by a [`StorageBackend`](crate::ports::StorageBackend).
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StorageError {
    /// The source did not provide a filename.
    ///
    /// Retrying the same URL cannot fix this.
    #[error("No filename available, skipping this file")]
    MissingFilename,

    /// I/O error on the local filesystem or while reading the source stream.
    #[error("I/O error ({kind}): {message}")]
    Io {
        /// The kind of I/O error (e.g. "NotFound", "PermissionDenied").
        kind: String,
        /// Detailed error message.
        message: String,
    },

    /// Object store request failed.
    #[error("Object store error: {message}")]
    ObjectStore {
        /// Detailed error message.
        message: String,
    },
}

impl StorageError {
    /// Create an I/O error from a `std::io::Error`.
    #[must_use]
    pub fn from_io_error(err: &std::io::Error) -> Self {
        let kind = err.kind();
        Self::Io {
            kind: format!("{kind:?}"),
            message: err.to_string(),
        }
    }

    /// Create an object store error.
    pub fn object_store(message: impl Into<String>) -> Self {
        Self::ObjectStore {
            message: message.into(),
        }
    }

    /// Whether another attempt could succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        !matches!(self, Self::MissingFilename)
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::from_io_error(&err)
    }
}
