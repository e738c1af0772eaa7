//! Startup errors for constructing a backend.
//!
//! Runtime failures go through [`gogbackup_core::StorageError`]; these are
//! only returned while a backend is being set up, and are fatal.

use thiserror::Error;

/// Result type alias for backend construction.
pub type BackendResult<T> = Result<T, BackendError>;

/// Errors raised while opening a storage backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Local root directory could not be created or is not a directory.
    #[error("Local directory '{path}' is unusable: {message}")]
    LocalDirectory {
        /// The configured root.
        path: String,
        /// Why it is unusable.
        message: String,
    },

    /// No bucket was configured for the object-store backend.
    #[error("No S3 bucket configured")]
    MissingBucket,

    /// The bucket region could not be determined.
    #[error("Could not detect region for bucket '{bucket}': {message}")]
    RegionDetection {
        /// Bucket name.
        bucket: String,
        /// Detailed error message.
        message: String,
    },

    /// The object-store client could not be built from configuration.
    #[error("Invalid object store configuration: {0}")]
    Configuration(#[from] object_store::Error),

    /// The bucket did not answer a listing probe.
    #[error("Bucket '{bucket}' is unreachable: {message}")]
    Unreachable {
        /// Bucket name.
        bucket: String,
        /// Detailed error message.
        message: String,
    },
}
