//! CLI-specific error types and exit codes.

use gogbackup_gog::GogError;
use gogbackup_storage::BackendError;
use thiserror::Error;

/// Fatal startup errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// The configuration is incomplete or contradictory.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The storage backend could not be reached.
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// Anything else that stops the run before it starts.
    #[error("{0}")]
    Other(String),
}

impl CliError {
    /// Map error to a process exit code.
    ///
    /// Uses sysexits.h values where one fits.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 78,      // EX_CONFIG
            Self::Unavailable(_) => 69, // EX_UNAVAILABLE
            Self::Other(_) => 1,
        }
    }
}

impl From<BackendError> for CliError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::MissingBucket | BackendError::Configuration(_) => {
                Self::Config(err.to_string())
            }
            BackendError::LocalDirectory { .. }
            | BackendError::RegionDetection { .. }
            | BackendError::Unreachable { .. } => Self::Unavailable(err.to_string()),
        }
    }
}

impl From<GogError> for CliError {
    fn from(err: GogError) -> Self {
        match err {
            GogError::InvalidUrl(_) => Self::Config(err.to_string()),
            _ => Self::Other(err.to_string()),
        }
    }
}
