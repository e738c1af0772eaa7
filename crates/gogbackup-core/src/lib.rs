//! Core domain types and ports for gog-backup.
//!
//! - `catalog` - what the storefront reports about the library
//! - `transfer` - descriptors, remote streams and per-file outcomes
//! - `paths` - the on-disk / bucket layout
//! - `ports` - `CatalogClient` and `StorageBackend`
//! - `rate_limit` - shared byte-rate limiter

#![deny(unused_crate_dependencies)]

pub mod catalog;
pub mod error;
pub mod paths;
pub mod ports;
pub mod rate_limit;
pub mod transfer;

// Re-export commonly used types for convenience
pub use catalog::{
    CatalogItem, CatalogPage, EXTRAS_DIR, GameDetails, GameFile, LanguageDownloads, MediaType,
    Platform, PlatformFiles,
};
pub use error::{CatalogError, StorageError};
pub use paths::{join_key, marker_name, marker_path, sanitize_path_segment, temp_name};
pub use ports::{CatalogClient, StorageBackend};
pub use rate_limit::{RateLimiter, maybe_throttle};
pub use transfer::{ByteStream, FileTransferDescriptor, RemoteFile, TransferOutcome, TransferQueue};
