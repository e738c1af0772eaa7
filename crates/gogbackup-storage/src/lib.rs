//! Storage backends for gog-backup.
//!
//! Both backends implement [`gogbackup_core::StorageBackend`] and never expose
//! a partially written file under its final name.

#![deny(unused_crate_dependencies)]

mod error;
mod local;
mod object;
mod region;

pub use error::{BackendError, BackendResult};
pub use local::LocalBackend;
pub use object::{ObjectStoreBackend, S3Config};
pub use region::{detect_bucket_region, region_from_headers};
