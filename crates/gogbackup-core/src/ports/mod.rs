//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that the pipeline expects from infrastructure.
//! They contain no implementation details and use only domain types.
//!
//! # Design Rules
//!
//! - No reqwest or `object_store` types in any signature
//! - Paths are `/`-separated strings so one contract covers filesystems and
//!   object keys

pub mod catalog;
pub mod storage;

pub use catalog::CatalogClient;
pub use storage::StorageBackend;
