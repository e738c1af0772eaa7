//! Storage backend port trait.

use async_trait::async_trait;

use crate::error::StorageError;
use crate::transfer::ByteStream;

/// Port trait for a backup destination.
///
/// Every path passed in already includes [`prefix`](Self::prefix). Paths use
/// `/` as separator regardless of backend.
///
/// # Guarantees
///
/// - `transfer` is atomic: the payload is written under a temp name in the
///   same namespace and moved into place only once fully stored. A reader
///   never sees a partial final artifact.
/// - An empty filename fails with [`StorageError::MissingFilename`] before
///   any storage call.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Prefix prepended to every destination path.
    fn prefix(&self) -> &str;

    /// Label for log output only (e.g. `s3://bucket`). Never used for
    /// addressing.
    fn display_prefix(&self) -> &str;

    /// Read a version marker. A missing marker is `Ok(None)`.
    async fn read_marker(&self, path: &str) -> Result<Option<String>, StorageError>;

    /// Durably write a version marker.
    async fn write_marker(&self, path: &str, content: &str) -> Result<(), StorageError>;

    /// Whether an object exists at `path`.
    async fn exists(&self, path: &str) -> Result<bool, StorageError>;

    /// Store the whole stream at `dest_dir/filename`.
    ///
    /// Returns the number of bytes stored.
    async fn transfer(
        &self,
        stream: ByteStream,
        dest_dir: &str,
        filename: &str,
    ) -> Result<u64, StorageError>;
}
