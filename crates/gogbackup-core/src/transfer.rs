//! Transfer-stage types: descriptors, remote streams, and outcomes.

use std::fmt;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;

/// A boxed stream of payload chunks.
///
/// Dropping the stream closes the underlying connection.
pub type ByteStream = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send>>;

/// Which transfer queue a descriptor belongs to.
///
/// The two queues are drained by independent worker pools so a large extra
/// never blocks an installer and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferQueue {
    /// Platform installers of the main product and its DLCs.
    Installers,
    /// Bonus assets.
    Extras,
}

impl fmt::Display for TransferQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Installers => f.write_str("installers"),
            Self::Extras => f.write_str("extras"),
        }
    }
}

/// One file to transfer.
///
/// The filename is not known until the source stream is opened, so
/// `destination` is the directory only, relative to the backend prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTransferDescriptor {
    /// Name used in log output.
    pub display_name: String,
    /// Source URL.
    pub url: String,
    /// Destination directory relative to the backend prefix.
    pub destination: String,
    /// Version string reported by the storefront, if any.
    pub version: Option<String>,
    /// Queue this descriptor is routed to.
    pub queue: TransferQueue,
}

impl FileTransferDescriptor {
    /// Version string, treating an empty string as "unversioned".
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref().filter(|v| !v.is_empty())
    }
}

/// An opened source file.
pub struct RemoteFile {
    /// Filename derived from the final segment of the resolved URL.
    pub filename: String,
    /// Payload.
    pub stream: ByteStream,
    /// Content length, when the source reports it.
    pub content_length: Option<u64>,
}

impl fmt::Debug for RemoteFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteFile")
            .field("filename", &self.filename)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Per-descriptor result of a transfer worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    /// Payload was stored.
    Transferred {
        /// Bytes written to the backend.
        bytes: u64,
    },
    /// Version marker matched; nothing to do.
    UpToDate,
    /// Unversioned file already exists at the destination.
    AlreadyPresent,
    /// Every attempt failed, or the descriptor could not be processed.
    Failed,
}

impl TransferOutcome {
    /// Whether the file is backed up after this outcome.
    pub const fn is_success(self) -> bool {
        !matches!(self, Self::Failed)
    }

    /// Whether this outcome skipped the payload transfer.
    pub const fn is_skip(self) -> bool {
        matches!(self, Self::UpToDate | Self::AlreadyPresent)
    }
}
