//! Transfer worker: drains one descriptor queue into the storage backend.
//!
//! A worker never assumes a file is backed up until the backend returns
//! success. Version markers are written only after that point, so an
//! interrupted run leaves either the old state or the new one.

use std::sync::Arc;

use async_channel::Receiver;

use gogbackup_core::{
    CatalogClient, FileTransferDescriptor, RateLimiter, RemoteFile, StorageBackend,
    TransferOutcome, join_key, marker_path, maybe_throttle,
};

use crate::config::WorkerConfig;
use crate::summary::RunSummary;

/// Result of a single attempt.
enum Attempt {
    Done(TransferOutcome),
    Retry,
}

/// Moves files described by [`FileTransferDescriptor`]s from the catalog
/// into a [`StorageBackend`].
pub struct TransferWorker {
    backend: Arc<dyn StorageBackend>,
    client: Arc<dyn CatalogClient>,
    download_limiter: Option<Arc<RateLimiter>>,
    config: WorkerConfig,
    summary: Arc<RunSummary>,
}

impl TransferWorker {
    /// Create a worker with its own summary and no rate limit.
    pub fn new(
        backend: Arc<dyn StorageBackend>,
        client: Arc<dyn CatalogClient>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            backend,
            client,
            download_limiter: None,
            config,
            summary: Arc::new(RunSummary::default()),
        }
    }

    /// Pace downloads through a shared limiter.
    #[must_use]
    pub fn with_download_limiter(mut self, limiter: Option<Arc<RateLimiter>>) -> Self {
        self.download_limiter = limiter;
        self
    }

    /// Record outcomes into a shared summary.
    #[must_use]
    pub fn with_summary(mut self, summary: Arc<RunSummary>) -> Self {
        self.summary = summary;
        self
    }

    /// Summary this worker records into.
    pub fn summary(&self) -> &Arc<RunSummary> {
        &self.summary
    }

    /// Process descriptors until `queue` is closed and empty.
    pub async fn run(&self, queue: Receiver<FileTransferDescriptor>) {
        while let Ok(descriptor) = queue.recv().await {
            let outcome = self.process(&descriptor).await;
            self.summary.record(outcome);
        }
    }

    /// Back up one file, retrying up to the configured limit.
    pub async fn process(&self, descriptor: &FileTransferDescriptor) -> TransferOutcome {
        let dest_dir = join_key(self.backend.prefix(), &descriptor.destination);

        for attempt in 1..=self.config.max_retries {
            let delay = self.config.backoff(attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            match self.attempt(descriptor, &dest_dir, attempt).await {
                Attempt::Done(outcome) => return outcome,
                Attempt::Retry => {}
            }
        }

        tracing::error!(
            file = %descriptor.display_name,
            attempts = self.config.max_retries,
            "Giving up on file"
        );
        TransferOutcome::Failed
    }

    async fn attempt(
        &self,
        descriptor: &FileTransferDescriptor,
        dest_dir: &str,
        attempt: u32,
    ) -> Attempt {
        let remote = match self.client.open_stream(&descriptor.url).await {
            Ok(remote) => remote,
            Err(e) => {
                tracing::warn!(
                    file = %descriptor.display_name,
                    attempt,
                    error = %e,
                    "Unable to connect to GOG"
                );
                return Attempt::Retry;
            }
        };
        let RemoteFile { filename, stream, .. } = remote;

        if filename.is_empty() {
            tracing::error!(
                file = %descriptor.display_name,
                url = %descriptor.url,
                "No filename available, skipping this file"
            );
            return Attempt::Done(TransferOutcome::Failed);
        }

        if let Some(skip) = self.already_backed_up(descriptor, dest_dir, &filename).await {
            return Attempt::Done(skip);
        }

        tracing::info!(
            file = %descriptor.display_name,
            version = descriptor.version().unwrap_or(""),
            url = %descriptor.url,
            dest = %join_key(self.backend.display_prefix(), dest_dir),
            attempt,
            "Transferring"
        );

        let stream = maybe_throttle(self.download_limiter.as_ref(), stream);
        let bytes = match self.backend.transfer(stream, dest_dir, &filename).await {
            Ok(bytes) => bytes,
            Err(e) if !e.is_retryable() => {
                tracing::error!(file = %descriptor.display_name, error = %e, "Transfer failed");
                return Attempt::Done(TransferOutcome::Failed);
            }
            Err(e) => {
                tracing::warn!(
                    file = %descriptor.display_name,
                    attempt,
                    error = %e,
                    "Unable to transfer file"
                );
                return Attempt::Retry;
            }
        };

        if let Some(version) = descriptor.version() {
            let marker = marker_path(dest_dir, &filename);
            if let Err(e) = self.backend.write_marker(&marker, version).await {
                tracing::warn!(
                    file = %descriptor.display_name,
                    marker = %marker,
                    error = %e,
                    "Unable to save version marker"
                );
            }
        }

        tracing::debug!(file = %descriptor.display_name, bytes, "Transfer complete");
        Attempt::Done(TransferOutcome::Transferred { bytes })
    }

    /// Skip check. Probe errors count as "not backed up".
    async fn already_backed_up(
        &self,
        descriptor: &FileTransferDescriptor,
        dest_dir: &str,
        filename: &str,
    ) -> Option<TransferOutcome> {
        if let Some(version) = descriptor.version() {
            let marker = marker_path(dest_dir, filename);
            match self.backend.read_marker(&marker).await {
                Ok(Some(previous)) if previous == version => {
                    tracing::info!(file = %descriptor.display_name, "Skipping, already up to date");
                    return Some(TransferOutcome::UpToDate);
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(marker = %marker, error = %e, "Unable to read version marker");
                }
            }
        } else {
            let path = join_key(dest_dir, filename);
            match self.backend.exists(&path).await {
                Ok(true) => {
                    tracing::info!(file = %descriptor.display_name, "Skipping, already backed up");
                    return Some(TransferOutcome::AlreadyPresent);
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::debug!(path = %path, error = %e, "Unable to check for existing file");
                }
            }
        }
        None
    }
}
