//! Pipeline assembly.

use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use gogbackup_core::{CatalogClient, StorageBackend};

use crate::config::PipelineConfig;
use crate::discover::discover;
use crate::expand::expand;
use crate::summary::{RunSummary, SummarySnapshot};
use crate::worker::TransferWorker;

/// Discoverer → expander → worker pools, connected by bounded queues.
pub struct Pipeline {
    client: Arc<dyn CatalogClient>,
    backend: Arc<dyn StorageBackend>,
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a pipeline over `client` and `backend`.
    pub fn new(
        client: Arc<dyn CatalogClient>,
        backend: Arc<dyn StorageBackend>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            client,
            backend,
            config,
        }
    }

    /// Run until every queue has drained.
    ///
    /// Cancelling `cancel` stops discovery only; items already queued are
    /// still expanded and transferred.
    pub async fn run(&self, cancel: CancellationToken) -> SummarySnapshot {
        let config = &self.config;
        let (item_tx, item_rx) = async_channel::bounded(config.item_queue_capacity);
        let (installer_tx, installer_rx) = async_channel::bounded(config.installer_queue_capacity);
        let (extra_tx, extra_rx) = async_channel::bounded(config.extra_queue_capacity);

        let summary = Arc::new(RunSummary::default());
        let worker = Arc::new(
            TransferWorker::new(
                Arc::clone(&self.backend),
                Arc::clone(&self.client),
                config.worker.clone(),
            )
            .with_download_limiter(config.download_limiter.clone())
            .with_summary(Arc::clone(&summary)),
        );

        tracing::info!(
            installer_workers = config.installer_workers,
            extra_workers = config.extra_workers,
            dest = self.backend.display_prefix(),
            prefix = self.backend.prefix(),
            "Starting backup"
        );

        let mut tasks = JoinSet::new();
        {
            let client = Arc::clone(&self.client);
            let media_type = config.media_type;
            tasks.spawn(async move {
                discover(client, media_type, item_tx, cancel).await;
            });
        }
        tasks.spawn(expand(
            Arc::clone(&self.client),
            item_rx,
            installer_tx,
            extra_tx,
        ));

        let pools = [
            (installer_rx, config.installer_workers),
            (extra_rx, config.extra_workers),
        ];
        for (queue, count) in pools {
            for _ in 0..count {
                let worker = Arc::clone(&worker);
                let queue = queue.clone();
                tasks.spawn(async move { worker.run(queue).await });
            }
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "Pipeline task ended abnormally");
            }
        }

        let snapshot = summary.snapshot();
        tracing::info!(
            transferred = snapshot.transferred,
            bytes = snapshot.bytes_transferred,
            up_to_date = snapshot.up_to_date,
            already_present = snapshot.already_present,
            failed = snapshot.failed,
            "Backup run complete"
        );
        snapshot
    }
}
