//! Entitlement expansion: turns each owned item into file transfer
//! descriptors, walking bundled DLCs breadth-first.

use std::collections::VecDeque;
use std::sync::Arc;

use async_channel::{Receiver, Sender};

use gogbackup_core::{
    CatalogClient, CatalogItem, EXTRAS_DIR, FileTransferDescriptor, GameDetails, TransferQueue,
    sanitize_path_segment,
};

/// A detail blob and the destination directory it expands into.
struct EntitlementNode {
    path: String,
    details: GameDetails,
}

/// Expand one title (and its DLCs) into descriptors, in breadth-first order.
///
/// Installers come from the first language entry only, Windows then Mac then
/// Linux. There is no cycle guard; DLC trees are assumed acyclic.
pub fn plan_transfers(details: GameDetails) -> Vec<FileTransferDescriptor> {
    let mut descriptors = Vec::new();
    let mut worklist = VecDeque::from([EntitlementNode {
        path: sanitize_path_segment(&details.title),
        details,
    }]);

    while let Some(EntitlementNode { path, details }) = worklist.pop_front() {
        if let Some(platforms) = details.primary_downloads() {
            for (platform, file) in platforms.iter() {
                descriptors.push(FileTransferDescriptor {
                    display_name: format!("{} [{platform}] [{}]", file.name, file.size),
                    url: file.url.clone(),
                    destination: format!("{path}/{}", platform.dir_name()),
                    version: file.version.clone(),
                    queue: TransferQueue::Installers,
                });
            }
        }

        for extra in &details.extras {
            descriptors.push(FileTransferDescriptor {
                display_name: format!(
                    "Extra for {}: {} [{}]",
                    details.title, extra.name, extra.size
                ),
                url: extra.url.clone(),
                destination: format!("{path}/{EXTRAS_DIR}"),
                version: extra.version.clone(),
                queue: TransferQueue::Extras,
            });
        }

        for dlc in details.dlcs {
            worklist.push_back(EntitlementNode {
                path: format!("{path}/{}", sanitize_path_segment(&dlc.title)),
                details: dlc,
            });
        }
    }

    descriptors
}

/// Consume catalog items until the queue closes, emitting descriptors onto
/// the installers and extras queues.
///
/// Both output queues are closed on return.
pub async fn expand(
    client: Arc<dyn CatalogClient>,
    input: Receiver<CatalogItem>,
    installers: Sender<FileTransferDescriptor>,
    extras: Sender<FileTransferDescriptor>,
) {
    while let Ok(item) = input.recv().await {
        tracing::info!(item = %item, "Fetching details");
        let details = match client.details(item).await {
            Ok(details) => details,
            Err(e) => {
                tracing::warn!(item = %item, error = %e, "Unable to fetch details, skipping item");
                continue;
            }
        };

        for descriptor in plan_transfers(details) {
            let queue = descriptor.queue;
            let output = match queue {
                TransferQueue::Installers => &installers,
                TransferQueue::Extras => &extras,
            };
            if output.send(descriptor).await.is_err() {
                tracing::error!(
                    %queue,
                    item = %item,
                    "Transfer queue closed unexpectedly, stopping expansion"
                );
                return;
            }
        }
    }

    tracing::info!("Entitlement expansion complete");
}
