//! Catalog discovery: pages the owned-product catalog into the item queue.

use std::sync::Arc;

use async_channel::Sender;
use tokio_util::sync::CancellationToken;

use gogbackup_core::{CatalogClient, CatalogItem, MediaType};

/// Why discovery stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryEnd {
    /// Every page was fetched and every item enqueued.
    Exhausted {
        /// Items enqueued.
        items: u64,
    },
    /// Shutdown was requested.
    Cancelled,
    /// A page could not be fetched.
    FetchFailed,
    /// The downstream queue was closed.
    DownstreamClosed,
}

/// Page through the catalog and enqueue one item per owned product.
///
/// `total_pages` is re-read from every response. The output queue is closed
/// when this returns, whatever the reason, since `output` is dropped here.
pub async fn discover(
    client: Arc<dyn CatalogClient>,
    media_type: MediaType,
    output: Sender<CatalogItem>,
    cancel: CancellationToken,
) -> DiscoveryEnd {
    let mut page = 0u32;
    let mut total_pages = 1u32;
    let mut items = 0u64;

    while page < total_pages {
        page += 1;
        if page == 1 {
            tracing::info!(page, "Fetching catalog page");
        } else {
            tracing::info!(page, total_pages, "Fetching catalog page");
        }

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::info!("Discovery cancelled");
                return DiscoveryEnd::Cancelled;
            }
            result = client.catalog_page(media_type, page) => result,
        };

        let catalog_page = match result {
            Ok(catalog_page) => catalog_page,
            Err(e) => {
                tracing::error!(page, error = %e, "Failed to fetch catalog page");
                return DiscoveryEnd::FetchFailed;
            }
        };
        total_pages = catalog_page.total_pages;

        for item in catalog_page.items {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    tracing::info!(item = %item, "Discovery cancelled");
                    return DiscoveryEnd::Cancelled;
                }
                sent = output.send(item) => {
                    if sent.is_err() {
                        tracing::warn!(item = %item, "Item queue closed, stopping discovery");
                        return DiscoveryEnd::DownstreamClosed;
                    }
                }
            }
            items += 1;
        }
    }

    tracing::info!(items, pages = page, "Catalog discovery complete");
    DiscoveryEnd::Exhausted { items }
}
