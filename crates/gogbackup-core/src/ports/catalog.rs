//! Catalog client port trait.

use async_trait::async_trait;

use crate::catalog::{CatalogItem, CatalogPage, GameDetails, MediaType};
use crate::error::CatalogError;
use crate::transfer::RemoteFile;

/// Port trait for the storefront API.
///
/// The implementation lives in `gogbackup-gog`. Token handling, request
/// construction and JSON decoding all stay behind this interface.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Fetch one page of owned products, starting at page 1.
    async fn catalog_page(
        &self,
        media_type: MediaType,
        page: u32,
    ) -> Result<CatalogPage, CatalogError>;

    /// Fetch the detail blob for one owned product.
    async fn details(&self, item: CatalogItem) -> Result<GameDetails, CatalogError>;

    /// Open a streaming download.
    ///
    /// The returned filename comes from the final segment of the resolved
    /// URL, after redirects. Non-2xx responses are errors.
    async fn open_stream(&self, url: &str) -> Result<RemoteFile, CatalogError>;
}
