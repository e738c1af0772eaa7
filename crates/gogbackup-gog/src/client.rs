//! `GogClient`: the reqwest-backed [`CatalogClient`].

use async_trait::async_trait;
use futures_util::TryStreamExt;
use serde::de::DeserializeOwned;

use gogbackup_core::{
    ByteStream, CatalogClient, CatalogError, CatalogItem, CatalogPage, GameDetails, MediaType,
    RemoteFile,
};

use crate::auth::TokenCache;
use crate::config::GogClientConfig;
use crate::error::{GogError, GogResult};
use crate::wire::{FilteredProductPage, GameDetailsWire};

/// Client for the GOG embed API.
///
/// Every request carries a bearer token obtained through the shared
/// [`TokenCache`]. Redirects are followed, which is how download URLs resolve
/// to CDN locations carrying the real filename.
#[derive(Debug)]
pub struct GogClient {
    http: reqwest::Client,
    tokens: TokenCache,
    config: GogClientConfig,
}

impl GogClient {
    /// Build a client from `config`.
    pub fn new(config: GogClientConfig) -> GogResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.connect_timeout)
            .build()?;
        let tokens = TokenCache::new(&config)?;
        Ok(Self {
            http,
            tokens,
            config,
        })
    }

    /// Authenticated GET; non-2xx statuses are errors.
    async fn get(&self, url: &str) -> GogResult<reqwest::Response> {
        let token = self.tokens.access_token(&self.http).await?;
        let response = self.http.get(url).bearer_auth(token).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GogError::ApiRequestFailed {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> GogResult<T> {
        let token = self.tokens.access_token(&self.http).await?;
        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .timeout(self.config.request_timeout)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GogError::ApiRequestFailed {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn fetch_page(&self, media_type: MediaType, page: u32) -> GogResult<CatalogPage> {
        let url = format!(
            "{}/account/getFilteredProducts?mediaType={}&page={page}",
            self.config.embed_url,
            media_type.wire_value()
        );
        let page: FilteredProductPage = self.get_json(&url).await?;
        Ok(page.into())
    }

    async fn fetch_details(&self, item: CatalogItem) -> GogResult<GameDetails> {
        let url = format!(
            "{}/account/gameDetails/{}.json",
            self.config.embed_url,
            item.id()
        );
        let wire: GameDetailsWire = self.get_json(&url).await?;
        Ok(wire.into_details(&self.config.embed_url))
    }

    async fn fetch_stream(&self, url: &str) -> GogResult<RemoteFile> {
        let response = self.get(url).await?;
        let filename = filename_from_url(response.url());
        let content_length = response.content_length();
        tracing::debug!(url, filename = %filename, ?content_length, "Opened download");

        let stream: ByteStream = Box::pin(response.bytes_stream().map_err(std::io::Error::other));
        Ok(RemoteFile {
            filename,
            stream,
            content_length,
        })
    }
}

/// Last segment of the percent-decoded path of `url`, or an empty string.
///
/// The path is decoded before splitting, so an encoded `/` or `\` can never
/// end up inside the name. `.` and `..` yield an empty name.
pub(crate) fn filename_from_url(url: &url::Url) -> String {
    let path = urlencoding::decode(url.path())
        .map_or_else(|_| url.path().to_string(), std::borrow::Cow::into_owned);
    match path.rsplit(['/', '\\']).next() {
        Some("." | "..") | None => String::new(),
        Some(name) => name.to_string(),
    }
}

#[async_trait]
impl CatalogClient for GogClient {
    async fn catalog_page(
        &self,
        media_type: MediaType,
        page: u32,
    ) -> Result<CatalogPage, CatalogError> {
        Ok(self.fetch_page(media_type, page).await?)
    }

    async fn details(&self, item: CatalogItem) -> Result<GameDetails, CatalogError> {
        Ok(self.fetch_details(item).await?)
    }

    async fn open_stream(&self, url: &str) -> Result<RemoteFile, CatalogError> {
        Ok(self.fetch_stream(url).await?)
    }
}
