//! S3-compatible object store backend via `object_store`.
//!
//! Keys are written to a `.<filename>.tmp` sibling first, copied onto the
//! final key once the upload completes, and the temp key is then deleted.
//! The final key is therefore only ever replaced by a complete object.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::buffered::BufWriter;
use object_store::path::Path as ObjPath;
use object_store::{ObjectStore, PutPayload};
use tokio::io::AsyncWriteExt;

use gogbackup_core::{
    ByteStream, RateLimiter, StorageBackend, StorageError, join_key, maybe_throttle, temp_name,
};

use crate::error::{BackendError, BackendResult};
use crate::region::detect_bucket_region;

/// Region used for custom endpoints when none is given.
const DEFAULT_ENDPOINT_REGION: &str = "us-east-1";

/// Connection settings for [`ObjectStoreBackend::connect`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct S3Config {
    /// Bucket name.
    pub bucket: String,
    /// Key prefix inside the bucket, without leading or trailing `/`.
    pub prefix: String,
    /// Region override. Detected from the bucket when unset.
    pub region: Option<String>,
    /// Custom endpoint for S3-compatible services.
    pub endpoint: Option<String>,
}

impl S3Config {
    /// Settings for `bucket` with no prefix.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            ..Self::default()
        }
    }

    /// Set the key prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into().trim_matches('/').to_string();
        self
    }

    /// Pin the region instead of detecting it.
    #[must_use]
    pub fn with_region(mut self, region: Option<String>) -> Self {
        self.region = region.filter(|r| !r.is_empty());
        self
    }

    /// Use a custom endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: Option<String>) -> Self {
        self.endpoint = endpoint.filter(|e| !e.is_empty());
        self
    }
}

/// Backend storing files as objects in a bucket.
pub struct ObjectStoreBackend {
    store: Arc<dyn ObjectStore>,
    prefix: String,
    display_prefix: String,
    upload_limiter: Option<Arc<RateLimiter>>,
}

impl std::fmt::Debug for ObjectStoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStoreBackend")
            .field("display_prefix", &self.display_prefix)
            .field("prefix", &self.prefix)
            .field("upload_limiter", &self.upload_limiter)
            .finish_non_exhaustive()
    }
}

impl ObjectStoreBackend {
    /// Wrap an already-built store.
    pub fn new(store: Arc<dyn ObjectStore>, bucket: &str, prefix: &str) -> Self {
        Self {
            store,
            prefix: prefix.trim_matches('/').to_string(),
            display_prefix: format!("s3://{bucket}"),
            upload_limiter: None,
        }
    }

    /// Pace uploads through a shared limiter.
    #[must_use]
    pub fn with_upload_limiter(mut self, limiter: Option<Arc<RateLimiter>>) -> Self {
        self.upload_limiter = limiter;
        self
    }

    /// Build an S3 client from the environment and `config`, then verify the
    /// bucket answers.
    ///
    /// Credentials come from the usual `AWS_*` environment variables.
    pub async fn connect(config: &S3Config) -> BackendResult<Self> {
        if config.bucket.is_empty() {
            return Err(BackendError::MissingBucket);
        }

        let region = match (&config.region, &config.endpoint) {
            (Some(region), _) => region.clone(),
            (None, Some(_)) => DEFAULT_ENDPOINT_REGION.to_string(),
            (None, None) => detect_bucket_region(&config.bucket).await?,
        };

        let mut builder = AmazonS3Builder::from_env()
            .with_bucket_name(&config.bucket)
            .with_region(&region);
        if let Some(endpoint) = &config.endpoint {
            builder = builder
                .with_endpoint(endpoint)
                .with_allow_http(endpoint.starts_with("http://"));
        }
        let store: Arc<dyn ObjectStore> = Arc::new(builder.build()?);

        let probe = if config.prefix.is_empty() {
            None
        } else {
            Some(ObjPath::parse(&config.prefix).map_err(object_store::Error::from)?)
        };
        store
            .list_with_delimiter(probe.as_ref())
            .await
            .map_err(|e| BackendError::Unreachable {
                bucket: config.bucket.clone(),
                message: e.to_string(),
            })?;

        tracing::info!(
            bucket = %config.bucket,
            prefix = %config.prefix,
            region = %region,
            "Connected to object store"
        );
        Ok(Self::new(store, &config.bucket, &config.prefix))
    }

    async fn upload(&self, stream: ByteStream, key: &ObjPath) -> Result<u64, StorageError> {
        let mut stream = maybe_throttle(self.upload_limiter.as_ref(), stream);
        let mut writer = BufWriter::new(Arc::clone(&self.store), key.clone());
        let mut written = 0u64;

        let result: Result<(), StorageError> = async {
            while let Some(chunk) = stream.next().await {
                let chunk = chunk?;
                writer.write_all(&chunk).await?;
                written += chunk.len() as u64;
            }
            writer.shutdown().await?;
            Ok(())
        }
        .await;

        if let Err(e) = result {
            if let Err(abort) = writer.abort().await {
                tracing::debug!(key = %key, error = %abort, "Could not abort upload");
            }
            return Err(e);
        }
        Ok(written)
    }
}

fn map_store_error(err: &object_store::Error) -> StorageError {
    StorageError::object_store(err.to_string())
}

/// Object key for `path`, taken verbatim.
///
/// `Path::from` would percent-encode characters such as `[`, `#` or `~`,
/// moving titles that contain them away from their existing keys.
fn object_key(path: &str) -> Result<ObjPath, StorageError> {
    ObjPath::parse(path).map_err(|e| StorageError::object_store(e.to_string()))
}

#[async_trait]
impl StorageBackend for ObjectStoreBackend {
    fn prefix(&self) -> &str {
        &self.prefix
    }

    fn display_prefix(&self) -> &str {
        &self.display_prefix
    }

    async fn read_marker(&self, path: &str) -> Result<Option<String>, StorageError> {
        let location = object_key(path)?;
        let bytes = match self.store.get(&location).await {
            Ok(result) => result.bytes().await.map_err(|e| map_store_error(&e))?,
            Err(object_store::Error::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(map_store_error(&e)),
        };
        let content = String::from_utf8_lossy(&bytes);
        Ok(Some(content.trim_end_matches('\0').to_string()))
    }

    async fn write_marker(&self, path: &str, content: &str) -> Result<(), StorageError> {
        let payload = PutPayload::from(Bytes::from(content.to_string()));
        self.store
            .put(&object_key(path)?, payload)
            .await
            .map_err(|e| map_store_error(&e))?;
        Ok(())
    }

    async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        match self.store.head(&object_key(path)?).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(map_store_error(&e)),
        }
    }

    async fn transfer(
        &self,
        stream: ByteStream,
        dest_dir: &str,
        filename: &str,
    ) -> Result<u64, StorageError> {
        if filename.is_empty() {
            return Err(StorageError::MissingFilename);
        }

        let tmp = object_key(&join_key(dest_dir, &temp_name(filename)))?;
        let dest = object_key(&join_key(dest_dir, filename))?;

        let written = self.upload(stream, &tmp).await?;
        let copied = self
            .store
            .copy(&tmp, &dest)
            .await
            .map_err(|e| map_store_error(&e));

        if let Err(e) = self.store.delete(&tmp).await {
            tracing::warn!(key = %tmp, error = %e, "Could not delete temporary object");
        }
        copied?;

        tracing::debug!(key = %dest, bytes = written, "Stored object");
        Ok(written)
    }
}
