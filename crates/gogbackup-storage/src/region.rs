//! Bucket region discovery.
//!
//! S3 answers an anonymous `HEAD` on the virtual-hosted bucket URL with the
//! bucket's region in `x-amz-bucket-region`, whatever the status code.

use std::time::Duration;

use reqwest::header::HeaderMap;

use crate::error::{BackendError, BackendResult};

const REGION_HEADER: &str = "x-amz-bucket-region";
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Extract the bucket region from a `HEAD` response.
pub fn region_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(REGION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|region| !region.is_empty())
        .map(str::to_string)
}

/// Ask S3 which region `bucket` lives in.
pub async fn detect_bucket_region(bucket: &str) -> BackendResult<String> {
    let failed = |message: String| BackendError::RegionDetection {
        bucket: bucket.to_string(),
        message,
    };

    let client = reqwest::Client::builder()
        .timeout(PROBE_TIMEOUT)
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let url = format!("https://{bucket}.s3.amazonaws.com");
    let response = client
        .head(&url)
        .send()
        .await
        .map_err(|e| failed(e.to_string()))?;

    let region = region_from_headers(response.headers()).ok_or_else(|| {
        failed(format!(
            "HTTP {} without {REGION_HEADER} header",
            response.status()
        ))
    })?;

    tracing::debug!(bucket, region = %region, "Detected bucket region");
    Ok(region)
}
