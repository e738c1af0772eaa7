//! Pipeline and worker configuration.

use std::sync::Arc;
use std::time::Duration;

use gogbackup_core::{MediaType, RateLimiter};

/// Retry policy for a single transfer worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Attempts per descriptor, including the first.
    pub(crate) max_retries: u32,
    /// Base delay before the second attempt; doubles for each later one.
    pub(crate) retry_base_delay: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_base_delay: Duration::from_millis(500),
        }
    }
}

impl WorkerConfig {
    /// Create a worker configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of attempts per descriptor.
    ///
    /// Defaults to 3.
    #[must_use]
    pub const fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the base delay for exponential backoff between attempts.
    ///
    /// Defaults to 500ms. Zero disables the delay.
    #[must_use]
    pub const fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    /// Delay before `attempt` (1-based).
    pub(crate) fn backoff(&self, attempt: u32) -> Duration {
        if attempt < 2 {
            return Duration::ZERO;
        }
        let exponent = (attempt - 2).min(16);
        self.retry_base_delay.saturating_mul(1 << exponent)
    }
}

/// Configuration for a whole [`Pipeline`](crate::Pipeline) run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub(crate) media_type: MediaType,
    pub(crate) worker: WorkerConfig,
    pub(crate) installer_workers: usize,
    pub(crate) extra_workers: usize,
    pub(crate) item_queue_capacity: usize,
    pub(crate) installer_queue_capacity: usize,
    pub(crate) extra_queue_capacity: usize,
    pub(crate) download_limiter: Option<Arc<RateLimiter>>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            media_type: MediaType::Game,
            worker: WorkerConfig::default(),
            installer_workers: 2,
            extra_workers: 2,
            item_queue_capacity: 1,
            installer_queue_capacity: 1,
            extra_queue_capacity: 10,
            download_limiter: None,
        }
    }
}

impl PipelineConfig {
    /// Create a pipeline configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set which catalog to back up.
    #[must_use]
    pub const fn with_media_type(mut self, media_type: MediaType) -> Self {
        self.media_type = media_type;
        self
    }

    /// Set the retry policy shared by every worker.
    #[must_use]
    pub fn with_worker(mut self, worker: WorkerConfig) -> Self {
        self.worker = worker;
        self
    }

    /// Set the number of workers on the installers queue (at least 1).
    #[must_use]
    pub fn with_installer_workers(mut self, count: usize) -> Self {
        self.installer_workers = count.max(1);
        self
    }

    /// Set the number of workers on the extras queue (at least 1).
    #[must_use]
    pub fn with_extra_workers(mut self, count: usize) -> Self {
        self.extra_workers = count.max(1);
        self
    }

    /// Set the three queue capacities (items, installers, extras).
    ///
    /// Each is clamped to at least 1.
    #[must_use]
    pub fn with_queue_capacities(mut self, items: usize, installers: usize, extras: usize) -> Self {
        self.item_queue_capacity = items.max(1);
        self.installer_queue_capacity = installers.max(1);
        self.extra_queue_capacity = extras.max(1);
        self
    }

    /// Share a download rate limiter between all workers.
    #[must_use]
    pub fn with_download_limiter(mut self, limiter: Option<Arc<RateLimiter>>) -> Self {
        self.download_limiter = limiter;
        self
    }
}
