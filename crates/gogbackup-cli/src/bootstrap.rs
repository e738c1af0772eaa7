//! CLI bootstrap - the composition root.
//!
//! This module is the only place where concrete adapters are chosen:
//! - Storage backend (local directory or S3 bucket, via gogbackup-storage)
//! - Catalog client (via gogbackup-gog)
//! - Shared rate limiters (via gogbackup-core)
//!
//! `main` receives a [`BackupContext`] and hands it to the pipeline.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use gogbackup_core::{CatalogClient, RateLimiter, StorageBackend};
use gogbackup_gog::{GogClient, GogClientConfig};
use gogbackup_pipeline::{Pipeline, PipelineConfig, ShutdownCoordinator, WorkerConfig};
use gogbackup_storage::{LocalBackend, ObjectStoreBackend, S3Config};

use crate::error::CliError;
use crate::parser::{BackendKind, Cli};

/// Directory under `$HOME` used when no local directory is given.
pub const DEFAULT_LOCAL_DIR: &str = "GoG";

/// Where the run writes to, resolved from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendTarget {
    /// Filesystem root.
    Local(PathBuf),
    /// S3 bucket settings plus an optional upload ceiling.
    S3 {
        config: S3Config,
        upload_limit: Option<u32>,
    },
}

/// Everything needed to start a run, before any network or disk access.
#[derive(Debug, Clone)]
pub struct BackupConfig {
    pub target: BackendTarget,
    pub refresh_token: String,
    pub pipeline: PipelineConfig,
    pub shutdown_timeout: Duration,
}

impl BackupConfig {
    /// Resolve defaults and validate the parsed arguments.
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let target = match cli.backend {
            BackendKind::Local => {
                if cli.upload_limit.is_some() {
                    tracing::warn!("--upload-limit only applies to the s3 backend, ignoring");
                }
                let root = match &cli.local_dir {
                    Some(dir) => dir.clone(),
                    None => dirs::home_dir()
                        .ok_or_else(|| {
                            CliError::Config(
                                "Cannot determine home directory, pass --local-dir".to_string(),
                            )
                        })?
                        .join(DEFAULT_LOCAL_DIR),
                };
                BackendTarget::Local(root)
            }
            BackendKind::S3 => {
                let bucket = cli
                    .s3_bucket
                    .as_deref()
                    .map(str::trim)
                    .filter(|b| !b.is_empty())
                    .ok_or_else(|| CliError::Config("--s3-bucket is required for s3".to_string()))?;
                BackendTarget::S3 {
                    config: S3Config::new(bucket)
                        .with_prefix(cli.s3_prefix.clone())
                        .with_region(cli.s3_region.clone())
                        .with_endpoint(cli.s3_endpoint.clone()),
                    upload_limit: cli.upload_limit,
                }
            }
        };

        if cli.refresh_token.trim().is_empty() {
            return Err(CliError::Config("Refresh token is empty".to_string()));
        }

        let pipeline = PipelineConfig::new()
            .with_worker(WorkerConfig::new().with_max_retries(cli.retries))
            .with_installer_workers(cli.installer_workers)
            .with_extra_workers(cli.extra_workers)
            .with_download_limiter(RateLimiter::shared(cli.download_limit));

        Ok(Self {
            target,
            refresh_token: cli.refresh_token.trim().to_string(),
            pipeline,
            shutdown_timeout: Duration::from_secs(cli.shutdown_timeout),
        })
    }
}

/// Fully composed context for one backup run.
pub struct BackupContext {
    /// The wired pipeline.
    pub pipeline: Pipeline,
    /// Signal handling for this run.
    pub shutdown: ShutdownCoordinator,
}

/// Open the backend, build the client and wire the pipeline.
pub async fn bootstrap(config: BackupConfig) -> Result<BackupContext, CliError> {
    let backend = open_backend(&config.target).await?;
    let client: Arc<dyn CatalogClient> =
        Arc::new(GogClient::new(GogClientConfig::new(config.refresh_token))?);

    Ok(BackupContext {
        pipeline: Pipeline::new(client, backend, config.pipeline),
        shutdown: ShutdownCoordinator::new(config.shutdown_timeout),
    })
}

async fn open_backend(target: &BackendTarget) -> Result<Arc<dyn StorageBackend>, CliError> {
    match target {
        BackendTarget::Local(root) => Ok(Arc::new(LocalBackend::open(root.clone()).await?)),
        BackendTarget::S3 {
            config,
            upload_limit,
        } => {
            let backend = ObjectStoreBackend::connect(config)
                .await?
                .with_upload_limiter(RateLimiter::shared(*upload_limit));
            tracing::info!(dest = backend.display_prefix(), "Using S3 backend");
            Ok(Arc::new(backend))
        }
    }
}
