//! Command-line and environment configuration.
//!
//! Every flag can also be supplied through the environment; `.env` is loaded
//! before parsing.

use std::path::PathBuf;

use clap::builder::RangedU64ValueParser;
use clap::{Parser, ValueEnum};

/// Where backed-up files are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// A directory on the local filesystem.
    Local,
    /// An S3-compatible bucket.
    S3,
}

/// Command-line interface for gog-backup.
#[derive(Debug, Parser)]
#[command(name = "gog-backup")]
#[command(about = "Back up an owned GOG.com library to local disk or S3")]
#[command(version)]
pub struct Cli {
    /// GOG OAuth refresh token
    #[arg(long, env = "GOG_REFRESH_TOKEN", hide_env_values = true)]
    pub refresh_token: String,

    /// Storage backend to write to
    #[arg(long, value_enum, env = "GOG_BACKUP_BACKEND", default_value_t = BackendKind::Local)]
    pub backend: BackendKind,

    /// Root directory for the local backend [default: $HOME/GoG]
    #[arg(long, env = "GOG_BACKUP_LOCAL_DIR")]
    pub local_dir: Option<PathBuf>,

    /// Bucket for the s3 backend
    #[arg(long, env = "GOG_BACKUP_S3_BUCKET", required_if_eq("backend", "s3"))]
    pub s3_bucket: Option<String>,

    /// Key prefix inside the bucket
    #[arg(long, env = "GOG_BACKUP_S3_PREFIX", default_value = "")]
    pub s3_prefix: String,

    /// Bucket region [default: detected from the bucket]
    #[arg(long, env = "GOG_BACKUP_S3_REGION")]
    pub s3_region: Option<String>,

    /// Custom S3-compatible endpoint
    #[arg(long, env = "GOG_BACKUP_S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    /// Attempts per file before giving up
    #[arg(
        long,
        env = "GOG_BACKUP_RETRIES",
        default_value_t = 3,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub retries: u32,

    /// Concurrent installer transfers
    #[arg(
        long,
        env = "GOG_BACKUP_INSTALLER_WORKERS",
        default_value_t = 2,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub installer_workers: usize,

    /// Concurrent extras transfers
    #[arg(
        long,
        env = "GOG_BACKUP_EXTRA_WORKERS",
        default_value_t = 2,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub extra_workers: usize,

    /// Seconds to let in-flight transfers finish after an interrupt
    #[arg(long, env = "GOG_BACKUP_SHUTDOWN_TIMEOUT", default_value_t = 60)]
    pub shutdown_timeout: u64,

    /// Download ceiling in bytes per second (K, M and G suffixes accepted)
    #[arg(long, env = "GOG_BACKUP_DOWNLOAD_LIMIT", value_parser = parse_rate)]
    pub download_limit: Option<u32>,

    /// Upload ceiling in bytes per second, s3 backend only
    #[arg(long, env = "GOG_BACKUP_UPLOAD_LIMIT", value_parser = parse_rate)]
    pub upload_limit: Option<u32>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Parse a byte rate such as `512K` or `10M` (binary multiples).
pub fn parse_rate(value: &str) -> Result<u32, String> {
    let value = value.trim();
    let (digits, multiplier) = match value.chars().last() {
        Some('k' | 'K') => (&value[..value.len() - 1], 1024_u64),
        Some('m' | 'M') => (&value[..value.len() - 1], 1024 * 1024),
        Some('g' | 'G') => (&value[..value.len() - 1], 1024 * 1024 * 1024),
        _ => (value, 1),
    };

    let base: u64 = digits
        .trim()
        .parse()
        .map_err(|_| format!("'{value}' is not a byte rate"))?;
    let rate = base
        .checked_mul(multiplier)
        .and_then(|bytes| u32::try_from(bytes).ok())
        .ok_or_else(|| format!("'{value}' exceeds {} bytes per second", u32::MAX))?;
    if rate == 0 {
        return Err("rate must be greater than zero".to_string());
    }
    Ok(rate)
}
