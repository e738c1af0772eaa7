//! The gog-backup transfer pipeline.
//!
//! ```text
//! discover ──items──▶ expand ──installers──▶ TransferWorker × N ──▶ StorageBackend
//!                            └──extras─────▶ TransferWorker × M ──┘
//! ```
//!
//! [`ShutdownCoordinator`] runs alongside and only ever cancels discovery;
//! the rest of the pipeline drains naturally as the queues close.

#![deny(unused_crate_dependencies)]

mod config;
mod discover;
mod expand;
mod runner;
mod shutdown;
mod summary;
mod worker;

pub use config::{PipelineConfig, WorkerConfig};
pub use discover::{DiscoveryEnd, discover};
pub use expand::{expand, plan_transfers};
pub use runner::Pipeline;
pub use shutdown::{FORCE_EXIT_CODE, ForceExit, ShutdownCoordinator, ShutdownPhase, ShutdownSignal};
pub use summary::{RunSummary, SummarySnapshot};
pub use worker::TransferWorker;

// Silence unused dev-dependency warnings
#[cfg(test)]
use async_trait as _;
#[cfg(test)]
use bytes as _;
#[cfg(test)]
use futures_util as _;
#[cfg(test)]
use gogbackup_storage as _;
#[cfg(test)]
use mockall as _;
#[cfg(test)]
use tempfile as _;
