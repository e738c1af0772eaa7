//! End-of-run outcome counters.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use gogbackup_core::TransferOutcome;

/// Outcome counters shared by every worker in a run.
#[derive(Debug, Default)]
pub struct RunSummary {
    transferred: AtomicU64,
    bytes_transferred: AtomicU64,
    up_to_date: AtomicU64,
    already_present: AtomicU64,
    failed: AtomicU64,
}

impl RunSummary {
    /// Record the outcome of one descriptor.
    pub fn record(&self, outcome: TransferOutcome) {
        match outcome {
            TransferOutcome::Transferred { bytes } => {
                self.transferred.fetch_add(1, Ordering::Relaxed);
                self.bytes_transferred.fetch_add(bytes, Ordering::Relaxed);
            }
            TransferOutcome::UpToDate => {
                self.up_to_date.fetch_add(1, Ordering::Relaxed);
            }
            TransferOutcome::AlreadyPresent => {
                self.already_present.fetch_add(1, Ordering::Relaxed);
            }
            TransferOutcome::Failed => {
                self.failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Point-in-time copy of the counters.
    pub fn snapshot(&self) -> SummarySnapshot {
        SummarySnapshot {
            transferred: self.transferred.load(Ordering::Relaxed),
            bytes_transferred: self.bytes_transferred.load(Ordering::Relaxed),
            up_to_date: self.up_to_date.load(Ordering::Relaxed),
            already_present: self.already_present.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Counters of a finished (or in-progress) run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SummarySnapshot {
    /// Files whose payload was stored.
    pub transferred: u64,
    /// Bytes stored across all transferred files.
    pub bytes_transferred: u64,
    /// Versioned files skipped because the marker matched.
    pub up_to_date: u64,
    /// Unversioned files skipped because they already exist.
    pub already_present: u64,
    /// Files that could not be backed up.
    pub failed: u64,
}

impl SummarySnapshot {
    /// Number of descriptors processed.
    pub const fn total(&self) -> u64 {
        self.transferred + self.up_to_date + self.already_present + self.failed
    }

    /// Number of descriptors skipped without a transfer.
    pub const fn skipped(&self) -> u64 {
        self.up_to_date + self.already_present
    }
}

impl fmt::Display for SummarySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} transferred ({} bytes), {} up to date, {} already present, {} failed",
            self.transferred,
            self.bytes_transferred,
            self.up_to_date,
            self.already_present,
            self.failed
        )
    }
}
