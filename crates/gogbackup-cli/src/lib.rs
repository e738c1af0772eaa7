//! `gog-backup` command-line front end.
//!
//! Parses flags and environment, wires the concrete adapters together and
//! forwards OS signals to the shutdown coordinator.

#![deny(unused_crate_dependencies)]

// Used by the binary target only
use anyhow as _;
use dotenvy as _;

pub mod bootstrap;
pub mod error;
pub mod logging;
pub mod parser;
pub mod signals;

pub use bootstrap::{BackendTarget, BackupConfig, BackupContext, bootstrap};
pub use error::CliError;
pub use parser::{BackendKind, Cli};
