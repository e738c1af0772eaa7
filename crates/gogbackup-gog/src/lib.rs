//! GOG.com API client for gog-backup.
//!
//! [`GogClient`] implements [`gogbackup_core::CatalogClient`]: it renews the
//! OAuth access token from a long-lived refresh token, pages the owned-product
//! catalog, fetches game details and opens authenticated download streams.

#![deny(unused_crate_dependencies)]

mod auth;
mod client;
mod config;
mod error;
mod wire;

pub use client::GogClient;
pub use config::GogClientConfig;
pub use error::{GogError, GogResult};
