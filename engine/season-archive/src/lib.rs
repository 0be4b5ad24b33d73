//! # Season Archive
//!
//! Append-only storage for finished weekly reports, keyed by `(season, week)`.
//! A stored week is never overwritten; a second append for the same key fails
//! with [`ArchiveError::AlreadyExists`].
//!
//! - **ArchiveBackend**: async trait implemented by every store
//! - **LocalArchive**: one JSON file per week under `season-YYYY/week-NN.json`
//! - **InMemoryArchive**: map-backed store for tests

pub mod backend;
pub mod config;
pub mod error;

#[cfg(test)]
mod integration_tests;

pub use backend::{ArchiveBackend, ArchivedReport, InMemoryArchive, LocalArchive};
pub use config::ArchiveConfig;
pub use error::{ArchiveError, Result};

use std::path::Path;

/// Create and initialize a local archive rooted at `data_dir`
pub async fn open_local_archive(data_dir: impl AsRef<Path>) -> Result<LocalArchive> {
    open_local_archive_with_config(ArchiveConfig::new(data_dir.as_ref())).await
}

/// Create and initialize a local archive with explicit configuration
pub async fn open_local_archive_with_config(config: ArchiveConfig) -> Result<LocalArchive> {
    let mut archive = LocalArchive::new(config)?;
    archive.initialize().await?;
    Ok(archive)
}
