//! Archive backend trait and implementations

use crate::config::{parse_week_file, ArchiveConfig};
use crate::error::{ArchiveError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use weekly_report::{WeekKey, WeeklyReport};

/// A stored report with its archive metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchivedReport {
    pub key: WeekKey,
    pub archived_at: DateTime<Utc>,
    pub report: WeeklyReport,
}

impl ArchivedReport {
    pub fn new(report: WeeklyReport) -> Self {
        Self {
            key: report.key(),
            archived_at: Utc::now(),
            report,
        }
    }
}

/// Append-only store of weekly reports keyed by `(season, week)`
#[async_trait::async_trait]
pub trait ArchiveBackend: Send + Sync {
    /// Initialize the archive backend
    async fn initialize(&mut self) -> Result<()>;

    /// Store a report. Fails with `AlreadyExists` if the week is already archived.
    async fn append(&self, report: &WeeklyReport) -> Result<ArchivedReport>;

    /// Load one week's report
    async fn load(&self, key: WeekKey) -> Result<ArchivedReport>;

    /// Archived weeks of a season in ascending order
    async fn list_weeks(&self, season: i32) -> Result<Vec<u32>>;

    /// The most recent archived week of a season, if any
    async fn latest(&self, season: i32) -> Result<Option<ArchivedReport>> {
        match self.list_weeks(season).await?.last() {
            Some(&week) => Ok(Some(self.load(WeekKey::new(season, week)).await?)),
            None => Ok(None),
        }
    }

    fn config(&self) -> &ArchiveConfig;
}

fn not_initialized() -> ArchiveError {
    ArchiveError::invalid_operation("Archive backend not initialized")
}

/// Local file-based archive: one JSON file per week
pub struct LocalArchive {
    config: ArchiveConfig,
    initialized: bool,
}

impl LocalArchive {
    pub fn new(config: ArchiveConfig) -> Result<Self> {
        config.validate().map_err(ArchiveError::config)?;
        Ok(Self {
            config,
            initialized: false,
        })
    }

    pub fn with_default_config(data_dir: impl Into<PathBuf>) -> Result<Self> {
        Self::new(ArchiveConfig::new(data_dir))
    }

    fn encode(&self, record: &ArchivedReport) -> Result<Vec<u8>> {
        let bytes = if self.config.pretty_json {
            serde_json::to_vec_pretty(record)?
        } else {
            serde_json::to_vec(record)?
        };
        Ok(bytes)
    }
}

#[async_trait::async_trait]
impl ArchiveBackend for LocalArchive {
    async fn initialize(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }

        tokio::fs::create_dir_all(&self.config.data_dir).await?;
        self.initialized = true;

        tracing::info!("Local archive initialized at: {:?}", self.config.data_dir);

        Ok(())
    }

    async fn append(&self, report: &WeeklyReport) -> Result<ArchivedReport> {
        if !self.initialized {
            return Err(not_initialized());
        }

        let key = report.key();
        let path = self.config.report_path(key);
        tokio::fs::create_dir_all(self.config.season_dir(key.season)).await?;

        let record = ArchivedReport::new(report.clone());
        let bytes = self.encode(&record)?;

        // The report is written and synced under a staging name, then hard-linked
        // into place. Linking fails if the week exists, and a crash mid-write
        // never leaves a partial week file behind.
        let staging = self.config.staging_path(key);
        if let Err(e) = write_synced(&staging, &bytes).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(e.into());
        }

        let linked = tokio::fs::hard_link(&staging, &path).await;
        if let Err(e) = tokio::fs::remove_file(&staging).await {
            tracing::warn!("Failed to remove staging file {:?}: {}", staging, e);
        }
        match linked {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                tracing::warn!("Refusing to overwrite archived report for {}", key);
                return Err(ArchiveError::already_exists(key.to_string()));
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!("Archived report for {} at {:?}", key, path);

        Ok(record)
    }

    async fn load(&self, key: WeekKey) -> Result<ArchivedReport> {
        if !self.initialized {
            return Err(not_initialized());
        }

        let path = self.config.report_path(key);
        let content = match tokio::fs::read(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ArchiveError::not_found(key.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        Ok(serde_json::from_slice(&content)?)
    }

    async fn list_weeks(&self, season: i32) -> Result<Vec<u32>> {
        if !self.initialized {
            return Err(not_initialized());
        }

        let mut entries = match tokio::fs::read_dir(self.config.season_dir(season)).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut weeks = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if let Some(week) = entry.file_name().to_str().and_then(parse_week_file) {
                weeks.push(week);
            }
        }
        weeks.sort_unstable();

        Ok(weeks)
    }

    fn config(&self) -> &ArchiveConfig {
        &self.config
    }
}

async fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .await?;
    file.write_all(bytes).await?;
    file.sync_all().await
}

/// In-memory archive (for testing)
pub struct InMemoryArchive {
    config: ArchiveConfig,
    reports: Arc<Mutex<BTreeMap<WeekKey, ArchivedReport>>>,
    initialized: bool,
}

impl InMemoryArchive {
    pub fn new(config: ArchiveConfig) -> Self {
        Self {
            config,
            reports: Arc::new(Mutex::new(BTreeMap::new())),
            initialized: false,
        }
    }

    pub fn with_default_config() -> Self {
        Self::new(ArchiveConfig::default())
    }
}

#[async_trait::async_trait]
impl ArchiveBackend for InMemoryArchive {
    async fn initialize(&mut self) -> Result<()> {
        self.initialized = true;
        Ok(())
    }

    async fn append(&self, report: &WeeklyReport) -> Result<ArchivedReport> {
        if !self.initialized {
            return Err(not_initialized());
        }

        let mut reports = self.reports.lock().await;
        let key = report.key();
        if reports.contains_key(&key) {
            return Err(ArchiveError::already_exists(key.to_string()));
        }

        let record = ArchivedReport::new(report.clone());
        reports.insert(key, record.clone());
        Ok(record)
    }

    async fn load(&self, key: WeekKey) -> Result<ArchivedReport> {
        if !self.initialized {
            return Err(not_initialized());
        }

        self.reports
            .lock()
            .await
            .get(&key)
            .cloned()
            .ok_or_else(|| ArchiveError::not_found(key.to_string()))
    }

    async fn list_weeks(&self, season: i32) -> Result<Vec<u32>> {
        if !self.initialized {
            return Err(not_initialized());
        }

        Ok(self
            .reports
            .lock()
            .await
            .keys()
            .filter(|k| k.season == season)
            .map(|k| k.week)
            .collect())
    }

    fn config(&self) -> &ArchiveConfig {
        &self.config
    }
}
