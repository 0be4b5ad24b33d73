//! Configuration for the season archive

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use weekly_report::WeekKey;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Base directory for archived reports
    pub data_dir: PathBuf,

    /// Write indented JSON
    pub pretty_json: bool,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/archive"),
            pretty_json: true,
        }
    }
}

impl ArchiveConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.data_dir.as_os_str().is_empty() {
            return Err("data_dir cannot be empty".to_string());
        }
        Ok(())
    }

    /// Directory holding one season's weeks
    pub fn season_dir(&self, season: i32) -> PathBuf {
        self.data_dir.join(format!("season-{season}"))
    }

    /// File a week's report is stored in: `season-YYYY/week-NN.json`
    pub fn report_path(&self, key: WeekKey) -> PathBuf {
        self.season_dir(key.season).join(format!("week-{:02}.json", key.week))
    }

    /// Hidden file a week is written to before it is linked into place
    pub(crate) fn staging_path(&self, key: WeekKey) -> PathBuf {
        let stamp = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        self.season_dir(key.season)
            .join(format!(".week-{:02}.json.{}-{}.tmp", key.week, std::process::id(), stamp))
    }
}

/// Parse a week number back out of a `week-NN.json` file name
pub(crate) fn parse_week_file(name: &str) -> Option<u32> {
    name.strip_prefix("week-")?.strip_suffix(".json")?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_path_layout() {
        let config = ArchiveConfig::new("/tmp/archive");
        assert_eq!(
            config.report_path(WeekKey::new(2025, 3)),
            PathBuf::from("/tmp/archive/season-2025/week-03.json")
        );
        assert_eq!(parse_week_file("week-03.json"), Some(3));
        assert_eq!(parse_week_file("week-12.json"), Some(12));
        assert_eq!(parse_week_file("notes.json"), None);

        let staging = config.staging_path(WeekKey::new(2025, 3));
        let name = staging.file_name().and_then(|n| n.to_str()).unwrap();
        assert!(name.starts_with(".week-03.json."));
        assert_eq!(parse_week_file(name), None);
        assert!(ArchiveConfig::new("").validate().is_err());
    }
}
