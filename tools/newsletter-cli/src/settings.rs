//! Pipeline settings
//!
//! Layered as defaults < the settings file (optional,
//! `config/newsletter.toml` by default) < `NEWSLETTER__*`
//! environment variables, e.g. `NEWSLETTER__SLEEPER__LEAGUE_ID`.

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use season_archive::ArchiveConfig;
use serde::{Deserialize, Serialize};
use sleeper_fetcher::FetcherConfig;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// League file with owners, team names and divisions
    pub league_file: PathBuf,
    pub archive: ArchiveSettings,
    pub sleeper: SleeperSettings,
    pub output: OutputSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveSettings {
    pub data_dir: PathBuf,
    pub pretty_json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleeperSettings {
    pub api_base_url: String,
    pub league_id: String,
    pub timeout_secs: u64,
    pub players_cache: Option<PathBuf>,
    /// Sleeper division number (as text) -> league division tag
    #[serde(default)]
    pub division_tags: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Where fetched briefs and built reports are written
    pub weekly_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty, compact)
    pub format: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            league_file: PathBuf::from("config/league.toml"),
            archive: ArchiveSettings {
                data_dir: PathBuf::from("data/archive"),
                pretty_json: true,
            },
            sleeper: SleeperSettings {
                api_base_url: "https://api.sleeper.app/v1".to_string(),
                league_id: String::new(),
                timeout_secs: 30,
                players_cache: Some(PathBuf::from("data/players_nfl.json")),
                division_tags: BTreeMap::new(),
            },
            output: OutputSettings {
                weekly_dir: PathBuf::from("data/weekly"),
            },
            logging: LoggingSettings {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}

impl Settings {
    /// Load settings from defaults, an optional file, and the environment
    pub fn load(config_file: &Path) -> Result<Self> {
        let defaults =
            Config::try_from(&Settings::default()).context("Failed to encode default settings")?;
        let settings: Settings = Config::builder()
            .add_source(defaults)
            .add_source(File::from(config_file).required(false))
            .add_source(Environment::with_prefix("NEWSLETTER").separator("__"))
            .build()
            .context("Failed to load settings")?
            .try_deserialize()
            .context("Invalid settings")?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Invalid log level: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "json" | "pretty" | "compact" => {}
            _ => anyhow::bail!("Invalid log format: {}", self.logging.format),
        }

        if self.sleeper.timeout_secs == 0 {
            anyhow::bail!("Invalid Sleeper timeout: {}", self.sleeper.timeout_secs);
        }

        for number in self.sleeper.division_tags.keys() {
            number
                .parse::<u32>()
                .with_context(|| format!("Invalid Sleeper division number: {number}"))?;
        }

        Ok(())
    }

    pub fn archive_config(&self) -> ArchiveConfig {
        ArchiveConfig {
            data_dir: self.archive.data_dir.clone(),
            pretty_json: self.archive.pretty_json,
        }
    }

    pub fn fetcher_config(&self) -> FetcherConfig {
        FetcherConfig {
            api_base_url: self.sleeper.api_base_url.clone(),
            league_id: self.sleeper.league_id.clone(),
            timeout_secs: self.sleeper.timeout_secs,
            players_cache: self.sleeper.players_cache.clone(),
            division_tags: self
                .sleeper
                .division_tags
                .iter()
                .filter_map(|(number, tag)| number.parse().ok().map(|n| (n, tag.clone())))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_overrides_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("newsletter.toml");
        std::fs::write(
            &path,
            r#"
league_file = "leagues/cup.toml"

[sleeper]
league_id = "1180208789911158784"

[sleeper.division_tags]
1 = "FLO"
2 = "BTK"

[logging]
format = "json"
"#,
        )
        .unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.league_file, PathBuf::from("leagues/cup.toml"));
        assert_eq!(settings.logging.format, "json");
        assert_eq!(settings.logging.level, "info");
        assert_eq!(settings.sleeper.timeout_secs, 30);

        let fetcher = settings.fetcher_config();
        assert_eq!(fetcher.league_id, "1180208789911158784");
        assert_eq!(fetcher.division_tags.get(&2).map(String::as_str), Some("BTK"));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let settings = Settings::load(&temp_dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings.archive.data_dir, PathBuf::from("data/archive"));
        assert!(settings.archive_config().pretty_json);
    }

    #[test]
    fn test_invalid_log_format_is_rejected() {
        let mut settings = Settings::default();
        settings.logging.format = "xml".to_string();
        assert!(settings.validate().is_err());
    }
}
