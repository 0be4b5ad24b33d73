//! Fetch -> build -> archive, one stage after another

use league_registry::{LeagueRegistry, RegistryError};
use season_archive::{ArchiveBackend, ArchiveError};
use sleeper_fetcher::{FetchError, SleeperFetcher};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info, warn};
use weekly_report::{
    build_weekly_report, MalformedInputError, PayloadError, RawBrief, WeekKey, WeeklyReport,
};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Malformed(#[from] MalformedInputError),

    #[error(transparent)]
    Payload(#[from] PayloadError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("failed to write report {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode report: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// File name a built report is written under
pub fn report_file_name(week: u32) -> String {
    format!("weekly_report_week{week}.json")
}

/// Runs the report stages against one league and one archive
pub struct Pipeline<'a> {
    registry: &'a LeagueRegistry,
    archive: &'a dyn ArchiveBackend,
}

impl<'a> Pipeline<'a> {
    pub fn new(registry: &'a LeagueRegistry, archive: &'a dyn ArchiveBackend) -> Self {
        Self { registry, archive }
    }

    /// Fetch a week from Sleeper, write it as a brief and return both
    pub async fn fetch(
        &self,
        fetcher: &SleeperFetcher,
        week: u32,
        dir: &Path,
    ) -> Result<(RawBrief, PathBuf)> {
        let brief = fetcher.fetch_brief(week).await.map_err(|e| {
            error!("Fetch for week {} failed: {}", week, e);
            e
        })?;
        let path = sleeper_fetcher::write_brief(&brief, dir, week).await?;
        Ok((brief, path))
    }

    /// Validate and derive. Every violation is logged before the error is returned.
    pub fn build(&self, raw: &RawBrief, key: WeekKey) -> Result<WeeklyReport> {
        match build_weekly_report(self.registry, self.registry.rules(), raw, key) {
            Ok(report) => {
                for warning in report.warnings() {
                    warn!("{}: {}", key, warning);
                }
                info!(
                    "Built report for {}: {} teams, {} matchups, {} awards",
                    key,
                    report.teams().len(),
                    report.matchups().len(),
                    report.awards().len()
                );
                Ok(report)
            }
            Err(err) => {
                for violation in &err.violations {
                    error!("{}: {}", key, violation);
                }
                Err(err.into())
            }
        }
    }

    /// Load a brief file and build its report
    pub fn build_from_file(&self, input: &Path, key: WeekKey) -> Result<WeeklyReport> {
        info!("Loading brief from: {:?}", input);
        let raw = RawBrief::load_from_file(input)?;
        self.build(&raw, key)
    }

    pub async fn archive(&self, report: &WeeklyReport) -> Result<()> {
        let record = self.archive.append(report).await?;
        info!("Archived {} at {}", record.key, record.archived_at);
        Ok(())
    }

    /// Archive (when asked) and then write the report file. A week that is
    /// already archived fails before the output file is touched.
    pub async fn publish(&self, report: &WeeklyReport, output: &Path, archive: bool) -> Result<()> {
        if archive {
            self.archive(report).await?;
        }
        write_report(report, output).await
    }
}

/// Write a report as pretty JSON. Nothing is written for a failed week.
pub async fn write_report(report: &WeeklyReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| PipelineError::Output {
                path: parent.to_path_buf(),
                source,
            })?;
    }

    let content = serde_json::to_string_pretty(report)?;
    tokio::fs::write(path, content)
        .await
        .map_err(|source| PipelineError::Output {
            path: path.to_path_buf(),
            source,
        })?;

    info!("Wrote report for {} to: {:?}", report.key(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use season_archive::InMemoryArchive;
    use tempfile::TempDir;

    const LEAGUE: &str = r#"
[league]
name = "16 Fantasies 1 Cup"
season = 2025
playoff_teams = 2
week_titles = ["Opening Day", "Rivalry Week"]

[divisions]
BTK = "Beat The Kids"
FLO = "Florida Men"

[[teams]]
owner = "Healzy"
team = "Healzy's Heroes"
division = "BTK"

[[teams]]
owner = "Coops"
team = "Coop de Grace"
division = "BTK"

[[teams]]
owner = "Stampy"
team = "Stampede"
division = "FLO"

[[teams]]
owner = "Poddy"
division = "FLO"
"#;

    const BRIEF: &str = r#"
WeekInfo: { Season: 2025, Week: 3 }
Standings:
  Overall:
    - { Owner: Healzy, Wins: 3, Losses: 0, PF: 355.2, PA: 290.1 }
    - { Owner: Coops, Wins: 1, Losses: 2, PF: 280.0, PA: 300.5 }
    - { Owner: Stampy, Wins: 1, Losses: 2, PF: 301.4, PA: 299.0 }
    - { Owner: Poddy, Wins: 1, Losses: 2, PF: 250.75, PA: 320.0 }
Matchups:
  - Teams:
      - { Owner: Healzy, Score: 108.62 }
      - { Owner: Coops, Score: 85.08 }
  - Teams:
      - { Owner: Stampy, Score: 97.3 }
      - { Owner: Poddy, Score: 112.4 }
"#;

    fn registry() -> LeagueRegistry {
        LeagueRegistry::from_toml_str(LEAGUE).unwrap()
    }

    #[tokio::test]
    async fn test_build_write_and_archive() {
        let registry = registry();
        let mut archive = InMemoryArchive::with_default_config();
        archive.initialize().await.unwrap();
        let pipeline = Pipeline::new(&registry, &archive);

        let key = WeekKey::new(2025, 3);
        let report = pipeline.build(&RawBrief::from_yaml_str(BRIEF).unwrap(), key).unwrap();
        assert_eq!(report.team("Healzy").unwrap().display_name, "Healzy's Heroes");
        assert!(report.team("Healzy").unwrap().playoff_position);

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out").join(report_file_name(3));
        write_report(&report, &path).await.unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let written: WeeklyReport = serde_json::from_str(&content).unwrap();
        assert_eq!(written, report);

        pipeline.archive(&report).await.unwrap();
        assert_eq!(archive.list_weeks(2025).await.unwrap(), vec![3]);

        // Append-only: the same week cannot be archived twice
        match pipeline.archive(&report).await {
            Err(PipelineError::Archive(ArchiveError::AlreadyExists(_))) => {}
            other => panic!("expected AlreadyExists, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_publish_keeps_output_of_archived_week() {
        let registry = registry();
        let mut archive = InMemoryArchive::with_default_config();
        archive.initialize().await.unwrap();
        let pipeline = Pipeline::new(&registry, &archive);

        let key = WeekKey::new(2025, 3);
        let report = pipeline.build(&RawBrief::from_yaml_str(BRIEF).unwrap(), key).unwrap();
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(report_file_name(3));
        pipeline.publish(&report, &path, true).await.unwrap();
        let published = std::fs::read_to_string(&path).unwrap();

        let rebuilt = BRIEF.replace("Score: 108.62", "Score: 118.62");
        let changed = pipeline.build(&RawBrief::from_yaml_str(&rebuilt).unwrap(), key).unwrap();
        assert!(matches!(
            pipeline.publish(&changed, &path, true).await,
            Err(PipelineError::Archive(ArchiveError::AlreadyExists(_)))
        ));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), published);

        // Without archiving the file is simply rewritten
        pipeline.publish(&changed, &path, false).await.unwrap();
        assert_ne!(std::fs::read_to_string(&path).unwrap(), published);
    }

    #[test]
    fn test_malformed_week_builds_nothing() {
        let registry = registry();
        let archive = InMemoryArchive::with_default_config();
        let pipeline = Pipeline::new(&registry, &archive);

        let broken = BRIEF.replace("{ Owner: Coops, Score: 85.08 }", "{ Score: 85.08 }");
        let raw = RawBrief::from_yaml_str(&broken).unwrap();

        match pipeline.build(&raw, WeekKey::new(2025, 3)) {
            Err(PipelineError::Malformed(err)) => {
                assert!(err.names_field("Matchups[0].Teams[1].Owner"))
            }
            other => panic!("expected malformed input, got {other:?}"),
        }
    }

    #[test]
    fn test_build_from_file_rejects_unknown_extension() {
        let registry = registry();
        let archive = InMemoryArchive::with_default_config();
        let pipeline = Pipeline::new(&registry, &archive);

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("brief.txt");
        std::fs::write(&path, BRIEF).unwrap();

        assert!(matches!(
            pipeline.build_from_file(&path, WeekKey::new(2025, 3)),
            Err(PipelineError::Payload(PayloadError::UnsupportedFormat(_)))
        ));
    }
}
