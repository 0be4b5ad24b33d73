//! # Command Line Interface
//!
//! `fetch`, `preweek`, `build`, `show` and `weeks` subcommands over the report pipeline.

use crate::pipeline::{report_file_name, Pipeline};
use crate::settings::Settings;
use crate::summary::{render_summary, render_upcoming};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use league_registry::LeagueRegistry;
use season_archive::{open_local_archive_with_config, ArchiveBackend, LocalArchive};
use sleeper_fetcher::{brief_file_name, write_upcoming, SleeperFetcher};
use std::path::PathBuf;
use tracing::info;
use weekly_report::WeekKey;

/// Newsletter data pipeline for a Sleeper fantasy league
#[derive(Parser)]
#[command(name = "newsletter")]
#[command(about = "Build and archive weekly fantasy league newsletter reports")]
#[command(version)]
pub struct Cli {
    /// Settings file, layered under NEWSLETTER__* environment variables
    #[arg(short, long, default_value = "config/newsletter.toml")]
    pub config: PathBuf,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch a week from Sleeper and write its creative brief
    Fetch {
        /// Week to fetch; defaults to the current NFL week
        #[arg(long)]
        week: Option<u32>,
    },
    /// Fetch the pairings of an unplayed week joined with the current standings
    Preweek {
        /// Week to preview; defaults to the current NFL week
        #[arg(long)]
        week: Option<u32>,
    },
    /// Build a week's report from its brief and archive it
    Build {
        #[arg(long)]
        week: u32,

        /// Defaults to the league file's season
        #[arg(long)]
        season: Option<i32>,

        /// Brief to read; defaults to the fetched brief in the weekly directory
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Report JSON to write; defaults to the weekly directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Fetch the brief from Sleeper first
        #[arg(long)]
        fetch: bool,

        /// Skip appending the report to the season archive
        #[arg(long)]
        no_archive: bool,
    },
    /// Print an archived report
    Show {
        #[arg(long)]
        season: Option<i32>,

        /// Defaults to the latest archived week
        #[arg(long)]
        week: Option<u32>,

        /// Print the stored JSON instead of the summary
        #[arg(long)]
        json: bool,
    },
    /// List the archived weeks of a season
    Weeks {
        #[arg(long)]
        season: Option<i32>,
    },
}

/// CLI handler
pub struct CliHandler {
    settings: Settings,
}

impl CliHandler {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Handle CLI command
    pub async fn handle_command(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Fetch { week } => self.fetch(week).await,
            Commands::Preweek { week } => self.preweek(week).await,
            Commands::Build {
                week,
                season,
                input,
                output,
                fetch,
                no_archive,
            } => self.build(week, season, input, output, fetch, !no_archive).await,
            Commands::Show { season, week, json } => self.show(season, week, json).await,
            Commands::Weeks { season } => self.weeks(season).await,
        }
    }

    async fn load_registry(&self) -> Result<LeagueRegistry> {
        LeagueRegistry::load_from_file(&self.settings.league_file)
            .await
            .with_context(|| format!("Failed to load league file {:?}", self.settings.league_file))
    }

    async fn open_archive(&self) -> Result<LocalArchive> {
        open_local_archive_with_config(self.settings.archive_config())
            .await
            .context("Failed to open season archive")
    }

    fn fetcher(&self) -> Result<SleeperFetcher> {
        SleeperFetcher::new(self.settings.fetcher_config())
            .context("Failed to create Sleeper client")
    }

    async fn resolve_week(&self, fetcher: &SleeperFetcher, week: Option<u32>) -> Result<u32> {
        if let Some(week) = week {
            return Ok(week);
        }
        let state = fetcher
            .fetch_nfl_state()
            .await
            .context("Failed to read the current NFL week")?;
        info!("Current NFL week is {} of {}", state.week, state.season);
        Ok(state.week)
    }

    async fn fetch(&self, week: Option<u32>) -> Result<()> {
        let fetcher = self.fetcher()?;
        let week = self.resolve_week(&fetcher, week).await?;

        let registry = self.load_registry().await?;
        let archive = self.open_archive().await?;
        let pipeline = Pipeline::new(&registry, &archive);

        let (_, path) = pipeline
            .fetch(&fetcher, week, &self.settings.output.weekly_dir)
            .await
            .with_context(|| format!("Failed to fetch week {week}"))?;
        println!("{}", path.display());
        Ok(())
    }

    async fn preweek(&self, week: Option<u32>) -> Result<()> {
        let fetcher = self.fetcher()?;
        let week = self.resolve_week(&fetcher, week).await?;
        let registry = self.load_registry().await?;

        let upcoming = fetcher
            .fetch_upcoming(week)
            .await
            .with_context(|| format!("Failed to fetch upcoming matchups for week {week}"))?;
        let path = write_upcoming(&upcoming, &self.settings.output.weekly_dir)
            .await
            .context("Failed to write upcoming matchups")?;

        print!("{}", render_upcoming(&upcoming, &registry));
        println!("{}", path.display());
        Ok(())
    }

    async fn build(
        &self,
        week: u32,
        season: Option<i32>,
        input: Option<PathBuf>,
        output: Option<PathBuf>,
        fetch: bool,
        archive_report: bool,
    ) -> Result<()> {
        let registry = self.load_registry().await?;
        let archive = self.open_archive().await?;
        let pipeline = Pipeline::new(&registry, &archive);

        let key = WeekKey::new(season.unwrap_or_else(|| registry.season()), week);
        if !registry.is_regular_season(week) {
            info!("Week {} is outside the regular season", week);
        }

        let built = if fetch {
            let fetcher = self.fetcher()?;
            let (brief, _) = pipeline
                .fetch(&fetcher, week, &self.settings.output.weekly_dir)
                .await
                .with_context(|| format!("Failed to fetch week {week}"))?;
            pipeline.build(&brief, key)
        } else {
            let input = input
                .unwrap_or_else(|| self.settings.output.weekly_dir.join(brief_file_name(week)));
            pipeline.build_from_file(&input, key)
        };
        let report = built.with_context(|| format!("Failed to build report for {key}"))?;

        let output = output
            .unwrap_or_else(|| self.settings.output.weekly_dir.join(report_file_name(week)));
        pipeline
            .publish(&report, &output, archive_report)
            .await
            .with_context(|| format!("Failed to publish {key}"))?;

        println!("{}", output.display());
        Ok(())
    }

    async fn show(&self, season: Option<i32>, week: Option<u32>, json: bool) -> Result<()> {
        let registry = self.load_registry().await?;
        let archive = self.open_archive().await?;
        let season = season.unwrap_or_else(|| registry.season());

        let record = match week {
            Some(week) => archive.load(WeekKey::new(season, week)).await?,
            None => archive
                .latest(season)
                .await?
                .with_context(|| format!("No archived reports for season {season}"))?,
        };

        if json {
            println!("{}", serde_json::to_string_pretty(&record.report)?);
        } else {
            println!("{}", render_summary(&record.report, &registry));
            println!("Archived {}", record.archived_at.format("%Y-%m-%d %H:%M UTC"));
        }
        Ok(())
    }

    async fn weeks(&self, season: Option<i32>) -> Result<()> {
        let archive = self.open_archive().await?;
        let season = match season {
            Some(season) => season,
            None => self.load_registry().await?.season(),
        };

        let weeks = archive.list_weeks(season).await?;
        if weeks.is_empty() {
            println!("No archived reports for season {season}");
        }
        for week in weeks {
            println!("season {season} week {week}");
        }
        Ok(())
    }
}
