use crate::types::{LeagueConfig, RegistryError, Result, TeamEntry};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};
use weekly_report::{LeagueRules, RosterRegistry, TeamNameLookup};

/// League Registry - owners, team names and divisions for one league
///
/// Owner lookups ignore case; the spelling from the league file is canonical.
#[derive(Debug, Clone)]
pub struct LeagueRegistry {
    config: LeagueConfig,

    /// Lower-cased owner id -> index into `config.teams`
    owners: HashMap<String, usize>,
}

impl LeagueRegistry {
    /// Build a registry from an already parsed config
    pub fn new(config: LeagueConfig) -> Result<Self> {
        let mut owners = HashMap::with_capacity(config.teams.len());

        if config.league.season <= 0 {
            return Err(RegistryError::Invalid(format!(
                "season must be positive, got {}",
                config.league.season
            )));
        }

        for (index, team) in config.teams.iter().enumerate() {
            let owner = team.owner.trim();
            if owner.is_empty() {
                return Err(RegistryError::Invalid(format!(
                    "team #{} has an empty owner",
                    index + 1
                )));
            }
            if owners.insert(owner.to_lowercase(), index).is_some() {
                return Err(RegistryError::Invalid(format!("owner '{owner}' is listed twice")));
            }
            if !config.divisions.is_empty() && !config.divisions.contains_key(&team.division) {
                return Err(RegistryError::Invalid(format!(
                    "owner '{}' is in unknown division '{}'",
                    owner, team.division
                )));
            }
        }

        if config.league.playoff_teams as usize > config.teams.len() {
            warn!(
                "League has {} playoff spots but only {} teams",
                config.league.playoff_teams,
                config.teams.len()
            );
        }

        Ok(Self { config, owners })
    }

    /// Parse a `league.toml` document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: LeagueConfig = toml::from_str(content)?;
        Self::new(config)
    }

    /// Load the league file from disk
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading league file from: {:?}", path);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| RegistryError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let registry = Self::from_toml_str(&content)?;

        info!(
            "Loaded league '{}' ({} season) with {} teams",
            registry.config.league.name,
            registry.config.league.season,
            registry.team_count()
        );
        Ok(registry)
    }

    pub fn config(&self) -> &LeagueConfig {
        &self.config
    }

    pub fn league_name(&self) -> &str {
        &self.config.league.name
    }

    pub fn season(&self) -> i32 {
        self.config.league.season
    }

    pub fn team_count(&self) -> usize {
        self.config.teams.len()
    }

    pub fn teams(&self) -> &[TeamEntry] {
        &self.config.teams
    }

    /// Rules handed to the metrics calculator
    pub fn rules(&self) -> LeagueRules {
        LeagueRules {
            playoff_teams: self.config.league.playoff_teams,
        }
    }

    /// Look up a team by owner id, ignoring case
    pub fn get_team(&self, owner: &str) -> Option<&TeamEntry> {
        self.owners.get(&owner.trim().to_lowercase()).map(|&index| &self.config.teams[index])
    }

    /// Full division name for a tag, falling back to the tag itself
    pub fn division_name<'a>(&'a self, tag: &'a str) -> &'a str {
        self.config.divisions.get(tag).map(String::as_str).unwrap_or(tag)
    }

    /// Headline for the week, cycling through the configured titles
    pub fn week_title(&self, week: u32) -> Option<&str> {
        let titles = &self.config.league.week_titles;
        if titles.is_empty() {
            return None;
        }
        Some(titles[week as usize % titles.len()].as_str())
    }

    pub fn is_regular_season(&self, week: u32) -> bool {
        week >= 1 && week <= self.config.league.regular_season_weeks
    }
}

impl RosterRegistry for LeagueRegistry {
    fn canonical_owner(&self, owner: &str) -> Option<String> {
        self.get_team(owner).map(|team| team.owner.clone())
    }

    fn division_of(&self, owner: &str) -> Option<String> {
        self.get_team(owner).map(|team| team.division.clone())
    }
}

impl TeamNameLookup for LeagueRegistry {
    fn team_name(&self, owner: &str) -> Option<String> {
        self.get_team(owner).and_then(|team| team.team.clone())
    }
}
