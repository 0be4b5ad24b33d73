use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

/// Contents of `league.toml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueConfig {
    pub league: LeagueInfo,

    /// Division tag -> full division name
    #[serde(default)]
    pub divisions: BTreeMap<String, String>,

    #[serde(default)]
    pub teams: Vec<TeamEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueInfo {
    pub name: String,
    pub season: i32,

    #[serde(default = "default_playoff_teams")]
    pub playoff_teams: u32,

    #[serde(default = "default_regular_season_weeks")]
    pub regular_season_weeks: u32,

    /// Newsletter headlines, picked by week number
    #[serde(default)]
    pub week_titles: Vec<String>,
}

fn default_playoff_teams() -> u32 {
    8
}

fn default_regular_season_weeks() -> u32 {
    14
}

/// One franchise in the league
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamEntry {
    /// Owner id as it appears in payloads
    pub owner: String,

    /// Team display name; the owner id is shown when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,

    /// Division tag
    pub division: String,
}

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("failed to read league file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid league file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid league configuration: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, RegistryError>;
