//! Sleeper API response models (only the fields the newsletter uses)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// `GET league/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleeperLeague {
    pub league_id: String,
    pub name: String,
    pub season: String,
    #[serde(default)]
    pub total_rosters: Option<u32>,
    /// Starter slots first, then BN/IR/TAXI
    #[serde(default)]
    pub roster_positions: Vec<String>,
}

impl SleeperLeague {
    /// Lineup slots that score points
    pub fn starter_slots(&self) -> Vec<String> {
        self.roster_positions
            .iter()
            .filter(|slot| !matches!(slot.as_str(), "BN" | "IR" | "TAXI"))
            .cloned()
            .collect()
    }
}

/// `GET league/{id}/users`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleeperUser {
    pub user_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

/// `GET league/{id}/rosters`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleeperRoster {
    pub roster_id: u32,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub settings: RosterSettings,
}

/// Season-to-date record kept on each roster
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterSettings {
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub fpts: u32,
    pub fpts_decimal: u32,
    pub fpts_against: u32,
    pub fpts_against_decimal: u32,
    pub division: Option<u32>,
}

impl RosterSettings {
    pub fn points_for(&self) -> f64 {
        self.fpts as f64 + self.fpts_decimal as f64 / 100.0
    }

    pub fn points_against(&self) -> f64 {
        self.fpts_against as f64 + self.fpts_against_decimal as f64 / 100.0
    }
}

/// `GET league/{id}/matchups/{week}`: one entry per roster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleeperMatchup {
    pub roster_id: u32,
    /// Entries sharing an id play each other; null during bye weeks
    #[serde(default)]
    pub matchup_id: Option<u32>,
    #[serde(default)]
    pub points: f64,
    #[serde(default)]
    pub starters: Vec<String>,
    #[serde(default)]
    pub starters_points: Vec<f64>,
    #[serde(default)]
    pub players: Option<Vec<String>>,
    #[serde(default)]
    pub players_points: HashMap<String, f64>,
}

/// Entry of `GET players/nfl`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SleeperPlayer {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
}

impl SleeperPlayer {
    pub fn display_name(&self) -> Option<String> {
        if let Some(name) = &self.full_name {
            return Some(name.clone());
        }
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => Some(format!("{first} {last}")),
            (Some(only), None) | (None, Some(only)) => Some(only.clone()),
            (None, None) => None,
        }
    }
}

/// Player id -> player
pub type PlayerDatabase = HashMap<String, SleeperPlayer>;

/// `GET state/nfl`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NflState {
    pub week: u32,
    pub season: String,
    #[serde(default)]
    pub season_type: Option<String>,
    #[serde(default)]
    pub display_week: Option<u32>,
}
