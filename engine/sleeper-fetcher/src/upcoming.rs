//! Pairings for a week that has not been played yet
//!
//! Sleeper publishes `matchups/{week}` ahead of kickoff with zero points, so
//! the pairings are known before the week is scored. Each side is joined with
//! the current standings. When the week has no published pairings the teams
//! are paired off down the standings instead (1 v 2, 3 v 4, ...).

use crate::convert::{owner_name, round2};
use crate::error::{FetchError, Result};
use crate::models::{SleeperMatchup, SleeperRoster, SleeperUser};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A team as it stands going into the week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingEntry {
    pub owner: String,
    pub division: Option<String>,
    /// 1-based league rank: wins desc, points-for desc, points-against asc, owner asc
    pub rank: u32,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub points_for: f64,
    pub points_against: f64,
}

impl StandingEntry {
    pub fn record(&self) -> String {
        if self.ties > 0 {
            format!("{}-{}-{}", self.wins, self.losses, self.ties)
        } else {
            format!("{}-{}", self.wins, self.losses)
        }
    }
}

/// Where the pairings came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairingSource {
    Sleeper,
    Standings,
}

/// One upcoming game; `home` is the better-ranked side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpcomingMatchup {
    pub matchup_id: u32,
    pub home: StandingEntry,
    pub away: StandingEntry,
}

impl UpcomingMatchup {
    /// Both teams are in the same division
    pub fn is_divisional(&self) -> bool {
        self.home.division.is_some() && self.home.division == self.away.division
    }
}

/// The preweek slate: every pairing of the week plus the table it was joined with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpcomingWeek {
    pub season: Option<i32>,
    pub week: u32,
    pub source: PairingSource,
    pub matchups: Vec<UpcomingMatchup>,
    pub standings: Vec<StandingEntry>,
}

/// Rank every roster by its season-to-date record
pub fn standings_table(
    rosters: &[SleeperRoster],
    users: &[SleeperUser],
    division_tags: &BTreeMap<u32, String>,
) -> Vec<StandingEntry> {
    let users: HashMap<&str, &SleeperUser> =
        users.iter().map(|u| (u.user_id.as_str(), u)).collect();

    let mut table: Vec<StandingEntry> = rosters
        .iter()
        .map(|roster| {
            let settings = &roster.settings;
            StandingEntry {
                owner: owner_name(roster, &users),
                division: settings.division.and_then(|d| division_tags.get(&d)).cloned(),
                rank: 0,
                wins: settings.wins,
                losses: settings.losses,
                ties: settings.ties,
                points_for: round2(settings.points_for()),
                points_against: round2(settings.points_against()),
            }
        })
        .collect();

    table.sort_by(|a, b| {
        b.wins
            .cmp(&a.wins)
            .then_with(|| b.points_for.total_cmp(&a.points_for))
            .then_with(|| a.points_against.total_cmp(&b.points_against))
            .then_with(|| a.owner.cmp(&b.owner))
    });
    for (index, entry) in table.iter_mut().enumerate() {
        entry.rank = index as u32 + 1;
    }
    table
}

/// Join the week's Sleeper pairings with the standings, falling back to
/// pairing down the standings when Sleeper has none for the week.
pub fn pair_upcoming(
    season: Option<i32>,
    week: u32,
    rosters: &[SleeperRoster],
    users: &[SleeperUser],
    matchups: &[SleeperMatchup],
    division_tags: &BTreeMap<u32, String>,
) -> UpcomingWeek {
    let standings = standings_table(rosters, users, division_tags);

    let users_by_id: HashMap<&str, &SleeperUser> =
        users.iter().map(|u| (u.user_id.as_str(), u)).collect();
    let owners: HashMap<u32, String> = rosters
        .iter()
        .map(|roster| (roster.roster_id, owner_name(roster, &users_by_id)))
        .collect();
    let by_owner: HashMap<&str, &StandingEntry> =
        standings.iter().map(|e| (e.owner.as_str(), e)).collect();

    let mut grouped: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
    for entry in matchups {
        match entry.matchup_id {
            Some(id) => grouped.entry(id).or_default().push(entry.roster_id),
            None => debug!("Roster {} has a bye in week {}", entry.roster_id, week),
        }
    }

    let mut paired = Vec::with_capacity(grouped.len());
    for (id, rosters) in grouped {
        let sides: Vec<&StandingEntry> = rosters
            .iter()
            .filter_map(|roster_id| owners.get(roster_id))
            .filter_map(|owner| by_owner.get(owner.as_str()).copied())
            .collect();
        match sides.as_slice() {
            [a, b] => paired.push(ordered(id, a, b)),
            _ => warn!(
                "Sleeper matchup {} in week {} has {} known teams, skipped",
                id,
                week,
                sides.len()
            ),
        }
    }

    if !paired.is_empty() {
        return UpcomingWeek {
            season,
            week,
            source: PairingSource::Sleeper,
            matchups: paired,
            standings,
        };
    }

    info!("No Sleeper pairings for week {}, pairing teams by standings", week);
    UpcomingWeek {
        season,
        week,
        source: PairingSource::Standings,
        matchups: pair_by_standings(&standings),
        standings,
    }
}

/// Neighbours in the table play each other; an odd team out sits the week
pub fn pair_by_standings(standings: &[StandingEntry]) -> Vec<UpcomingMatchup> {
    standings
        .chunks_exact(2)
        .enumerate()
        .map(|(index, pair)| ordered(index as u32 + 1, &pair[0], &pair[1]))
        .collect()
}

fn ordered(matchup_id: u32, a: &StandingEntry, b: &StandingEntry) -> UpcomingMatchup {
    let (home, away) = if a.rank <= b.rank { (a, b) } else { (b, a) };
    UpcomingMatchup {
        matchup_id,
        home: home.clone(),
        away: away.clone(),
    }
}

/// File name the preweek slate is written under
pub fn upcoming_file_name(week: u32) -> String {
    format!("preweek_week{week}.json")
}

/// Write the slate as pretty JSON into `dir`, returning the file path
pub async fn write_upcoming(upcoming: &UpcomingWeek, dir: &Path) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| FetchError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

    let path = dir.join(upcoming_file_name(upcoming.week));
    let content = serde_json::to_string_pretty(upcoming).map_err(FetchError::Encode)?;
    tokio::fs::write(&path, content)
        .await
        .map_err(|source| FetchError::Io {
            path: path.clone(),
            source,
        })?;

    info!(
        "Wrote {} upcoming matchups for week {} to: {:?}",
        upcoming.matchups.len(),
        upcoming.week,
        path
    );
    Ok(path)
}
