//! Turn Sleeper responses into the raw brief schema

use crate::models::*;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, warn};
use weekly_report::raw::{
    RawBrief, RawMatchup, RawMatchupTeam, RawPlayer, RawScalar, RawStandingRow, RawStandings,
    RawWeekInfo,
};

/// Everything fetched for one week
#[derive(Debug, Clone)]
pub struct WeekData {
    pub league: SleeperLeague,
    pub users: Vec<SleeperUser>,
    pub rosters: Vec<SleeperRoster>,
    pub matchups: Vec<SleeperMatchup>,
    pub players: PlayerDatabase,
}

/// Sleeper marks an empty starting slot with this id
const EMPTY_SLOT: &str = "0";

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Build the brief for `week`. Owners are the users' display names.
pub fn build_brief(week: u32, data: &WeekData, division_tags: &BTreeMap<u32, String>) -> RawBrief {
    let users: HashMap<&str, &SleeperUser> =
        data.users.iter().map(|u| (u.user_id.as_str(), u)).collect();
    let owners: HashMap<u32, String> = data
        .rosters
        .iter()
        .map(|roster| (roster.roster_id, owner_name(roster, &users)))
        .collect();

    let overall = data
        .rosters
        .iter()
        .map(|roster| {
            let settings = &roster.settings;
            RawStandingRow {
                owner: owners.get(&roster.roster_id).cloned().map(RawScalar::from),
                division: settings
                    .division
                    .and_then(|d| division_tags.get(&d))
                    .cloned()
                    .map(RawScalar::from),
                overall_rank: None,
                wins: Some(RawScalar::Int(settings.wins.into())),
                losses: Some(RawScalar::Int(settings.losses.into())),
                ties: Some(RawScalar::Int(settings.ties.into())),
                points_for: Some(RawScalar::Float(round2(settings.points_for()))),
                points_against: Some(RawScalar::Float(round2(settings.points_against()))),
            }
        })
        .collect();

    let slots = data.league.starter_slots();
    let mut paired: BTreeMap<u32, Vec<&SleeperMatchup>> = BTreeMap::new();
    for entry in &data.matchups {
        match entry.matchup_id {
            Some(id) => paired.entry(id).or_default().push(entry),
            None => debug!("Roster {} has no matchup this week", entry.roster_id),
        }
    }

    let matchups = paired
        .into_iter()
        .map(|(id, mut entries)| {
            if entries.len() != 2 {
                warn!("Sleeper matchup {} has {} teams", id, entries.len());
            }
            entries.sort_by_key(|e| e.roster_id);
            let teams = entries
                .into_iter()
                .map(|e| matchup_team(e, &owners, &slots, &data.players))
                .collect();
            RawMatchup { teams: Some(teams) }
        })
        .collect();

    RawBrief {
        week_info: Some(RawWeekInfo {
            season: data.league.season.trim().parse::<i64>().ok().map(RawScalar::Int),
            week: Some(RawScalar::Int(week.into())),
        }),
        standings: Some(RawStandings {
            overall: Some(overall),
            divisional: None,
        }),
        matchups: Some(matchups),
        awards: None,
    }
}

pub(crate) fn owner_name(roster: &SleeperRoster, users: &HashMap<&str, &SleeperUser>) -> String {
    roster
        .owner_id
        .as_deref()
        .and_then(|id| users.get(id))
        .and_then(|user| user.display_name.clone().or_else(|| user.username.clone()))
        .unwrap_or_else(|| {
            warn!("Roster {} has no owner", roster.roster_id);
            format!("Roster {}", roster.roster_id)
        })
}

fn matchup_team(
    entry: &SleeperMatchup,
    owners: &HashMap<u32, String>,
    slots: &[String],
    players: &PlayerDatabase,
) -> RawMatchupTeam {
    let starters: Vec<RawPlayer> = entry
        .starters
        .iter()
        .enumerate()
        .filter(|(_, id)| id.as_str() != EMPTY_SLOT)
        .map(|(i, id)| {
            let points = entry
                .starters_points
                .get(i)
                .copied()
                .or_else(|| entry.players_points.get(id).copied())
                .unwrap_or_default();
            player_line(id, slots.get(i).map(String::as_str), points, players)
        })
        .collect();

    let started: HashSet<&str> = entry.starters.iter().map(String::as_str).collect();
    let bench = entry.players.as_ref().map(|all| {
        let mut bench: Vec<&String> =
            all.iter().filter(|id| !started.contains(id.as_str())).collect();
        bench.sort();
        bench
            .into_iter()
            .map(|id| {
                let points = entry.players_points.get(id).copied().unwrap_or_default();
                player_line(id, None, points, players)
            })
            .collect()
    });

    RawMatchupTeam {
        owner: owners.get(&entry.roster_id).cloned().map(RawScalar::from),
        score: Some(RawScalar::Float(round2(entry.points))),
        starters: Some(starters),
        bench,
    }
}

fn player_line(id: &str, slot: Option<&str>, points: f64, players: &PlayerDatabase) -> RawPlayer {
    let player = players.get(id);
    let name = player.and_then(SleeperPlayer::display_name).unwrap_or_else(|| id.to_string());
    let position = player.and_then(|p| p.position.clone()).or_else(|| slot.map(str::to_string));

    RawPlayer {
        player: Some(RawScalar::from(name)),
        position: position.map(RawScalar::from),
        slot: slot.map(RawScalar::from),
        points: Some(RawScalar::Float(points)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn week_data() -> WeekData {
        let league: SleeperLeague = serde_json::from_value(json!({
            "league_id": "1180208789911158784",
            "name": "16 Fantasies 1 Cup",
            "season": "2025",
            "total_rosters": 4,
            "roster_positions": ["QB", "RB", "FLEX", "BN", "BN", "IR"]
        }))
        .unwrap();
        let users: Vec<SleeperUser> = serde_json::from_value(json!([
            { "user_id": "u1", "display_name": "Healzy" },
            { "user_id": "u2", "display_name": "Coops" },
            { "user_id": "u3", "username": "stampy" }
        ]))
        .unwrap();
        let rosters: Vec<SleeperRoster> = serde_json::from_value(json!([
            {
                "roster_id": 1,
                "owner_id": "u1",
                "settings": {
                    "wins": 3, "losses": 0, "fpts": 355, "fpts_decimal": 20,
                    "fpts_against": 290, "fpts_against_decimal": 10, "division": 2
                }
            },
            {
                "roster_id": 2,
                "owner_id": "u2",
                "settings": { "wins": 1, "losses": 2, "fpts": 270, "fpts_against": 301 }
            },
            { "roster_id": 3, "owner_id": "u3", "settings": {} },
            { "roster_id": 4, "owner_id": null }
        ]))
        .unwrap();
        let matchups: Vec<SleeperMatchup> = serde_json::from_value(json!([
            {
                "roster_id": 2, "matchup_id": 1, "points": 30.0,
                "starters": ["p4", "p5", "0"], "starters_points": [20.0, 10.0, 0.0],
                "players": ["p4", "p5", "p6"],
                "players_points": { "p4": 20.0, "p5": 10.0, "p6": 3.5 }
            },
            {
                "roster_id": 1, "matchup_id": 1, "points": 41.25,
                "starters": ["p1", "p2", "p3"], "starters_points": [24.5, 6.75, 10.0]
            },
            { "roster_id": 3, "matchup_id": null, "points": 0.0 }
        ]))
        .unwrap();
        let players: PlayerDatabase = serde_json::from_value(json!({
            "p1": { "full_name": "Josh Allen", "position": "QB", "team": "BUF" },
            "p2": { "first_name": "Saquon", "last_name": "Barkley", "position": "RB" },
            "p3": { "full_name": "Travis Kelce", "position": "TE" },
            "p4": { "full_name": "Jalen Hurts", "position": "QB" },
            "p6": { "full_name": "Bijan Robinson", "position": "RB" }
        }))
        .unwrap();

        WeekData {
            league,
            users,
            rosters,
            matchups,
            players,
        }
    }

    #[test]
    fn test_build_brief_standings() {
        let mut tags = BTreeMap::new();
        tags.insert(2, "BTK".to_string());
        let brief = build_brief(3, &week_data(), &tags);

        let info = brief.week_info.as_ref().unwrap();
        assert_eq!(info.season, Some(RawScalar::Int(2025)));
        assert_eq!(info.week, Some(RawScalar::Int(3)));

        let overall = brief.standings.unwrap().overall.unwrap();
        assert_eq!(overall.len(), 4);
        assert_eq!(overall[0].owner, Some(RawScalar::from("Healzy")));
        assert_eq!(overall[0].division, Some(RawScalar::from("BTK")));
        assert_eq!(overall[0].points_for, Some(RawScalar::Float(355.2)));
        assert_eq!(overall[0].points_against, Some(RawScalar::Float(290.1)));
        assert_eq!(overall[1].division, None);
        assert_eq!(overall[2].owner, Some(RawScalar::from("stampy")));
        assert_eq!(overall[3].owner, Some(RawScalar::from("Roster 4")));
    }

    #[test]
    fn test_build_brief_matchups() {
        let brief = build_brief(3, &week_data(), &BTreeMap::new());
        let matchups = brief.matchups.unwrap();

        // The bye entry is dropped, the pair is ordered by roster id
        assert_eq!(matchups.len(), 1);
        let teams = matchups[0].teams.as_ref().unwrap();
        assert_eq!(teams[0].owner, Some(RawScalar::from("Healzy")));
        assert_eq!(teams[0].score, Some(RawScalar::Float(41.25)));

        let healzy = teams[0].starters.as_ref().unwrap();
        assert_eq!(healzy[1].player, Some(RawScalar::from("Saquon Barkley")));
        assert_eq!(healzy[2].slot, Some(RawScalar::from("FLEX")));
        assert_eq!(healzy[2].position, Some(RawScalar::from("TE")));
        assert!(teams[0].bench.is_none());

        let coops = &teams[1];
        let starters = coops.starters.as_ref().unwrap();
        assert_eq!(starters.len(), 2);
        // p5 is missing from the player database
        assert_eq!(starters[1].player, Some(RawScalar::from("p5")));
        assert_eq!(starters[1].position, Some(RawScalar::from("RB")));

        let bench = coops.bench.as_ref().unwrap();
        assert_eq!(bench.len(), 1);
        assert_eq!(bench[0].player, Some(RawScalar::from("Bijan Robinson")));
        assert_eq!(bench[0].points, Some(RawScalar::Float(3.5)));
    }
}
