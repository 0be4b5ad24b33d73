use crate::error::{MalformedInputError, ReportWarning, Violation};
use crate::lineup::round2;
use crate::models::*;
use crate::raw::{RawBrief, RawMatchupTeam, RawPlayer, RawScalar, RawStandingRow};
use crate::roster::{RosterRegistry, TeamNameLookup};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info, warn};

/// Allowed drift between the starter sum and the reported score
const STARTER_SUM_TOLERANCE: f64 = 0.05;

/// Validates a raw brief and produces the canonical week
pub struct Normalizer<'a> {
    roster: &'a dyn RosterRegistry,
    names: &'a dyn TeamNameLookup,
}

/// Field-path scoped violation collector
#[derive(Default)]
struct Violations(Vec<Violation>);

impl Violations {
    fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(Violation::new(field, message));
    }

    fn text(&mut self, field: &str, value: Option<&RawScalar>) -> Option<String> {
        match value {
            None => {
                self.push(field, "missing");
                None
            }
            Some(scalar) => match scalar.as_text().filter(|s| !s.is_empty()) {
                Some(text) => Some(text),
                None => {
                    self.push(field, "must be non-empty text");
                    None
                }
            },
        }
    }

    fn count(
        &mut self,
        field: &str,
        value: Option<&RawScalar>,
        default: Option<u32>,
    ) -> Option<u32> {
        let Some(scalar) = value else {
            if default.is_none() {
                self.push(field, "missing");
            }
            return default;
        };
        match scalar.as_i64() {
            Some(v) if v < 0 => {
                self.push(field, format!("must be non-negative, found {v}"));
                None
            }
            Some(v) => match u32::try_from(v) {
                Ok(v) => Some(v),
                Err(_) => {
                    self.push(field, format!("out of range: {v}"));
                    None
                }
            },
            None => {
                self.push(field, "must be a whole number");
                None
            }
        }
    }

    fn amount(&mut self, field: &str, value: Option<&RawScalar>) -> Option<f64> {
        let points = self.points(field, value)?;
        if points < 0.0 {
            self.push(field, format!("must be non-negative, found {points}"));
            return None;
        }
        Some(points)
    }

    fn points(&mut self, field: &str, value: Option<&RawScalar>) -> Option<f64> {
        let Some(scalar) = value else {
            self.push(field, "missing");
            return None;
        };
        match scalar.as_f64() {
            Some(v) => Some(v),
            None => {
                self.push(field, "must be a number");
                None
            }
        }
    }
}

impl<'a> Normalizer<'a> {
    pub fn new(roster: &'a dyn RosterRegistry, names: &'a dyn TeamNameLookup) -> Self {
        Self { roster, names }
    }

    /// Validate `raw` for the selected week.
    ///
    /// Every problem found is collected; a single violation rejects the week.
    pub fn normalize(
        &self,
        raw: &RawBrief,
        key: WeekKey,
    ) -> Result<NormalizedWeek, MalformedInputError> {
        let mut violations = Violations::default();
        let mut warnings = Vec::new();

        self.check_week_info(raw, key, &mut violations);
        let teams = self.normalize_standings(raw, &mut violations, &mut warnings);
        let matchups = self.normalize_matchups(raw, key, &teams, &mut violations);
        let award_hints = self.normalize_awards(raw, &mut violations);

        if !violations.0.is_empty() {
            warn!("Rejected payload for {}: {} violation(s)", key, violations.0.len());
            return Err(MalformedInputError {
                key,
                violations: violations.0,
            });
        }

        info!("Normalized {}: {} teams, {} matchups", key, teams.len(), matchups.len());

        Ok(NormalizedWeek {
            key,
            teams,
            matchups,
            award_hints,
            warnings,
        })
    }

    fn check_week_info(&self, raw: &RawBrief, key: WeekKey, violations: &mut Violations) {
        let Some(info) = &raw.week_info else {
            return;
        };

        if let Some(season) = &info.season {
            match season.as_i64() {
                Some(s) if s == i64::from(key.season) => {}
                Some(s) => violations.push(
                    "WeekInfo.Season",
                    format!("expected {}, found {}", key.season, s),
                ),
                None => violations.push("WeekInfo.Season", "must be a whole number"),
            }
        }
        if let Some(week) = &info.week {
            match week.as_i64() {
                Some(w) if w == i64::from(key.week) => {}
                Some(w) => {
                    violations.push("WeekInfo.Week", format!("expected {}, found {}", key.week, w))
                }
                None => violations.push("WeekInfo.Week", "must be a whole number"),
            }
        }
    }

    fn resolve_owner(
        &self,
        field: &str,
        value: Option<&RawScalar>,
        violations: &mut Violations,
    ) -> Option<String> {
        let owner = violations.text(field, value)?;
        match self.roster.canonical_owner(&owner) {
            Some(canonical) => Some(canonical),
            None => {
                violations.push(field, format!("unknown owner '{owner}'"));
                None
            }
        }
    }

    fn normalize_standings(
        &self,
        raw: &RawBrief,
        violations: &mut Violations,
        warnings: &mut Vec<ReportWarning>,
    ) -> Vec<TeamRecord> {
        let Some(rows) = raw.standings.as_ref().and_then(|s| s.overall.as_ref()) else {
            violations.push("Standings.Overall", "missing");
            return Vec::new();
        };

        let mut teams = Vec::with_capacity(rows.len());
        let mut seen = HashSet::new();
        // lower-cased tag -> first spelling seen, so `BTK` and `btk` stay one division
        let mut spellings: HashMap<String, String> = HashMap::new();

        for (i, row) in rows.iter().enumerate() {
            let path = format!("Standings.Overall[{i}]");
            if let Some(mut team) = self.normalize_row(&path, row, violations) {
                let tag = std::mem::take(&mut team.division);
                team.division = spellings.entry(tag.to_lowercase()).or_insert(tag).clone();
                if !seen.insert(team.owner.clone()) {
                    let message = format!("duplicate owner '{}'", team.owner);
                    violations.push(format!("{path}.Owner"), message);
                    continue;
                }
                if self.names.team_name(&team.owner).is_none() {
                    warn!("No team name for owner '{}', using owner id", team.owner);
                    warnings.push(ReportWarning::UnresolvedOwner {
                        owner: team.owner.clone(),
                    });
                }
                teams.push(team);
            }
        }

        if let Some(divisional) = raw.standings.as_ref().and_then(|s| s.divisional.as_ref()) {
            let by_owner: HashMap<&str, &TeamRecord> =
                teams.iter().map(|t| (t.owner.as_str(), t)).collect();
            for (tag, rows) in divisional {
                for (j, row) in rows.iter().enumerate() {
                    let path = format!("Standings.Divisional.{tag}[{j}].Owner");
                    let Some(owner) = self.resolve_owner(&path, row.owner.as_ref(), violations)
                    else {
                        continue;
                    };
                    let message = match by_owner.get(owner.as_str()) {
                        None => format!("'{owner}' is not in the overall standings"),
                        Some(team) if !team.division.eq_ignore_ascii_case(tag) => format!(
                            "'{owner}' is in division {} in the overall standings",
                            team.division
                        ),
                        Some(_) => continue,
                    };
                    violations.push(path, message);
                }
            }
        }

        teams
    }

    fn normalize_row(
        &self,
        path: &str,
        row: &RawStandingRow,
        violations: &mut Violations,
    ) -> Option<TeamRecord> {
        let owner = self.resolve_owner(&format!("{path}.Owner"), row.owner.as_ref(), violations);
        let wins = violations.count(&format!("{path}.Wins"), row.wins.as_ref(), None);
        let losses = violations.count(&format!("{path}.Losses"), row.losses.as_ref(), None);
        let ties = violations.count(&format!("{path}.Ties"), row.ties.as_ref(), Some(0));
        let points_for = violations.amount(&format!("{path}.PF"), row.points_for.as_ref());
        let points_against = violations.amount(&format!("{path}.PA"), row.points_against.as_ref());

        let owner = owner?;
        let field = format!("{path}.Division");
        let registered = self.roster.division_of(&owner);
        let division = match (&row.division, registered) {
            (Some(value), registered) => {
                violations.text(&field, Some(value)).and_then(|tag| match registered {
                    None => Some(tag),
                    Some(division) if division.eq_ignore_ascii_case(&tag) => Some(division),
                    Some(division) => {
                        violations.push(
                            field.as_str(),
                            format!("'{tag}' does not match registered division '{division}'"),
                        );
                        None
                    }
                })
            }
            (None, Some(division)) => Some(division),
            (None, None) => {
                violations.push(field.as_str(), "missing and not registered for owner");
                None
            }
        };

        let display_name = self.names.team_name(&owner).unwrap_or_else(|| owner.clone());

        Some(TeamRecord {
            owner,
            display_name,
            division: division?,
            wins: wins?,
            losses: losses?,
            ties: ties?,
            points_for: points_for?,
            points_against: points_against?,
        })
    }

    fn normalize_matchups(
        &self,
        raw: &RawBrief,
        key: WeekKey,
        teams: &[TeamRecord],
        violations: &mut Violations,
    ) -> Vec<NormalizedMatchup> {
        let Some(raw_matchups) = &raw.matchups else {
            violations.push("Matchups", "missing");
            return Vec::new();
        };

        let standings: HashSet<&str> = teams.iter().map(|t| t.owner.as_str()).collect();
        let mut scheduled: HashMap<String, usize> = HashMap::new();
        let mut matchups = Vec::with_capacity(raw_matchups.len());

        for (i, matchup) in raw_matchups.iter().enumerate() {
            let path = format!("Matchups[{i}].Teams");
            let Some(sides) = &matchup.teams else {
                violations.push(path, "missing");
                continue;
            };
            if sides.len() != 2 {
                violations.push(path, format!("expected 2 teams, found {}", sides.len()));
                continue;
            }

            let mut scores = Vec::with_capacity(2);
            for (j, side) in sides.iter().enumerate() {
                let side_path = format!("{path}[{j}]");
                let Some(score) = self.normalize_side(&side_path, side, key, violations) else {
                    continue;
                };

                if !standings.contains(score.owner.as_str()) {
                    let message = format!("'{}' is not in the standings", score.owner);
                    violations.push(format!("{side_path}.Owner"), message);
                    continue;
                }
                if let Some(previous) = scheduled.insert(score.owner.clone(), i) {
                    let message = if previous == i {
                        format!("'{}' is on both sides of the matchup", score.owner)
                    } else {
                        format!("'{}' already plays in Matchups[{previous}]", score.owner)
                    };
                    violations.push(format!("{side_path}.Owner"), message);
                    continue;
                }
                scores.push(score);
            }

            let mut scores = scores.into_iter();
            if let (Some(home), Some(away)) = (scores.next(), scores.next()) {
                matchups.push(NormalizedMatchup {
                    matchup_id: i as u32 + 1,
                    home,
                    away,
                });
            }
        }

        matchups
    }

    fn normalize_side(
        &self,
        path: &str,
        side: &RawMatchupTeam,
        key: WeekKey,
        violations: &mut Violations,
    ) -> Option<WeeklyScore> {
        let owner = self.resolve_owner(&format!("{path}.Owner"), side.owner.as_ref(), violations);
        let points = violations.amount(&format!("{path}.Score"), side.score.as_ref());
        let starters =
            normalize_players(&format!("{path}.Starters"), side.starters.as_deref(), violations);
        let bench = side
            .bench
            .as_deref()
            .map(|bench| normalize_players(&format!("{path}.Bench"), Some(bench), violations));

        let (owner, points, starters) = (owner?, points?, starters?);
        let bench = match bench {
            None => None,
            Some(Some(bench)) => Some(bench),
            Some(None) => return None,
        };

        if !starters.is_empty() {
            let sum: f64 = starters.iter().map(|p| p.points).sum();
            if (sum - points).abs() > STARTER_SUM_TOLERANCE {
                violations.push(
                    format!("{path}.Starters"),
                    format!("starter points sum to {sum:.2} but score is {points:.2}"),
                );
                return None;
            }
        }

        // Scores are kept to the hundredth so the stored value is the one outcomes are decided on
        let points = round2(points);
        debug!("{} scored {:.2} with {} starters", owner, points, starters.len());

        Some(WeeklyScore {
            owner,
            week: key.week,
            points,
            starters,
            bench,
        })
    }

    fn normalize_awards(
        &self,
        raw: &RawBrief,
        violations: &mut Violations,
    ) -> BTreeMap<AwardCategory, AwardHint> {
        let mut hints = BTreeMap::new();
        let Some(awards) = &raw.awards else {
            return hints;
        };

        for (name, award) in awards {
            let Some(category) = AwardCategory::from_upstream_key(name) else {
                debug!("Ignoring unknown award category '{}'", name);
                continue;
            };
            let field = format!("Awards.{name}.Owner");
            let Some(owner) = self.resolve_owner(&field, award.owner.as_ref(), violations) else {
                continue;
            };
            let text = award
                .description
                .as_ref()
                .or(award.key_mistake.as_ref())
                .and_then(RawScalar::as_text)
                .filter(|t| !t.is_empty());
            hints.insert(category, AwardHint { owner, text });
        }

        hints
    }
}

/// Validate a lineup list. `None` for the list yields an empty lineup;
/// `None` as the result means a violation was recorded.
fn normalize_players(
    path: &str,
    players: Option<&[RawPlayer]>,
    violations: &mut Violations,
) -> Option<Vec<PlayerScore>> {
    let Some(players) = players else {
        return Some(Vec::new());
    };

    let before = violations.0.len();
    let mut lineup = Vec::with_capacity(players.len());
    for (k, raw) in players.iter().enumerate() {
        let entry = format!("{path}[{k}]");
        let name = violations.text(&format!("{entry}.Player"), raw.player.as_ref());
        let points = violations.points(&format!("{entry}.Points"), raw.points.as_ref());
        let slot = raw.slot.as_ref().and_then(RawScalar::as_text).map(|s| s.to_ascii_uppercase());
        let position = raw
            .position
            .as_ref()
            .and_then(RawScalar::as_text)
            .map(|s| s.to_ascii_uppercase())
            .or_else(|| slot.clone())
            .unwrap_or_else(|| "UNKNOWN".to_string());

        if let (Some(player), Some(points)) = (name, points) {
            lineup.push(PlayerScore {
                player,
                position,
                slot,
                points,
            });
        }
    }

    (violations.0.len() == before).then_some(lineup)
}
