use crate::awards::select_awards;
use crate::error::{MetricKind, ReportWarning};
use crate::lineup::{biggest_mistake, describe_mistake, optimal_points, round2};
use crate::models::*;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Turns a normalized week into a finished report. Never fails; metrics that
/// cannot be computed are defaulted and recorded as warnings.
pub struct MetricsCalculator {
    rules: LeagueRules,
}

impl MetricsCalculator {
    pub fn new(rules: LeagueRules) -> Self {
        Self { rules }
    }

    pub fn derive(&self, week: NormalizedWeek) -> WeeklyReport {
        let NormalizedWeek {
            key,
            teams,
            matchups,
            award_hints,
            mut warnings,
        } = week;

        let (teams, divisions) = self.rank_teams(teams);
        let display_names: BTreeMap<&str, &str> =
            teams.iter().map(|t| (t.owner.as_str(), t.display_name.as_str())).collect();

        let all_scores: Vec<f64> = matchups
            .iter()
            .flat_map(|m| [m.home.points, m.away.points])
            .collect();
        if all_scores.len() < 2 {
            warn!("Only {} team(s) played in {}, luck ratings defaulted", all_scores.len(), key);
            warnings.push(ReportWarning::MetricUnavailable {
                owner: None,
                metric: MetricKind::LuckRating,
                reason: "fewer than two teams played".to_string(),
            });
        }

        let matchups: Vec<Matchup> = matchups
            .into_iter()
            .map(|m| {
                let outcome = decide(&m.home, &m.away);
                let margin = round2((m.home.points - m.away.points).abs());
                let home =
                    self.build_side(m.home, &m.away, &display_names, &all_scores, &mut warnings);
                let away = self.build_side(
                    m.away,
                    &home.score,
                    &display_names,
                    &all_scores,
                    &mut warnings,
                );
                Matchup {
                    matchup_id: m.matchup_id,
                    home,
                    away,
                    outcome,
                    margin,
                }
            })
            .collect();

        let awards = select_awards(&matchups, &award_hints, &mut warnings);
        let summary = summarize(&matchups);

        info!(
            "Derived report for {}: {} teams, {} matchups, {} awards, {} warning(s)",
            key,
            teams.len(),
            matchups.len(),
            awards.len(),
            warnings.len()
        );

        WeeklyReport::new(key, teams, divisions, matchups, awards, summary, warnings)
    }

    /// Overall and divisional ranks, tiers and the playoff line
    fn rank_teams(&self, records: Vec<TeamRecord>) -> (Vec<Team>, BTreeMap<String, Vec<String>>) {
        let mut records = records;
        records.sort_by(standings_order);

        let mut divisions: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for record in &records {
            divisions.entry(record.division.clone()).or_default().push(record.owner.clone());
        }

        let quartile = (records.len() as u32 + 3) / 4;
        let teams = records
            .into_iter()
            .enumerate()
            .map(|(i, r)| {
                let overall_rank = i as u32 + 1;
                let division_rank = divisions
                    .get(&r.division)
                    .and_then(|owners| owners.iter().position(|o| *o == r.owner))
                    .map_or(1, |p| p as u32 + 1);
                Team {
                    tier: tier_for(overall_rank, quartile),
                    playoff_position: overall_rank <= self.rules.playoff_teams,
                    overall_rank,
                    division_rank,
                    owner: r.owner,
                    display_name: r.display_name,
                    division: r.division,
                    wins: r.wins,
                    losses: r.losses,
                    ties: r.ties,
                    points_for: r.points_for,
                    points_against: r.points_against,
                }
            })
            .collect();

        (teams, divisions)
    }

    fn build_side(
        &self,
        score: WeeklyScore,
        opponent: &WeeklyScore,
        display_names: &BTreeMap<&str, &str>,
        all_scores: &[f64],
        warnings: &mut Vec<ReportWarning>,
    ) -> MatchupSide {
        let result = match score.points.total_cmp(&opponent.points) {
            Ordering::Greater => SideResult::Win,
            Ordering::Less => SideResult::Loss,
            Ordering::Equal => SideResult::Tie,
        };

        let owner = score.owner.clone();
        let mut unavailable = |metric: MetricKind, reason: &str| {
            warn!("{} unavailable for '{}': {}", metric, owner, reason);
            warnings.push(ReportWarning::MetricUnavailable {
                owner: Some(owner.clone()),
                metric,
                reason: reason.to_string(),
            });
        };

        let bench = score.bench.as_deref().unwrap_or_default();
        let optimal = optimal_points(&score.starters, bench);

        let coach_rating = if score.starters.is_empty() {
            unavailable(MetricKind::CoachRating, "no starter lineup");
            Rating::defaulted()
        } else if bench.is_empty() {
            unavailable(MetricKind::CoachRating, "no bench data");
            Rating::defaulted()
        } else {
            match optimal {
                Some(best) if best > 0.0 => {
                    let actual = score.starter_points();
                    Rating::computed(round1((100.0 * actual / best).clamp(0.0, 100.0)))
                }
                _ => {
                    unavailable(MetricKind::CoachRating, "optimal lineup scored no points");
                    Rating::defaulted()
                }
            }
        };

        // every side has an opponent, so all_scores holds at least two entries here
        let luck_rating = Rating::computed(luck(score.points, result, all_scores));

        let (best_performer, worst_performer) = performers(&score.starters);
        if best_performer.is_none() {
            debug!("No starters for '{}', performers left empty", owner);
        }

        let bench_points_lost = match (optimal, bench.is_empty()) {
            (Some(best), false) => Some(round2((best - score.starter_points()).max(0.0))),
            _ => None,
        };
        let key_mistake =
            biggest_mistake(&score.starters, bench).map(|(s, b)| describe_mistake(s, b));
        let optimal_points = optimal.filter(|_| !bench.is_empty());
        let display_name = display_names
            .get(score.owner.as_str())
            .map_or_else(|| score.owner.clone(), |name| name.to_string());

        MatchupSide {
            display_name,
            score,
            result,
            coach_rating,
            luck_rating,
            optimal_points,
            bench_points_lost,
            best_performer,
            worst_performer,
            key_mistake,
        }
    }
}

/// Wins desc, points-for desc, points-against asc, owner asc
pub fn standings_order(a: &TeamRecord, b: &TeamRecord) -> Ordering {
    b.wins
        .cmp(&a.wins)
        .then_with(|| b.points_for.total_cmp(&a.points_for))
        .then_with(|| a.points_against.total_cmp(&b.points_against))
        .then_with(|| a.owner.cmp(&b.owner))
}

fn tier_for(rank: u32, quartile: u32) -> Tier {
    match rank {
        r if r <= quartile => Tier::Contender,
        r if r <= 2 * quartile => Tier::Bubble,
        r if r <= 3 * quartile => Tier::Pretender,
        _ => Tier::Basement,
    }
}

/// The strictly higher score wins; equal scores tie
fn decide(home: &WeeklyScore, away: &WeeklyScore) -> Outcome {
    match home.points.total_cmp(&away.points) {
        Ordering::Greater => Outcome::Winner {
            owner: home.owner.clone(),
        },
        Ordering::Less => Outcome::Winner {
            owner: away.owner.clone(),
        },
        Ordering::Equal => Outcome::Tie,
    }
}

/// Actual result minus the share of the league this score would have beaten
fn luck(points: f64, result: SideResult, all_scores: &[f64]) -> f64 {
    // all_scores includes this team once
    let mut record = 0.0;
    let mut skipped_self = false;
    for &other in all_scores {
        if other == points && !skipped_self {
            skipped_self = true;
            continue;
        }
        record += match points.total_cmp(&other) {
            Ordering::Greater => 1.0,
            Ordering::Equal => 0.5,
            Ordering::Less => 0.0,
        };
    }

    let expected = record / (all_scores.len() - 1) as f64;
    let actual = match result {
        SideResult::Win => 1.0,
        SideResult::Tie => 0.5,
        SideResult::Loss => 0.0,
    };
    round3(actual - expected)
}

fn performers(starters: &[PlayerScore]) -> (Option<PlayerScore>, Option<PlayerScore>) {
    let best = starters
        .iter()
        .min_by(|a, b| b.points.total_cmp(&a.points).then_with(|| a.player.cmp(&b.player)));
    let worst = starters
        .iter()
        .min_by(|a, b| a.points.total_cmp(&b.points).then_with(|| a.player.cmp(&b.player)));
    (best.cloned(), worst.cloned())
}

fn summarize(matchups: &[Matchup]) -> LeagueSummary {
    let scores: Vec<f64> = matchups.iter().flat_map(|m| m.sides()).map(|s| s.points()).collect();
    if scores.is_empty() {
        return LeagueSummary {
            matchups_played: 0,
            average_score: 0.0,
            highest_score: 0.0,
            lowest_score: 0.0,
            std_deviation: 0.0,
        };
    }

    let n = scores.len() as f64;
    let mean = scores.iter().sum::<f64>() / n;
    let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;

    LeagueSummary {
        matchups_played: matchups.len(),
        average_score: round2(mean),
        highest_score: scores.iter().copied().fold(f64::MIN, f64::max),
        lowest_score: scores.iter().copied().fold(f64::MAX, f64::min),
        std_deviation: round2(variance.sqrt()),
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
