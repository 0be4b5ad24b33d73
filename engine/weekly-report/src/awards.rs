//! Weekly award selection

use crate::error::{MetricKind, ReportWarning};
use crate::models::*;
use std::collections::BTreeMap;
use tracing::{debug, warn};

#[derive(Clone, Copy)]
enum Pick {
    Highest,
    Lowest,
}

/// Best side by `value`, ties broken by owner id ascending
fn pick<'a, I, F>(
    candidates: I,
    value: F,
    direction: Pick,
) -> Option<(&'a Matchup, &'a MatchupSide)>
where
    I: Iterator<Item = (&'a Matchup, &'a MatchupSide)>,
    F: Fn(&MatchupSide) -> f64,
{
    candidates.min_by(|(_, a), (_, b)| {
        let by_value = match direction {
            Pick::Highest => value(b).total_cmp(&value(a)),
            Pick::Lowest => value(a).total_cmp(&value(b)),
        };
        by_value.then_with(|| a.owner().cmp(b.owner()))
    })
}

fn all_sides(matchups: &[Matchup]) -> impl Iterator<Item = (&Matchup, &MatchupSide)> {
    matchups.iter().flat_map(|m| m.sides().into_iter().map(move |s| (m, s)))
}

fn hint_text(
    hints: &BTreeMap<AwardCategory, AwardHint>,
    category: AwardCategory,
    owner: &str,
) -> Option<String> {
    hints
        .get(&category)
        .filter(|hint| hint.owner == owner)
        .and_then(|hint| hint.text.clone())
}

/// Pick a winner for every award category.
///
/// Categories with no eligible team are left out and reported as warnings.
pub fn select_awards(
    matchups: &[Matchup],
    hints: &BTreeMap<AwardCategory, AwardHint>,
    warnings: &mut Vec<ReportWarning>,
) -> Vec<Award> {
    let mut awards = Vec::with_capacity(AwardCategory::ALL.len());

    for category in AwardCategory::ALL {
        let winner = match category {
            AwardCategory::HighestScorer => {
                pick(all_sides(matchups), |s| s.points(), Pick::Highest)
            }
            AwardCategory::CoachOfTheWeek => pick(
                all_sides(matchups).filter(|(_, s)| s.coach_rating.is_computed()),
                |s| s.coach_rating.value,
                Pick::Highest,
            ),
            AwardCategory::BoneheadOfTheWeek => pick(
                all_sides(matchups)
                    .filter(|(_, s)| s.result == SideResult::Loss)
                    .filter(|(_, s)| s.bench_points_lost.map_or(false, |lost| lost > 0.0)),
                |s| s.bench_points_lost.unwrap_or_default(),
                Pick::Highest,
            ),
            AwardCategory::Luckiest => pick(
                all_sides(matchups)
                    .filter(|(_, s)| s.result == SideResult::Win && s.luck_rating.is_computed()),
                |s| s.luck_rating.value,
                Pick::Highest,
            ),
            AwardCategory::Unluckiest => pick(
                all_sides(matchups)
                    .filter(|(_, s)| s.result == SideResult::Loss && s.luck_rating.is_computed()),
                |s| s.luck_rating.value,
                Pick::Lowest,
            ),
        };

        let Some((matchup, side)) = winner else {
            warn!("No eligible team for {}, award omitted", category.title());
            warnings.push(ReportWarning::MetricUnavailable {
                owner: None,
                metric: MetricKind::Award,
                reason: format!("no eligible team for {}", category.title()),
            });
            continue;
        };

        let hint = hint_text(hints, category, side.owner());
        let payload = match category {
            AwardCategory::HighestScorer => AwardPayload::Score {
                score: side.points(),
            },
            AwardCategory::CoachOfTheWeek => AwardPayload::Efficiency {
                coach_rating: side.coach_rating.value,
                points: side.points(),
                optimal_points: side.optimal_points.unwrap_or(side.points()),
            },
            AwardCategory::BoneheadOfTheWeek => {
                let bench_points_lost = side.bench_points_lost.unwrap_or_default();
                AwardPayload::Bonehead {
                    key_mistake: hint.or_else(|| side.key_mistake.clone()).unwrap_or_else(|| {
                        format!("Left {bench_points_lost:.2} points on the bench")
                    }),
                    bench_points_lost,
                    loss_margin: matchup.margin,
                }
            }
            AwardCategory::Luckiest | AwardCategory::Unluckiest => AwardPayload::Luck {
                score: side.points(),
                luck_rating: side.luck_rating.value,
                description: hint.unwrap_or_else(|| describe_luck(matchup, side)),
            },
        };

        debug!("{} goes to {}", category.title(), side.owner());

        awards.push(Award {
            category,
            owner: side.owner().to_string(),
            display_name: side.display_name.clone(),
            payload,
        });
    }

    awards
}

fn describe_luck(matchup: &Matchup, side: &MatchupSide) -> String {
    let opponent = matchup.sides().into_iter().find(|s| s.owner() != side.owner());
    let opponent_name = opponent.map_or("their opponent", |o| o.display_name.as_str());
    match side.result {
        SideResult::Win => format!(
            "Beat {} with {:.2} points, a score that would have lost to most of the league",
            opponent_name,
            side.points()
        ),
        _ => format!(
            "Lost to {} despite scoring {:.2}, enough to beat most of the league",
            opponent_name,
            side.points()
        ),
    }
}
