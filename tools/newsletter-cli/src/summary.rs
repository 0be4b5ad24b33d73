//! Plain-text rendering of a weekly report for the terminal

use league_registry::LeagueRegistry;
use sleeper_fetcher::{PairingSource, StandingEntry, UpcomingWeek};
use std::fmt::{self, Write};
use weekly_report::{AwardPayload, Matchup, Outcome, TeamNameLookup, WeeklyReport};

/// Number of players listed under "Top performers"
const TOP_PERFORMERS: usize = 5;

pub fn render_summary(report: &WeeklyReport, registry: &LeagueRegistry) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    write_summary(&mut out, report, registry).unwrap_or_default();
    out
}

pub fn write_summary(
    out: &mut impl Write,
    report: &WeeklyReport,
    registry: &LeagueRegistry,
) -> fmt::Result {
    writeln!(out, "{} - Week {}, {}", registry.league_name(), report.week(), report.season())?;
    if let Some(title) = registry.week_title(report.week()) {
        writeln!(out, "\"{title}\"")?;
    }

    for (tag, _) in report.divisions() {
        writeln!(out, "\n{}", registry.division_name(tag))?;
        for team in report.division_table(tag) {
            writeln!(
                out,
                "  {:>2}. {:<28} {:>7} {:>8.2} PF{}",
                team.division_rank,
                team.display_name,
                team.record(),
                team.points_for,
                if team.playoff_position { "  *" } else { "" }
            )?;
        }
    }

    writeln!(out, "\nMatchups")?;
    for matchup in report.matchups() {
        writeln!(out, "  {}", describe_matchup(matchup))?;
    }

    if !report.awards().is_empty() {
        writeln!(out, "\nAwards")?;
    }
    for award in report.awards() {
        let detail = match &award.payload {
            AwardPayload::Score { score } => format!("{score:.2} pts"),
            AwardPayload::Efficiency {
                coach_rating,
                points,
                optimal_points,
            } => {
                format!("{coach_rating:.1}% ({points:.2} of {optimal_points:.2})")
            }
            AwardPayload::Bonehead {
                key_mistake,
                bench_points_lost,
                ..
            } => {
                format!("{key_mistake}, {bench_points_lost:.2} left on the bench")
            }
            AwardPayload::Luck { description, .. } => description.clone(),
        };
        writeln!(out, "  {:<22} {} - {}", award.category.title(), award.display_name, detail)?;
    }

    let top = report.top_performers(TOP_PERFORMERS);
    if !top.is_empty() {
        writeln!(out, "\nTop performers")?;
        for (owner, player) in top {
            let team = report.team(owner).map(|t| t.display_name.as_str()).unwrap_or(owner);
            writeln!(
                out,
                "  {:<24} {:<4} {:>6.2}  {}",
                player.player,
                player.position,
                player.points,
                team
            )?;
        }
    }

    let summary = report.summary();
    writeln!(
        out,
        "\nLeague average {:.2} (high {:.2}, low {:.2}, std dev {:.2})",
        summary.average_score, summary.highest_score, summary.lowest_score, summary.std_deviation
    )?;

    if report.is_degraded() {
        writeln!(out, "\nWarnings")?;
        for warning in report.warnings() {
            writeln!(out, "  {warning}")?;
        }
    }

    Ok(())
}

/// Preweek slate: each pairing with both teams' records and league ranks
pub fn render_upcoming(upcoming: &UpcomingWeek, registry: &LeagueRegistry) -> String {
    let mut out = String::new();
    write_upcoming_summary(&mut out, upcoming, registry).unwrap_or_default();
    out
}

pub fn write_upcoming_summary(
    out: &mut impl Write,
    upcoming: &UpcomingWeek,
    registry: &LeagueRegistry,
) -> fmt::Result {
    writeln!(out, "{} - Week {} preview", registry.league_name(), upcoming.week)?;
    if upcoming.source == PairingSource::Standings {
        writeln!(out, "(pairings projected from the standings)")?;
    }

    for matchup in &upcoming.matchups {
        writeln!(
            out,
            "  {} vs {}{}",
            describe_side(&matchup.home, registry),
            describe_side(&matchup.away, registry),
            if matchup.is_divisional() { "  [division]" } else { "" }
        )?;
    }
    Ok(())
}

fn describe_side(entry: &StandingEntry, registry: &LeagueRegistry) -> String {
    let name = registry.team_name(&entry.owner).unwrap_or_else(|| entry.owner.clone());
    format!("{} ({}, #{})", name, entry.record(), entry.rank)
}

fn describe_matchup(matchup: &Matchup) -> String {
    match (&matchup.outcome, matchup.winner(), matchup.loser()) {
        (Outcome::Winner { .. }, Some(winner), Some(loser)) => format!(
            "{} {:.2} def. {} {:.2} by {:.2}",
            winner.display_name,
            winner.points(),
            loser.display_name,
            loser.points(),
            matchup.margin
        ),
        _ => format!(
            "{} {:.2} tied {} {:.2}",
            matchup.home.display_name,
            matchup.home.points(),
            matchup.away.display_name,
            matchup.away.points()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weekly_report::{build_weekly_report, RawBrief, WeekKey};

    const LEAGUE: &str = r#"
[league]
name = "16 Fantasies 1 Cup"
season = 2025
playoff_teams = 1
week_titles = ["Kickoff", "Bye Week Blues", "Never Tell Me The Odds", "Trade Deadline"]

[divisions]
BTK = "Beat The Kids"

[[teams]]
owner = "Healzy"
team = "Healzy's Heroes"
division = "BTK"

[[teams]]
owner = "Coops"
division = "BTK"
"#;

    const BRIEF: &str = r#"
Standings:
  Overall:
    - { Owner: Healzy, Wins: 3, Losses: 0, PF: 355.2, PA: 290.1 }
    - { Owner: Coops, Wins: 1, Losses: 2, PF: 280.0, PA: 300.5 }
Matchups:
  - Teams:
      - Owner: Healzy
        Score: 24.5
        Starters: [ { Player: Josh Allen, Position: QB, Slot: QB, Points: 24.5 } ]
        Bench: [ { Player: Bo Nix, Position: QB, Points: 11.2 } ]
      - Owner: Coops
        Score: 10.0
        Starters: [ { Player: Jalen Hurts, Position: QB, Slot: QB, Points: 10.0 } ]
        Bench: [ { Player: Baker Mayfield, Position: QB, Points: 22.0 } ]
"#;

    #[test]
    fn test_render_summary() {
        let registry = LeagueRegistry::from_toml_str(LEAGUE).unwrap();
        let raw = RawBrief::from_yaml_str(BRIEF).unwrap();
        let report =
            build_weekly_report(&registry, registry.rules(), &raw, WeekKey::new(2025, 2)).unwrap();

        let text = render_summary(&report, &registry);
        assert!(text.starts_with("16 Fantasies 1 Cup - Week 2, 2025"));
        assert!(text.contains("\"Never Tell Me The Odds\""));
        assert!(text.contains("Beat The Kids"));
        assert!(text.contains("Healzy's Heroes 24.50 def. Coops 10.00 by 14.50"));
        assert!(text.contains("Josh Allen"));
        assert!(text.contains("Coach of the Week"));
        assert!(text.contains("Started Jalen Hurts (10.00) over Baker Mayfield (22.00)"));
    }

    #[test]
    fn test_render_upcoming() {
        let registry = LeagueRegistry::from_toml_str(LEAGUE).unwrap();
        let side = |owner: &str, rank, wins, losses| StandingEntry {
            owner: owner.to_string(),
            division: Some("BTK".to_string()),
            rank,
            wins,
            losses,
            ties: 0,
            points_for: 0.0,
            points_against: 0.0,
        };
        let upcoming = UpcomingWeek {
            season: Some(2025),
            week: 4,
            source: PairingSource::Standings,
            matchups: vec![sleeper_fetcher::UpcomingMatchup {
                matchup_id: 1,
                home: side("Healzy", 1, 3, 0),
                away: side("Coops", 2, 1, 2),
            }],
            standings: Vec::new(),
        };

        let text = render_upcoming(&upcoming, &registry);
        assert!(text.starts_with("16 Fantasies 1 Cup - Week 4 preview"));
        assert!(text.contains("projected from the standings"));
        assert!(text.contains("Healzy's Heroes (3-0, #1) vs Coops (1-2, #2)  [division]"));
    }
}
