use crate::error::ReportWarning;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Season/week selector and archive key
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WeekKey {
    pub season: i32,
    pub week: u32,
}

impl WeekKey {
    pub fn new(season: i32, week: u32) -> Self {
        Self { season, week }
    }
}

impl fmt::Display for WeekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "season {} week {}", self.season, self.week)
    }
}

/// League-wide knobs the calculator needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueRules {
    /// Number of teams that make the playoffs
    pub playoff_teams: u32,
}

impl Default for LeagueRules {
    fn default() -> Self {
        Self { playoff_teams: 8 }
    }
}

/// One player's line in a lineup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerScore {
    pub player: String,

    /// Upper-cased position, e.g. "RB"
    pub position: String,

    /// Lineup slot the player was started in (starters only), e.g. "FLEX"
    pub slot: Option<String>,

    /// Fantasy points; may be negative
    pub points: f64,
}

impl PlayerScore {
    /// Slot the player occupies, falling back to the position
    pub fn slot_or_position(&self) -> &str {
        self.slot.as_deref().unwrap_or(&self.position)
    }
}

/// A team's score for one week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyScore {
    pub owner: String,
    pub week: u32,
    pub points: f64,

    /// Ordered starting lineup; empty when the payload had none
    pub starters: Vec<PlayerScore>,

    /// Bench, when supplied
    pub bench: Option<Vec<PlayerScore>>,
}

impl WeeklyScore {
    /// Sum of starter points
    pub fn starter_points(&self) -> f64 {
        self.starters.iter().map(|p| p.points).sum()
    }
}

/// Validated standings row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRecord {
    pub owner: String,
    pub display_name: String,
    pub division: String,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub points_for: f64,
    pub points_against: f64,
}

/// Validated pairing of two teams
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedMatchup {
    /// 1-based position in the payload
    pub matchup_id: u32,
    pub home: WeeklyScore,
    pub away: WeeklyScore,
}

/// Upstream award hint carried through to enrich derived awards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwardHint {
    pub owner: String,
    pub text: Option<String>,
}

/// Canonical week produced by the normalizer, before derived metrics
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedWeek {
    pub key: WeekKey,
    pub teams: Vec<TeamRecord>,
    pub matchups: Vec<NormalizedMatchup>,
    pub award_hints: BTreeMap<AwardCategory, AwardHint>,
    pub warnings: Vec<ReportWarning>,
}

/// Performance band from the overall table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Contender,
    Bubble,
    Pretender,
    Basement,
}

/// Standings row with computed ranks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub owner: String,
    pub display_name: String,
    pub division: String,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub points_for: f64,
    pub points_against: f64,
    pub overall_rank: u32,
    pub division_rank: u32,
    pub tier: Tier,
    pub playoff_position: bool,
}

impl Team {
    /// Record formatted as W-L-T
    pub fn record(&self) -> String {
        format!("{}-{}-{}", self.wins, self.losses, self.ties)
    }
}

/// Whether a derived value was computed or fell back to its default
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricStatus {
    Computed,
    Defaulted,
}

/// A derived number that is always present
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub value: f64,
    pub status: MetricStatus,
}

impl Rating {
    pub fn computed(value: f64) -> Self {
        Self {
            value,
            status: MetricStatus::Computed,
        }
    }

    pub fn defaulted() -> Self {
        Self {
            value: 0.0,
            status: MetricStatus::Defaulted,
        }
    }

    pub fn is_computed(&self) -> bool {
        self.status == MetricStatus::Computed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SideResult {
    Win,
    Loss,
    Tie,
}

/// One team's half of a matchup, with commentary fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchupSide {
    pub display_name: String,
    pub score: WeeklyScore,
    pub result: SideResult,
    pub coach_rating: Rating,
    pub luck_rating: Rating,
    pub optimal_points: Option<f64>,
    pub bench_points_lost: Option<f64>,
    pub best_performer: Option<PlayerScore>,
    pub worst_performer: Option<PlayerScore>,
    pub key_mistake: Option<String>,
}

impl MatchupSide {
    pub fn owner(&self) -> &str {
        &self.score.owner
    }

    pub fn points(&self) -> f64 {
        self.score.points
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outcome {
    Winner { owner: String },
    Tie,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matchup {
    pub matchup_id: u32,
    pub home: MatchupSide,
    pub away: MatchupSide,
    pub outcome: Outcome,
    pub margin: f64,
}

impl Matchup {
    pub fn sides(&self) -> [&MatchupSide; 2] {
        [&self.home, &self.away]
    }

    pub fn winner(&self) -> Option<&MatchupSide> {
        match &self.outcome {
            Outcome::Winner { owner } => self.sides().into_iter().find(|s| s.owner() == owner),
            Outcome::Tie => None,
        }
    }

    pub fn loser(&self) -> Option<&MatchupSide> {
        match &self.outcome {
            Outcome::Winner { owner } => self.sides().into_iter().find(|s| s.owner() != owner),
            Outcome::Tie => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AwardCategory {
    HighestScorer,
    CoachOfTheWeek,
    BoneheadOfTheWeek,
    Luckiest,
    Unluckiest,
}

impl AwardCategory {
    pub const ALL: [AwardCategory; 5] = [
        AwardCategory::HighestScorer,
        AwardCategory::CoachOfTheWeek,
        AwardCategory::BoneheadOfTheWeek,
        AwardCategory::Luckiest,
        AwardCategory::Unluckiest,
    ];

    /// Key used in the upstream `Awards` block
    pub fn upstream_key(&self) -> &'static str {
        match self {
            AwardCategory::HighestScorer => "HighestScorer",
            AwardCategory::CoachOfTheWeek => "CoachOfTheWeek",
            AwardCategory::BoneheadOfTheWeek => "BoneheadOfTheWeek",
            AwardCategory::Luckiest => "Luckiest",
            AwardCategory::Unluckiest => "Unluckiest",
        }
    }

    pub fn from_upstream_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.upstream_key() == key)
    }

    pub fn title(&self) -> &'static str {
        match self {
            AwardCategory::HighestScorer => "Highest Scorer",
            AwardCategory::CoachOfTheWeek => "Coach of the Week",
            AwardCategory::BoneheadOfTheWeek => "Bonehead of the Week",
            AwardCategory::Luckiest => "Luckiest Win",
            AwardCategory::Unluckiest => "Unluckiest Loss",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AwardPayload {
    Score { score: f64 },
    Efficiency {
        coach_rating: f64,
        points: f64,
        optimal_points: f64,
    },
    Bonehead {
        key_mistake: String,
        bench_points_lost: f64,
        loss_margin: f64,
    },
    Luck {
        score: f64,
        luck_rating: f64,
        description: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Award {
    pub category: AwardCategory,
    pub owner: String,
    pub display_name: String,
    pub payload: AwardPayload,
}

/// Score distribution for the week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueSummary {
    pub matchups_played: usize,
    pub average_score: f64,
    pub highest_score: f64,
    pub lowest_score: f64,
    pub std_deviation: f64,
}

/// The immutable snapshot of one week's standings, matchups and awards.
///
/// Fields are only reachable through accessors; a report is never changed
/// after the calculator builds it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyReport {
    key: WeekKey,
    teams: Vec<Team>,
    divisions: BTreeMap<String, Vec<String>>,
    matchups: Vec<Matchup>,
    awards: Vec<Award>,
    summary: LeagueSummary,
    warnings: Vec<ReportWarning>,
}

impl WeeklyReport {
    pub(crate) fn new(
        key: WeekKey,
        teams: Vec<Team>,
        divisions: BTreeMap<String, Vec<String>>,
        matchups: Vec<Matchup>,
        awards: Vec<Award>,
        summary: LeagueSummary,
        warnings: Vec<ReportWarning>,
    ) -> Self {
        Self {
            key,
            teams,
            divisions,
            matchups,
            awards,
            summary,
            warnings,
        }
    }

    pub fn key(&self) -> WeekKey {
        self.key
    }

    pub fn season(&self) -> i32 {
        self.key.season
    }

    pub fn week(&self) -> u32 {
        self.key.week
    }

    /// Teams in overall rank order
    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn team(&self, owner: &str) -> Option<&Team> {
        self.teams.iter().find(|t| t.owner == owner)
    }

    /// Division tag -> owners in divisional rank order
    pub fn divisions(&self) -> &BTreeMap<String, Vec<String>> {
        &self.divisions
    }

    /// Teams of one division in divisional rank order
    pub fn division_table(&self, division: &str) -> Vec<&Team> {
        self.divisions
            .get(division)
            .map(|owners| owners.iter().filter_map(|o| self.team(o)).collect())
            .unwrap_or_default()
    }

    pub fn matchups(&self) -> &[Matchup] {
        &self.matchups
    }

    pub fn awards(&self) -> &[Award] {
        &self.awards
    }

    pub fn award(&self, category: AwardCategory) -> Option<&Award> {
        self.awards.iter().find(|a| a.category == category)
    }

    pub fn summary(&self) -> &LeagueSummary {
        &self.summary
    }

    pub fn warnings(&self) -> &[ReportWarning] {
        &self.warnings
    }

    /// Whether any derived metric fell back to a placeholder
    pub fn is_degraded(&self) -> bool {
        self.warnings.iter().any(|w| matches!(w, ReportWarning::MetricUnavailable { .. }))
    }

    /// Highest scoring starters of the week across all teams
    pub fn top_performers(&self, limit: usize) -> Vec<(&str, &PlayerScore)> {
        let mut performers: Vec<(&str, &PlayerScore)> = self
            .matchups
            .iter()
            .flat_map(|m| m.sides())
            .flat_map(|side| side.score.starters.iter().map(move |p| (side.owner(), p)))
            .collect();

        performers.sort_by(|a, b| {
            b.1.points
                .total_cmp(&a.1.points)
                .then_with(|| a.1.player.cmp(&b.1.player))
                .then_with(|| a.0.cmp(b.0))
        });
        performers.truncate(limit);
        performers
    }
}
