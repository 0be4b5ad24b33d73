//! Weekly Report Engine
//!
//! Validates a week's raw league payload (standings, matchups, lineups and
//! upstream award hints) and derives the finished `WeeklyReport`: ranks,
//! tiers, coach and luck ratings, matchup commentary and awards.

pub mod awards;
pub mod engine;
pub mod error;
pub mod lineup;
pub mod metrics;
pub mod models;
pub mod normalizer;
pub mod raw;
pub mod roster;


pub use engine::{build_weekly_report, ReportEngine};
pub use error::{MalformedInputError, MetricKind, PayloadError, ReportWarning, Violation};
pub use metrics::MetricsCalculator;
pub use models::*;
pub use normalizer::Normalizer;
pub use raw::RawBrief;
pub use roster::{InMemoryRoster, RosterRegistry, TeamNameLookup};
