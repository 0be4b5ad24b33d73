use crate::error::MalformedInputError;
use crate::metrics::MetricsCalculator;
use crate::models::{LeagueRules, WeekKey, WeeklyReport};
use crate::normalizer::Normalizer;
use crate::raw::RawBrief;
use crate::roster::{RosterRegistry, TeamNameLookup};
use tracing::info;

/// Payload -> `WeeklyReport` in one call: normalize, then derive.
pub struct ReportEngine<'a> {
    normalizer: Normalizer<'a>,
    calculator: MetricsCalculator,
}

impl<'a> ReportEngine<'a> {
    pub fn new(
        roster: &'a dyn RosterRegistry,
        names: &'a dyn TeamNameLookup,
        rules: LeagueRules,
    ) -> Self {
        Self {
            normalizer: Normalizer::new(roster, names),
            calculator: MetricsCalculator::new(rules),
        }
    }

    /// Build the report for `key`. Normalization finishes before any metric is derived.
    pub fn build(&self, raw: &RawBrief, key: WeekKey) -> Result<WeeklyReport, MalformedInputError> {
        info!("Building weekly report for {}", key);
        let week = self.normalizer.normalize(raw, key)?;
        Ok(self.calculator.derive(week))
    }
}

/// Convenience wrapper for callers that hold a single registry implementing both lookups
pub fn build_weekly_report<R>(
    registry: &R,
    rules: LeagueRules,
    raw: &RawBrief,
    key: WeekKey,
) -> Result<WeeklyReport, MalformedInputError>
where
    R: RosterRegistry + TeamNameLookup,
{
    ReportEngine::new(registry, registry, rules).build(raw, key)
}
