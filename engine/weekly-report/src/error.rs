//! Error and warning types for weekly report construction

use crate::models::WeekKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// A single problem found while validating a raw payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Path of the offending field, e.g. `Matchups[1].Teams[0].Owner`
    pub field: String,

    /// What is wrong with it
    pub message: String,
}

impl Violation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Raised when a week's payload fails validation.
///
/// Carries every violation found, not just the first one.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("malformed input for {key}: {}", format_violations(.violations))]
pub struct MalformedInputError {
    pub key: WeekKey,
    pub violations: Vec<Violation>,
}

impl MalformedInputError {
    /// Whether any violation names the given field path
    pub fn names_field(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }
}

fn format_violations(violations: &[Violation]) -> String {
    let listed: Vec<String> = violations.iter().map(ToString::to_string).collect();
    format!("{} violation(s): {}", violations.len(), listed.join("; "))
}

/// Errors reading a raw payload document before validation starts
#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("failed to read payload {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML payload: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported payload format: {0}")]
    UnsupportedFormat(String),
}

/// Derived metric names used in warnings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricKind {
    CoachRating,
    LuckRating,
    Performers,
    Award,
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetricKind::CoachRating => "coach rating",
            MetricKind::LuckRating => "luck rating",
            MetricKind::Performers => "best/worst performer",
            MetricKind::Award => "award",
        };
        f.write_str(name)
    }
}

/// Non-fatal conditions recorded on a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportWarning {
    /// Owner is on the roster but has no display name; the raw id is shown instead
    UnresolvedOwner { owner: String },

    /// A derived metric could not be computed and was set to its default
    MetricUnavailable {
        owner: Option<String>,
        metric: MetricKind,
        reason: String,
    },
}

impl fmt::Display for ReportWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportWarning::UnresolvedOwner { owner } => {
                write!(f, "no team name for owner '{owner}', using owner id")
            }
            ReportWarning::MetricUnavailable {
                owner: Some(owner),
                metric,
                reason,
            } => {
                write!(f, "{metric} unavailable for '{owner}': {reason}")
            }
            ReportWarning::MetricUnavailable {
                owner: None,
                metric,
                reason,
            } => {
                write!(f, "{metric} unavailable: {reason}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_input_lists_every_violation() {
        let err = MalformedInputError {
            key: WeekKey::new(2025, 3),
            violations: vec![
                Violation::new("Matchups[0].Teams[1].Owner", "missing"),
                Violation::new("Standings.Overall[4].PF", "must be non-negative"),
            ],
        };

        let message = err.to_string();
        assert!(message.contains("season 2025 week 3"));
        assert!(message.contains("2 violation(s)"));
        assert!(message.contains("Matchups[0].Teams[1].Owner: missing"));
        assert!(message.contains("Standings.Overall[4].PF: must be non-negative"));
        assert!(err.names_field("Standings.Overall[4].PF"));
        assert!(!err.names_field("Standings.Overall[4].PA"));
    }

    #[test]
    fn test_warning_display() {
        let warning = ReportWarning::MetricUnavailable {
            owner: Some("Coops".to_string()),
            metric: MetricKind::CoachRating,
            reason: "no bench data".to_string(),
        };
        assert_eq!(warning.to_string(), "coach rating unavailable for 'Coops': no bench data");
    }
}
