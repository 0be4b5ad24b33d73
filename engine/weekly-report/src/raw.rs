//! Raw input schema for a week's "creative brief" payload
//!
//! Field names follow the upstream producers exactly (PascalCase keys, `PF`/`PA`).
//! Every leaf value is a [`RawScalar`] so that type problems can be reported
//! as violations by the normalizer instead of failing the whole parse.
//! Fields not listed here are ignored.

use crate::error::PayloadError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// A loosely typed leaf value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawScalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl RawScalar {
    /// Interpret as a decimal number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RawScalar::Int(v) => Some(*v as f64),
            RawScalar::Float(v) if v.is_finite() => Some(*v),
            RawScalar::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            _ => None,
        }
    }

    /// Interpret as a whole number (negative values are returned as-is for the caller to reject)
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            RawScalar::Int(v) => Some(*v),
            RawScalar::Float(v) if v.is_finite() && v.fract() == 0.0 => Some(*v as i64),
            RawScalar::Text(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
    }

    /// Interpret as text; numbers are accepted since YAML readily turns ids into ints
    pub fn as_text(&self) -> Option<String> {
        match self {
            RawScalar::Text(s) => Some(s.trim().to_string()),
            RawScalar::Int(v) => Some(v.to_string()),
            RawScalar::Float(v) => Some(v.to_string()),
            RawScalar::Bool(_) => None,
        }
    }
}

impl From<&str> for RawScalar {
    fn from(value: &str) -> Self {
        RawScalar::Text(value.to_string())
    }
}

impl From<String> for RawScalar {
    fn from(value: String) -> Self {
        RawScalar::Text(value)
    }
}

impl From<f64> for RawScalar {
    fn from(value: f64) -> Self {
        RawScalar::Float(value)
    }
}

impl From<i64> for RawScalar {
    fn from(value: i64) -> Self {
        RawScalar::Int(value)
    }
}

/// Top-level payload for one week
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawBrief {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week_info: Option<RawWeekInfo>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standings: Option<RawStandings>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matchups: Option<Vec<RawMatchup>>,

    /// Upstream award hints keyed by category name (e.g. `HighestScorer`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub awards: Option<BTreeMap<String, RawAward>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawWeekInfo {
    #[serde(default)]
    pub season: Option<RawScalar>,
    #[serde(default)]
    pub week: Option<RawScalar>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawStandings {
    #[serde(default)]
    pub overall: Option<Vec<RawStandingRow>>,

    /// Division tag -> rows; only membership is checked, ranks are recomputed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub divisional: Option<BTreeMap<String, Vec<RawStandingRow>>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawStandingRow {
    #[serde(default)]
    pub owner: Option<RawScalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub division: Option<RawScalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_rank: Option<RawScalar>,
    #[serde(default)]
    pub wins: Option<RawScalar>,
    #[serde(default)]
    pub losses: Option<RawScalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ties: Option<RawScalar>,
    #[serde(default, rename = "PF")]
    pub points_for: Option<RawScalar>,
    #[serde(default, rename = "PA")]
    pub points_against: Option<RawScalar>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawMatchup {
    #[serde(default)]
    pub teams: Option<Vec<RawMatchupTeam>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawMatchupTeam {
    #[serde(default)]
    pub owner: Option<RawScalar>,
    #[serde(default)]
    pub score: Option<RawScalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starters: Option<Vec<RawPlayer>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bench: Option<Vec<RawPlayer>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawPlayer {
    #[serde(default)]
    pub player: Option<RawScalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<RawScalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<RawScalar>,
    #[serde(default)]
    pub points: Option<RawScalar>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawAward {
    #[serde(default)]
    pub owner: Option<RawScalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<RawScalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<RawScalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_mistake: Option<RawScalar>,
}

impl RawBrief {
    /// Parse a YAML document
    pub fn from_yaml_str(content: &str) -> Result<Self, PayloadError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Parse a JSON document
    pub fn from_json_str(content: &str) -> Result<Self, PayloadError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load a payload file, choosing the format from its extension
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, PayloadError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|source| PayloadError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        match path.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase) {
            Some(ext) if ext == "yaml" || ext == "yml" => Self::from_yaml_str(&content),
            Some(ext) if ext == "json" => Self::from_json_str(&content),
            other => Err(PayloadError::UnsupportedFormat(other.unwrap_or_default())),
        }
    }

    /// Render as YAML, the format the notebook export uses
    pub fn to_yaml_string(&self) -> Result<String, PayloadError> {
        Ok(serde_yaml::to_string(self)?)
    }
}
