//! League Registry - owner, team name and division lookups
//!
//! Loads the league file (`league.toml`) and serves as the roster registry
//! and team-name lookup for the weekly report normalizer.

pub mod registry;
pub mod types;

pub use registry::LeagueRegistry;
pub use types::{LeagueConfig, LeagueInfo, RegistryError, TeamEntry};
