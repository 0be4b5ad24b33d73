//! Sleeper Fetcher
//!
//! Pulls a league's users, rosters, weekly matchups and the NFL player
//! database from the Sleeper API and converts them into the raw brief
//! schema consumed by the weekly report engine. Pairings for a week that
//! has not been played yet are joined with the standings for preweek issues.

pub mod config;
pub mod convert;
pub mod error;
pub mod fetcher;
pub mod models;
pub mod upcoming;

pub use config::FetcherConfig;
pub use convert::{build_brief, WeekData};
pub use error::FetchError;
pub use fetcher::{brief_file_name, write_brief, SleeperFetcher};
pub use upcoming::{
    upcoming_file_name, write_upcoming, PairingSource, StandingEntry, UpcomingMatchup, UpcomingWeek,
};
