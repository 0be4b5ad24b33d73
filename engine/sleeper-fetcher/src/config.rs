use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Configuration for the Sleeper fetcher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// Sleeper API base URL
    pub api_base_url: String,

    /// League to fetch
    pub league_id: String,

    /// HTTP request timeout in seconds
    pub timeout_secs: u64,

    /// Local copy of the (large) `players/nfl` database, reused when present
    pub players_cache: Option<PathBuf>,

    /// Sleeper division number -> league division tag
    #[serde(default)]
    pub division_tags: BTreeMap<u32, String>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.sleeper.app/v1".to_string(),
            league_id: String::new(),
            timeout_secs: 30,
            players_cache: None,
            division_tags: BTreeMap::new(),
        }
    }
}

impl FetcherConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.league_id.trim().is_empty() {
            return Err("Sleeper league id is not set".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("timeout_secs must be greater than 0".to_string());
        }
        if !self.api_base_url.starts_with("http") {
            return Err(format!("invalid Sleeper API base URL: {}", self.api_base_url));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        let mut config = FetcherConfig::default();
        assert!(config.validate().is_err());

        config.league_id = "1180208789911158784".to_string();
        assert!(config.validate().is_ok());

        config.timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}
