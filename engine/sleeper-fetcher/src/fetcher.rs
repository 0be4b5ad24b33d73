use crate::config::FetcherConfig;
use crate::convert::{build_brief, WeekData};
use crate::error::{FetchError, Result};
use crate::models::*;
use crate::upcoming::{pair_upcoming, UpcomingWeek};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};
use weekly_report::RawBrief;

/// Sleeper API client for one league
pub struct SleeperFetcher {
    config: FetcherConfig,
    client: Client,
}

impl SleeperFetcher {
    /// Create a new fetcher instance
    pub fn new(config: FetcherConfig) -> Result<Self> {
        config.validate().map_err(FetchError::Config)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|source| FetchError::Http {
                endpoint: "client".to_string(),
                source,
            })?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let url = format!("{}/{}", self.config.api_base_url.trim_end_matches('/'), endpoint);
        info!("Fetching {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| FetchError::Http {
                endpoint: endpoint.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Sleeper API error on {}: {}", endpoint, status);
            return Err(FetchError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|source| FetchError::Http {
                endpoint: endpoint.to_string(),
                source,
            })?;
        serde_json::from_str(&body).map_err(|source| FetchError::Decode {
            endpoint: endpoint.to_string(),
            source,
        })
    }

    pub async fn fetch_nfl_state(&self) -> Result<NflState> {
        self.get_json("state/nfl").await
    }

    pub async fn fetch_league(&self) -> Result<SleeperLeague> {
        self.get_json(&format!("league/{}", self.config.league_id)).await
    }

    pub async fn fetch_users(&self) -> Result<Vec<SleeperUser>> {
        self.get_json(&format!("league/{}/users", self.config.league_id)).await
    }

    pub async fn fetch_rosters(&self) -> Result<Vec<SleeperRoster>> {
        self.get_json(&format!("league/{}/rosters", self.config.league_id)).await
    }

    pub async fn fetch_matchups(&self, week: u32) -> Result<Vec<SleeperMatchup>> {
        self.get_json(&format!("league/{}/matchups/{}", self.config.league_id, week)).await
    }

    /// Player database, read from the cache file when one is configured and present
    pub async fn fetch_players(&self) -> Result<PlayerDatabase> {
        if let Some(cache) = &self.config.players_cache {
            match tokio::fs::read_to_string(cache).await {
                Ok(content) => {
                    info!("Using cached player database from: {:?}", cache);
                    return serde_json::from_str(&content).map_err(|source| FetchError::Decode {
                        endpoint: cache.display().to_string(),
                        source,
                    });
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(source) => {
                    return Err(FetchError::Io {
                        path: cache.clone(),
                        source,
                    })
                }
            }
        }

        let players: PlayerDatabase = self.get_json("players/nfl").await?;
        info!("Fetched {} players", players.len());

        if let Some(cache) = &self.config.players_cache {
            let content = serde_json::to_string(&players)
                .map_err(|source| FetchError::Decode {
                    endpoint: "players/nfl".to_string(),
                    source,
                })?;
            if let Some(parent) = cache.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|source| FetchError::Io {
                        path: parent.to_path_buf(),
                        source,
                    })?;
            }
            tokio::fs::write(cache, content)
                .await
                .map_err(|source| FetchError::Io {
                    path: cache.clone(),
                    source,
                })?;
            info!("Cached player database at: {:?}", cache);
        }

        Ok(players)
    }

    /// Fetch everything for a week. Requests run one after another.
    pub async fn fetch_week_data(&self, week: u32) -> Result<WeekData> {
        let league = self.fetch_league().await?;
        let users = self.fetch_users().await?;
        let rosters = self.fetch_rosters().await?;
        let matchups = self.fetch_matchups(week).await?;
        let players = self.fetch_players().await?;

        info!(
            "Fetched week {} of '{}': {} users, {} rosters, {} matchup entries",
            week,
            league.name,
            users.len(),
            rosters.len(),
            matchups.len()
        );

        Ok(WeekData {
            league,
            users,
            rosters,
            matchups,
            players,
        })
    }

    /// Fetch a week and convert it to a brief
    pub async fn fetch_brief(&self, week: u32) -> Result<RawBrief> {
        let data = self.fetch_week_data(week).await?;
        Ok(build_brief(week, &data, &self.config.division_tags))
    }

    /// Pairings for an unplayed week joined with the current standings.
    /// A failed matchups request falls back to pairing by standings.
    pub async fn fetch_upcoming(&self, week: u32) -> Result<UpcomingWeek> {
        let league = self.fetch_league().await?;
        let users = self.fetch_users().await?;
        let rosters = self.fetch_rosters().await?;
        let matchups = match self.fetch_matchups(week).await {
            Ok(matchups) => matchups,
            Err(e) => {
                warn!("No matchups for week {}: {}", week, e);
                Vec::new()
            }
        };

        let season = league.season.trim().parse().ok();
        Ok(pair_upcoming(season, week, &rosters, &users, &matchups, &self.config.division_tags))
    }
}

/// File name the weekly brief is written under
pub fn brief_file_name(week: u32) -> String {
    format!("creative_brief_week{week}.yaml")
}

/// Write a brief as YAML into `dir`, returning the file path
pub async fn write_brief(brief: &RawBrief, dir: &Path, week: u32) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| FetchError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

    let path = dir.join(brief_file_name(week));
    let content = brief.to_yaml_string()?;
    tokio::fs::write(&path, content)
        .await
        .map_err(|source| FetchError::Io {
            path: path.clone(),
            source,
        })?;

    info!("Wrote brief for week {} to: {:?}", week, path);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upcoming::{write_upcoming, PairingSource};
    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

    const LEAGUE_ID: &str = "1180208789911158784";

    fn config_for(server: &MockServer) -> FetcherConfig {
        FetcherConfig {
            api_base_url: server.uri(),
            league_id: LEAGUE_ID.to_string(),
            ..Default::default()
        }
    }

    async fn mount(server: &MockServer, path: String, body: serde_json::Value) {
        Mock::given(matchers::method("GET"))
            .and(matchers::path(path))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    async fn mount_league(server: &MockServer) {
        mount(
            server,
            format!("/league/{LEAGUE_ID}"),
            json!({
                "league_id": LEAGUE_ID,
                "name": "16 Fantasies 1 Cup",
                "season": "2025",
                "roster_positions": ["QB", "BN"]
            }),
        )
        .await;
        mount(
            server,
            format!("/league/{LEAGUE_ID}/users"),
            json!([
                { "user_id": "u1", "display_name": "Healzy" },
                { "user_id": "u2", "display_name": "Coops" }
            ]),
        )
        .await;
        mount(
            server,
            format!("/league/{LEAGUE_ID}/rosters"),
            json!([
                {
                    "roster_id": 1,
                    "owner_id": "u1",
                    "settings": { "wins": 1, "fpts": 24, "fpts_decimal": 50 }
                },
                {
                    "roster_id": 2,
                    "owner_id": "u2",
                    "settings": { "losses": 1, "fpts": 11, "fpts_decimal": 20 }
                }
            ]),
        )
        .await;
        mount(
            server,
            format!("/league/{LEAGUE_ID}/matchups/3"),
            json!([
                {
                    "roster_id": 1, "matchup_id": 1, "points": 24.5,
                    "starters": ["p1"], "starters_points": [24.5]
                },
                {
                    "roster_id": 2, "matchup_id": 1, "points": 11.2,
                    "starters": ["p2"], "starters_points": [11.2]
                }
            ]),
        )
        .await;
    }

    #[tokio::test]
    async fn test_fetch_brief_caches_players() {
        let server = MockServer::start().await;
        mount_league(&server).await;
        Mock::given(matchers::method("GET"))
            .and(matchers::path("/players/nfl"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "p1": { "full_name": "Josh Allen", "position": "QB" },
                "p2": { "full_name": "Bo Nix", "position": "QB" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        let mut config = config_for(&server);
        config.players_cache = Some(temp_dir.path().join("cache").join("players.json"));
        let fetcher = SleeperFetcher::new(config).unwrap();

        let brief = fetcher.fetch_brief(3).await.unwrap();
        let teams = brief.matchups.as_ref().unwrap()[0].teams.as_ref().unwrap();
        assert_eq!(teams[0].owner.as_ref().and_then(|o| o.as_text()), Some("Healzy".to_string()));

        // Second fetch reads the cache; the mock expects a single players call
        fetcher.fetch_brief(3).await.unwrap();

        let path = write_brief(&brief, temp_dir.path(), 3).await.unwrap();
        assert!(path.ends_with("creative_brief_week3.yaml"));
        let reloaded = RawBrief::load_from_file(&path).unwrap();
        assert_eq!(reloaded, brief);
    }

    #[tokio::test]
    async fn test_status_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("GET"))
            .and(matchers::path(format!("/league/{LEAGUE_ID}")))
            .respond_with(ResponseTemplate::new(404).set_body_string("league not found"))
            .mount(&server)
            .await;

        let fetcher = SleeperFetcher::new(config_for(&server)).unwrap();
        match fetcher.fetch_league().await {
            Err(FetchError::Status { status, body, .. }) => {
                assert_eq!(status, 404);
                assert_eq!(body, "league not found");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unexpected_body_is_decode_error() {
        let server = MockServer::start().await;
        mount(&server, "/state/nfl".to_string(), json!({ "season": "2025" })).await;

        let fetcher = SleeperFetcher::new(config_for(&server)).unwrap();
        assert!(matches!(fetcher.fetch_nfl_state().await, Err(FetchError::Decode { .. })));
    }

    #[tokio::test]
    async fn test_fetch_upcoming_uses_published_pairings() {
        let server = MockServer::start().await;
        mount_league(&server).await;
        mount(
            &server,
            format!("/league/{LEAGUE_ID}/matchups/4"),
            json!([
                { "roster_id": 2, "matchup_id": 1, "points": 0.0 },
                { "roster_id": 1, "matchup_id": 1, "points": 0.0 }
            ]),
        )
        .await;

        let fetcher = SleeperFetcher::new(config_for(&server)).unwrap();
        let upcoming = fetcher.fetch_upcoming(4).await.unwrap();
        assert_eq!(upcoming.season, Some(2025));
        assert_eq!(upcoming.source, PairingSource::Sleeper);
        assert_eq!(upcoming.matchups[0].home.owner, "Healzy");
        assert_eq!(upcoming.matchups[0].away.record(), "0-1");

        let temp_dir = TempDir::new().unwrap();
        let path = write_upcoming(&upcoming, temp_dir.path()).await.unwrap();
        assert!(path.ends_with("preweek_week4.json"));
        let content = std::fs::read_to_string(&path).unwrap();
        let reloaded: UpcomingWeek = serde_json::from_str(&content).unwrap();
        assert_eq!(reloaded, upcoming);
    }

    #[tokio::test]
    async fn test_fetch_upcoming_falls_back_when_week_is_unpublished() {
        let server = MockServer::start().await;
        mount_league(&server).await;
        Mock::given(matchers::method("GET"))
            .and(matchers::path(format!("/league/{LEAGUE_ID}/matchups/18")))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = SleeperFetcher::new(config_for(&server)).unwrap();
        let upcoming = fetcher.fetch_upcoming(18).await.unwrap();
        assert_eq!(upcoming.source, PairingSource::Standings);
        assert_eq!(upcoming.matchups.len(), 1);
        assert_eq!(upcoming.matchups[0].home.rank, 1);
        assert_eq!(upcoming.matchups[0].away.owner, "Coops");
    }

    #[test]
    fn test_new_rejects_missing_league() {
        assert!(matches!(
            SleeperFetcher::new(FetcherConfig::default()),
            Err(FetchError::Config(_))
        ));
    }
}
