use async_trait::async_trait;
use tracing::instrument;

use super::client::RemoteClient;
use super::types::{
    ApiResponse, LastGameDto, LeaderboardDto, LeaderboardEntryDto, PlayerDto, PlayerSearchDto,
};

/// Read-only surface of the stats API consumed by the poller.
#[async_trait]
pub trait StatsApi: Send + Sync {
    async fn search_players(&self, query: &str) -> ApiResponse<Vec<PlayerDto>>;

    async fn get_player(&self, account_id: i64) -> ApiResponse<PlayerDto>;

    async fn get_last_game(&self, account_id: i64) -> ApiResponse<LastGameDto>;

    /// First entry of `leaderboard` for the account, `None` when it has no rating there.
    async fn get_leaderboard_entry(
        &self,
        leaderboard: &str,
        account_id: i64,
    ) -> ApiResponse<Option<LeaderboardEntryDto>>;
}

#[derive(Debug)]
pub struct Aoe4WorldClient {
    client: RemoteClient,
    base_url: String,
}

impl Aoe4WorldClient {
    pub fn new(client: RemoteClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl StatsApi for Aoe4WorldClient {
    #[instrument(skip(self), level = "trace")]
    async fn search_players(&self, query: &str) -> ApiResponse<Vec<PlayerDto>> {
        let url = format!(
            "{}/players/search?query={}",
            self.base_url,
            urlencoding::encode(query)
        );

        let res: PlayerSearchDto = self.client.get_json(&url).await?;
        Ok(res.players)
    }

    #[instrument(skip(self), level = "trace")]
    async fn get_player(&self, account_id: i64) -> ApiResponse<PlayerDto> {
        let url = format!("{}/players/{}", self.base_url, account_id);

        self.client.get_json(&url).await
    }

    #[instrument(skip(self), level = "trace")]
    async fn get_last_game(&self, account_id: i64) -> ApiResponse<LastGameDto> {
        let url = format!("{}/players/{}/games/last", self.base_url, account_id);

        self.client.get_json(&url).await
    }

    #[instrument(skip(self), level = "trace")]
    async fn get_leaderboard_entry(
        &self,
        leaderboard: &str,
        account_id: i64,
    ) -> ApiResponse<Option<LeaderboardEntryDto>> {
        let url = format!(
            "{}/leaderboards/{}?profile_id={}",
            self.base_url,
            urlencoding::encode(leaderboard),
            account_id
        );

        let res: LeaderboardDto = self.client.get_json(&url).await?;
        Ok(res.players.into_iter().next())
    }
}
