//! In-memory stats API used by the poller tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::api::StatsApi;
use crate::api::types::{
    ApiError, ApiResponse, GameIdDto, LastGameDto, LeaderboardEntryDto, PlayerDto, TeamMemberDto,
};

pub(crate) fn game(id: &str, kind: &str, teams: &[&[(i64, &str)]]) -> LastGameDto {
    LastGameDto {
        game_id: GameIdDto::Text(id.to_string()),
        map: "Dry Arabia".to_string(),
        kind: kind.to_string(),
        teams: teams
            .iter()
            .map(|team| {
                team.iter()
                    .map(|(id, name)| TeamMemberDto {
                        profile_id: *id,
                        name: name.to_string(),
                        civilization: "holy_roman_empire".to_string(),
                    })
                    .collect()
            })
            .collect(),
    }
}

pub(crate) fn entry(rating: i64, win_rate: f64) -> LeaderboardEntryDto {
    LeaderboardEntryDto { rating, win_rate }
}

#[derive(Debug, Default)]
pub(crate) struct MockApi {
    last_game: Mutex<Option<LastGameDto>>,
    ratings: Mutex<HashMap<i64, LeaderboardEntryDto>>,
    names: Mutex<HashMap<i64, String>>,
    broken_players: Mutex<HashSet<i64>>,
    stall: Mutex<Option<Duration>>,
    player_stall: Mutex<Option<Duration>>,
    offline: AtomicBool,
    pub last_game_calls: AtomicUsize,
    pub lookups: Mutex<Vec<(String, i64)>>,
    pub player_calls: AtomicUsize,
}

impl MockApi {
    pub(crate) fn new(last_game: LastGameDto) -> Self {
        let api = Self::default();
        api.set_last_game(last_game);
        api
    }

    pub(crate) fn set_last_game(&self, game: LastGameDto) {
        *self.last_game.lock().unwrap() = Some(game);
    }

    pub(crate) fn with_rating(self, account_id: i64, entry: LeaderboardEntryDto) -> Self {
        self.ratings.lock().unwrap().insert(account_id, entry);
        self
    }

    pub(crate) fn with_name(self, account_id: i64, name: &str) -> Self {
        self.names.lock().unwrap().insert(account_id, name.to_string());
        self
    }

    pub(crate) fn with_broken_player(self, account_id: i64) -> Self {
        self.broken_players.lock().unwrap().insert(account_id);
        self
    }

    /// Every leaderboard lookup sleeps this long before answering.
    pub(crate) fn set_stall(&self, stall: Option<Duration>) {
        *self.stall.lock().unwrap() = stall;
    }

    /// Every player lookup sleeps this long before answering.
    pub(crate) fn set_player_stall(&self, stall: Option<Duration>) {
        *self.player_stall.lock().unwrap() = stall;
    }

    pub(crate) fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn transport_error() -> ApiError {
        ApiError::Transport {
            attempts: 11,
            message: "connection refused".into(),
        }
    }
}

#[async_trait]
impl StatsApi for MockApi {
    async fn search_players(&self, query: &str) -> ApiResponse<Vec<PlayerDto>> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(Self::transport_error());
        }
        let names = self.names.lock().unwrap();
        let mut hits: Vec<PlayerDto> = names
            .iter()
            .filter(|(_, name)| name.to_lowercase().contains(&query.to_lowercase()))
            .map(|(id, name)| PlayerDto {
                profile_id: *id,
                name: name.clone(),
                last_game_at: None,
            })
            .collect();
        hits.sort_by_key(|p| p.profile_id);
        Ok(hits)
    }

    async fn get_player(&self, account_id: i64) -> ApiResponse<PlayerDto> {
        self.player_calls.fetch_add(1, Ordering::SeqCst);
        let stall = *self.player_stall.lock().unwrap();
        if let Some(stall) = stall {
            tokio::time::sleep(stall).await;
        }
        if self.broken_players.lock().unwrap().contains(&account_id) {
            return Err(Self::transport_error());
        }
        let name = self.names.lock().unwrap().get(&account_id).cloned();
        match name {
            Some(name) => Ok(PlayerDto {
                profile_id: account_id,
                name,
                last_game_at: None,
            }),
            None => Err(ApiError::Status(404)),
        }
    }

    async fn get_last_game(&self, _account_id: i64) -> ApiResponse<LastGameDto> {
        self.last_game_calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(Self::transport_error());
        }
        let game = self.last_game.lock().unwrap().clone();
        game.ok_or(ApiError::Status(404))
    }

    async fn get_leaderboard_entry(
        &self,
        leaderboard: &str,
        account_id: i64,
    ) -> ApiResponse<Option<LeaderboardEntryDto>> {
        self.lookups
            .lock()
            .unwrap()
            .push((leaderboard.to_string(), account_id));

        let stall = *self.stall.lock().unwrap();
        if let Some(stall) = stall {
            tokio::time::sleep(stall).await;
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(Self::transport_error());
        }

        Ok(self.ratings.lock().unwrap().get(&account_id).cloned())
    }
}
