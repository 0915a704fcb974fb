use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Transport error after {attempts} attempt(s): {message}")]
    Transport { attempts: u32, message: String },

    #[error("HTTP status error: {0}")]
    Status(u16),

    #[error("Malformed payload: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A call to the stats API either results in the success type or fails with an [`ApiError`].
pub type ApiResponse<T> = Result<T, ApiError>;

// ============================================================================
// Players
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerDto {
    pub profile_id: i64,
    pub name: String,
    #[serde(default)]
    pub last_game_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerSearchDto {
    #[serde(default)]
    pub players: Vec<PlayerDto>,
}

// ============================================================================
// Games
// ============================================================================

/// Game ids come back as numbers, but are treated as opaque strings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum GameIdDto {
    Number(u64),
    Text(String),
}

impl std::fmt::Display for GameIdDto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LastGameDto {
    pub game_id: GameIdDto,
    pub map: String,
    pub kind: String,
    pub teams: Vec<Vec<TeamMemberDto>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TeamMemberDto {
    pub profile_id: i64,
    pub name: String,
    pub civilization: String,
}

// ============================================================================
// Leaderboards
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct LeaderboardDto {
    #[serde(default)]
    pub players: Vec<LeaderboardEntryDto>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LeaderboardEntryDto {
    pub rating: i64,
    pub win_rate: f64,
}
