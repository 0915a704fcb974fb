use std::time::Duration;

use thiserror::Error;

use crate::api::types::ApiError;
use crate::error::AppError;

/// Why a fetch cycle ended without storing a match.
///
/// None of these stop the poll loop; the next tick simply tries again.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("Transport error: {0}")]
    Transport(#[source] ApiError),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Incomplete roster for {category}: expected {expected} participants, got {actual}")]
    IncompleteRoster {
        category: String,
        expected: usize,
        actual: usize,
    },

    #[error("Cycle abandoned after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Storage(#[from] AppError),
}

impl From<ApiError> for CycleError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Parse(e) => CycleError::Parse(e.to_string()),
            other => CycleError::Transport(other),
        }
    }
}
