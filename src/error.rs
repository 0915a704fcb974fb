use thiserror::Error;

use crate::api::client::TransportFailure;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] TransportFailure),

    #[error("Account not tracked: {0}")]
    AccountNotTracked(i64),
}
