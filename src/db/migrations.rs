use sqlx::SqlitePool;
use tracing::info;

use crate::error::AppError;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS tracked_accounts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    account_id INTEGER UNIQUE NOT NULL,
    display_name TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL DEFAULT (unixepoch())
);

CREATE TABLE IF NOT EXISTS last_match (
    match_id TEXT NOT NULL,
    participant_name TEXT NOT NULL,
    win_rate REAL,
    civilization TEXT NOT NULL,
    map TEXT NOT NULL,
    account_id INTEGER NOT NULL,
    rating INTEGER,
    team_index INTEGER NOT NULL,
    category TEXT NOT NULL,
    PRIMARY KEY (match_id, participant_name)
);

CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_tracked_accounts_created ON tracked_accounts(created_at);
"#;

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), AppError> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    info!("🗄️ Database migrations completed");
    Ok(())
}
