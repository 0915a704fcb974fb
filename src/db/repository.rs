use sqlx::SqlitePool;

use super::models::{LastMatchRow, TrackedAccount, snapshot_from_rows};
use crate::config::Settings;
use crate::error::AppError;
use crate::events::MatchSnapshot;
use crate::model::{MatchSummary, ResolvedParticipant};

const ACCOUNT_COLUMNS: &str = "id, account_id, display_name, is_active, created_at";

const LAST_MATCH_COLUMNS: &str = "match_id, participant_name, win_rate, civilization, map, \
     account_id, rating, team_index, category";

#[derive(Clone, Debug)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // === Tracked accounts ===

    /// Inserts the account (inactive) or refreshes its display name.
    pub async fn upsert_account_name(
        &self,
        account_id: i64,
        display_name: &str,
    ) -> Result<TrackedAccount, AppError> {
        let query = format!(
            r#"
            INSERT INTO tracked_accounts (account_id, display_name)
            VALUES (?, ?)
            ON CONFLICT(account_id) DO UPDATE SET
                display_name = excluded.display_name
            RETURNING {ACCOUNT_COLUMNS}
            "#
        );

        let account = sqlx::query_as::<_, TrackedAccount>(&query)
            .bind(account_id)
            .bind(display_name)
            .fetch_one(&self.pool)
            .await?;
        Ok(account)
    }

    /// Renames an account that is still tracked; never inserts.
    pub async fn rename_account(
        &self,
        account_id: i64,
        display_name: &str,
    ) -> Result<bool, AppError> {
        let result =
            sqlx::query("UPDATE tracked_accounts SET display_name = ? WHERE account_id = ?")
                .bind(display_name)
                .bind(account_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Stores the account and makes it the only tracked one.
    pub async fn track_account(
        &self,
        account_id: i64,
        display_name: &str,
    ) -> Result<(), AppError> {
        self.upsert_account_name(account_id, display_name).await?;
        self.set_active_account(account_id).await
    }

    pub async fn set_active_account(&self, account_id: i64) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE tracked_accounts SET is_active = 0")
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("UPDATE tracked_accounts SET is_active = 1 WHERE account_id = ?")
            .bind(account_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(AppError::AccountNotTracked(account_id));
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn delete_account(&self, account_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM tracked_accounts WHERE account_id = ?")
            .bind(account_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// The tracked account: newest active one, or the newest overall when none is active.
    pub async fn get_active_account(&self) -> Result<Option<TrackedAccount>, AppError> {
        let account = sqlx::query_as::<_, TrackedAccount>(&format!(
            r#"
            SELECT {ACCOUNT_COLUMNS}
            FROM tracked_accounts
            ORDER BY is_active DESC, created_at DESC, id DESC
            LIMIT 1
            "#
        ))
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }

    pub async fn get_recent_account_ids(&self, limit: u32) -> Result<Vec<i64>, AppError> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT account_id FROM tracked_accounts ORDER BY created_at DESC, id DESC LIMIT ?",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    // === Last match ===

    pub async fn load_last_match(&self) -> Result<Option<MatchSnapshot>, AppError> {
        let rows = sqlx::query_as::<_, LastMatchRow>(&format!(
            r#"
            SELECT {LAST_MATCH_COLUMNS}
            FROM last_match
            WHERE match_id = (SELECT match_id FROM last_match LIMIT 1)
            ORDER BY team_index ASC, participant_name ASC
            "#
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(snapshot_from_rows(rows))
    }

    /// Replaces the stored match with `roster` in a single transaction.
    ///
    /// Readers see either the previous match or the new one, never a mix.
    pub async fn replace_last_match(
        &self,
        summary: &MatchSummary,
        roster: &[ResolvedParticipant],
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM last_match")
            .execute(&mut *tx)
            .await?;

        for resolved in roster {
            let p = &resolved.participant;
            sqlx::query(&format!(
                "INSERT INTO last_match ({LAST_MATCH_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"
            ))
            .bind(&summary.match_id)
            .bind(&p.display_name)
            .bind(resolved.win_rate)
            .bind(&p.civilization)
            .bind(&summary.map_key)
            .bind(p.account_id)
            .bind(resolved.rating)
            .bind(i64::from(p.team_index))
            .bind(summary.category.kind())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    // === Settings ===

    pub async fn load_settings(&self) -> Result<Settings, AppError> {
        let rows = sqlx::query_as::<_, (String, String)>("SELECT key, value FROM settings")
            .fetch_all(&self.pool)
            .await?;
        Ok(Settings::from_rows(rows))
    }

    pub async fn save_setting(&self, key: &str, value: &str) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO settings (key, value) VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
