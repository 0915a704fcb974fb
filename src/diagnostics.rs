//! Append-only text log of every fetch cycle, kept next to the database.

use std::path::{Path, PathBuf};

use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::events::MatchSnapshot;

#[derive(Debug, Clone)]
pub struct DiagnosticLog {
    path: PathBuf,
    max_lines: usize,
}

impl DiagnosticLog {
    pub fn new(path: impl Into<PathBuf>, max_lines: usize) -> Self {
        Self {
            path: path.into(),
            max_lines,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Empties the file once it holds more than `max_lines` lines.
    ///
    /// Returns whether the file was truncated. A missing file counts as empty.
    pub async fn rotate_if_needed(&self) -> std::io::Result<bool> {
        let content = match fs::read(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e),
        };

        let lines = content.split(|b| *b == b'\n').filter(|l| !l.is_empty()).count();
        if lines <= self.max_lines {
            return Ok(false);
        }

        fs::File::create(&self.path).await?;
        debug!(lines, path = %self.path.display(), "🧾 Diagnostic log truncated");
        Ok(true)
    }

    /// Records the rows about to be stored for a match.
    pub async fn record_values(&self, snapshot: &MatchSnapshot) -> std::io::Result<()> {
        let values = snapshot
            .participants
            .iter()
            .map(|r| {
                format!(
                    "({}, '{}', '{}', '{}', '{}', {}, '{}', {}, '{}')",
                    snapshot.match_id,
                    r.participant.display_name,
                    r.win_rate_display(),
                    r.participant.civilization,
                    snapshot.map_key,
                    r.participant.account_id,
                    r.rating_display(),
                    r.participant.team_index,
                    snapshot.category,
                )
            })
            .collect::<Vec<_>>()
            .join(",");

        self.append(&format!("when request -- {values}")).await
    }

    pub async fn record_failure(
        &self,
        error: &(dyn std::error::Error + Send + Sync),
    ) -> std::io::Result<()> {
        self.append(&format!("when request exception -- {error}"))
            .await
    }

    pub async fn record_timeout(
        &self,
        error: &(dyn std::error::Error + Send + Sync),
    ) -> std::io::Result<()> {
        self.append(&format!("when timesleep exception -- {error}"))
            .await
    }

    async fn append(&self, message: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        let stamp = chrono::Local::now().format("%a %b %e %H:%M:%S %Y");
        file.write_all(format!("{stamp}: {message}\n").as_bytes())
            .await?;
        file.flush().await
    }
}
