use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::error::TrySendError;
use tracing::{Span, debug, error, info, instrument, warn};

use super::error::CycleError;
use super::fetcher::{fetch_latest_match, is_new};
use super::roster::resolve_roster;
use super::validator::validate;
use crate::api::StatsApi;
use crate::db::Repository;
use crate::diagnostics::DiagnosticLog;
use crate::events::{EventTx, MatchSnapshot, OverlayEvent};

#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// No account is tracked yet.
    NoAccount,
    /// The latest match is the one already stored.
    Unchanged,
    Committed(MatchSnapshot),
}

/// One fetch → resolve → validate → persist pass, plus the cursor it advances.
///
/// The poller is the only writer of the cursor and of the stored match.
pub struct Poller<A: StatsApi + ?Sized> {
    api: Arc<A>,
    repo: Repository,
    events: EventTx,
    log: DiagnosticLog,
    cycle_timeout: Duration,
    last_seen_match_id: Option<String>,
}

impl<A: StatsApi + ?Sized> Poller<A> {
    pub fn new(
        api: Arc<A>,
        repo: Repository,
        events: EventTx,
        log: DiagnosticLog,
        cycle_timeout: Duration,
    ) -> Self {
        Self {
            api,
            repo,
            events,
            log,
            cycle_timeout,
            last_seen_match_id: None,
        }
    }

    pub fn api(&self) -> &Arc<A> {
        &self.api
    }

    pub fn repo(&self) -> &Repository {
        &self.repo
    }

    pub fn events(&self) -> &EventTx {
        &self.events
    }

    pub fn last_seen_match_id(&self) -> Option<&str> {
        self.last_seen_match_id.as_deref()
    }

    /// Publishes the stored match, if any, and starts the cursor from it.
    pub async fn restore_last_match(&mut self) -> Result<Option<MatchSnapshot>, CycleError> {
        let Some(snapshot) = self.repo.load_last_match().await? else {
            return Ok(None);
        };

        info!(match_id = %snapshot.match_id, "🎮 Restored stored match");
        self.last_seen_match_id = Some(snapshot.match_id.clone());
        self.publish(snapshot.clone());

        Ok(Some(snapshot))
    }

    /// Runs one cycle under the cycle timeout and records it in the diagnostic log.
    #[instrument(skip(self), fields(match_id))]
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome, CycleError> {
        if let Err(e) = self.log.rotate_if_needed().await {
            warn!(error = %e, "🧾 ⚠️ Failed to rotate diagnostic log");
        }

        let timeout = self.cycle_timeout;
        let result = match tokio::time::timeout(timeout, self.cycle()).await {
            Ok(result) => result,
            Err(_) => Err(CycleError::Timeout(timeout)),
        };

        // Published outside the timeout: once committed, the event must not be lost.
        if let Ok(CycleOutcome::Committed(snapshot)) = &result {
            self.publish(snapshot.clone());
        }

        let logged = match &result {
            Ok(CycleOutcome::Committed(snapshot)) => {
                Span::current().record("match_id", snapshot.match_id.as_str());
                self.log.record_values(snapshot).await
            }
            Ok(_) => Ok(()),
            Err(e @ CycleError::Timeout(_)) => {
                warn!(error = %e, "🔄 ⚠️ Fetch cycle timed out");
                self.log.record_timeout(e).await
            }
            Err(e @ CycleError::IncompleteRoster { .. }) => {
                warn!(error = %e, "🔄 ⚠️ Discarding incomplete roster");
                self.log.record_failure(e).await
            }
            Err(e) => {
                error!(error = %e, "🔄 ❌ Fetch cycle failed");
                self.log.record_failure(e).await
            }
        };

        if let Err(e) = logged {
            warn!(error = %e, "🧾 ⚠️ Failed to write diagnostic log");
        }

        result
    }

    async fn cycle(&mut self) -> Result<CycleOutcome, CycleError> {
        let Some(account) = self.repo.get_active_account().await? else {
            debug!("🔄 No tracked account, skipping cycle");
            return Ok(CycleOutcome::NoAccount);
        };

        let summary = fetch_latest_match(self.api.as_ref(), account.account_id).await?;

        if !is_new(&summary, self.last_seen_match_id.as_deref()) {
            debug!(match_id = %summary.match_id, "🔄 No new match");
            return Ok(CycleOutcome::Unchanged);
        }

        info!(
            match_id = %summary.match_id,
            category = %summary.category,
            account = %account.display_name,
            "🎮 New match detected"
        );

        let roster = resolve_roster(self.api.as_ref(), &summary).await?;
        validate(&summary.category, roster.len())?;

        self.repo.replace_last_match(&summary, &roster).await?;
        // Nothing may be awaited between the commit and the cursor update.
        self.last_seen_match_id = Some(summary.match_id.clone());

        let snapshot = MatchSnapshot {
            participant_count: summary.participant_count(),
            map_key: summary.map_key,
            match_id: summary.match_id,
            participants: roster,
            category: summary.category,
        };

        info!(
            match_id = %snapshot.match_id,
            participants = snapshot.participants.len(),
            unrated = snapshot.participants.iter().filter(|p| !p.is_rated()).count(),
            "🎮 ✅ Match stored"
        );

        Ok(CycleOutcome::Committed(snapshot))
    }

    /// Sends `MatchChanged` without awaiting, so cancelling the caller cannot drop it.
    ///
    /// When the channel is full the send is handed to a task that waits for room.
    fn publish(&self, snapshot: MatchSnapshot) {
        match self.events.try_send(OverlayEvent::MatchChanged(snapshot)) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                debug!("🎮 Presentation channel full, deferring match update");
                let events = self.events.clone();
                tokio::spawn(async move {
                    if events.send(event).await.is_err() {
                        warn!("🎮 ⚠️ No presentation listener for match update");
                    }
                });
            }
            Err(TrySendError::Closed(_)) => {
                warn!("🎮 ⚠️ No presentation listener for match update");
            }
        }
    }
}
