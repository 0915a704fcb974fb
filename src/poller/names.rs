use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::api::StatsApi;
use crate::db::Repository;
use crate::events::{EventTx, OverlayEvent};

/// Refreshes the display names of the most recently added accounts.
///
/// Per-account failures are logged and skipped. Returns how many names were
/// updated.
pub async fn refresh_account_names<A>(
    api: &A,
    repo: &Repository,
    events: &EventTx,
    limit: u32,
) -> usize
where
    A: StatsApi + ?Sized,
{
    let ids = match repo.get_recent_account_ids(limit).await {
        Ok(ids) => ids,
        Err(e) => {
            warn!(error = %e, "👤 ⚠️ Could not list tracked accounts");
            return 0;
        }
    };

    let mut refreshed = 0;
    for account_id in ids {
        let player = match api.get_player(account_id).await {
            Ok(player) => player,
            Err(e) => {
                warn!(account_id, error = %e, "👤 ⚠️ Name lookup failed");
                continue;
            }
        };

        match repo.rename_account(account_id, &player.name).await {
            Ok(true) => {
                debug!(account_id, name = %player.name, "👤 Name refreshed");
                refreshed += 1;
            }
            Ok(false) => debug!(account_id, "👤 Account removed during refresh, skipped"),
            Err(e) => warn!(account_id, error = %e, "👤 ⚠️ Could not store name"),
        }
    }

    info!(refreshed, "👤 Account names refreshed");
    if events.send(OverlayEvent::PlayerNamesRefreshed).await.is_err() {
        warn!("👤 ⚠️ No presentation listener for name refresh");
    }

    refreshed
}

pub fn spawn_name_refresh<A>(
    api: Arc<A>,
    repo: Repository,
    events: EventTx,
    limit: u32,
) -> tokio::task::JoinHandle<usize>
where
    A: StatsApi + ?Sized + 'static,
{
    tokio::spawn(async move { refresh_account_names(api.as_ref(), &repo, &events, limit).await })
}
