use tracing::{info, instrument, warn};

use super::error::CycleError;
use crate::api::StatsApi;
use crate::events::{EventTx, OverlayEvent, PlayerSearchHit};

/// Looks players up by name and hands the hits to the presentation layer.
#[instrument(skip(api, events))]
pub async fn search_players<A>(
    api: &A,
    query: &str,
    events: &EventTx,
) -> Result<Vec<PlayerSearchHit>, CycleError>
where
    A: StatsApi + ?Sized,
{
    let hits: Vec<PlayerSearchHit> = api
        .search_players(query)
        .await?
        .into_iter()
        .map(|p| PlayerSearchHit {
            account_id: p.profile_id,
            name: p.name,
            last_game_at: p.last_game_at,
        })
        .collect();

    info!(hits = hits.len(), "🔍 Player search finished");
    if events
        .send(OverlayEvent::SearchResultsReady(hits.clone()))
        .await
        .is_err()
    {
        warn!("🔍 ⚠️ No presentation listener for search results");
    }

    Ok(hits)
}
