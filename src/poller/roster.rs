use tracing::{debug, instrument};

use super::error::CycleError;
use crate::api::StatsApi;
use crate::model::{MatchSummary, ResolvedParticipant};

/// Looks up every participant's rating on the match's leaderboard.
///
/// Lookups run one after another in team order. A participant missing from
/// the leaderboard is kept as unrated; a failed lookup fails the whole roster.
#[instrument(skip_all, fields(match_id = %summary.match_id, leaderboard = summary.category.leaderboard()))]
pub async fn resolve_roster<A>(
    api: &A,
    summary: &MatchSummary,
) -> Result<Vec<ResolvedParticipant>, CycleError>
where
    A: StatsApi + ?Sized,
{
    let leaderboard = summary.category.leaderboard();
    let mut roster = Vec::with_capacity(summary.participant_count());

    for participant in summary.participants() {
        let entry = api
            .get_leaderboard_entry(leaderboard, participant.account_id)
            .await?;

        if entry.is_none() {
            debug!(
                account_id = participant.account_id,
                name = %participant.display_name,
                "🔄 Participant unrated on leaderboard"
            );
        }

        roster.push(ResolvedParticipant::new(participant.clone(), entry));
    }

    Ok(roster)
}
