use sqlx::FromRow;

use crate::events::MatchSnapshot;
use crate::model::{MatchCategory, ParticipantRef, ResolvedParticipant};

#[derive(Debug, Clone, FromRow)]
pub struct TrackedAccount {
    pub id: i64,
    pub account_id: i64,
    pub display_name: String,
    pub is_active: bool,
    pub created_at: i64,
}

/// One participant of the stored match.
#[derive(Debug, Clone, FromRow)]
pub struct LastMatchRow {
    pub match_id: String,
    pub participant_name: String,
    pub win_rate: Option<f64>,
    pub civilization: String,
    pub map: String,
    pub account_id: i64,
    pub rating: Option<i64>,
    pub team_index: i64,
    pub category: String,
}

impl LastMatchRow {
    pub fn into_resolved(self) -> ResolvedParticipant {
        ResolvedParticipant {
            participant: ParticipantRef {
                display_name: self.participant_name,
                civilization: self.civilization,
                account_id: self.account_id,
                team_index: u32::try_from(self.team_index).unwrap_or_default(),
            },
            rating: self.rating,
            win_rate: self.win_rate,
        }
    }
}

/// Rebuilds a snapshot from rows of a single match, already sorted.
pub fn snapshot_from_rows(rows: Vec<LastMatchRow>) -> Option<MatchSnapshot> {
    let first = rows.first()?;
    let match_id = first.match_id.clone();
    let map_key = first.map.clone();
    let category = MatchCategory::from_kind(&first.category);

    let participants: Vec<ResolvedParticipant> =
        rows.into_iter().map(LastMatchRow::into_resolved).collect();
    let participant_count = category
        .expected_participants()
        .unwrap_or(participants.len());

    Some(MatchSnapshot {
        map_key,
        match_id,
        participant_count,
        participants,
        category,
    })
}
