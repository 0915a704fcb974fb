use tokio::sync::mpsc;

use crate::model::{MatchCategory, ResolvedParticipant};

pub type EventTx = mpsc::Sender<OverlayEvent>;
pub type EventRx = mpsc::Receiver<OverlayEvent>;

pub fn channel(capacity: usize) -> (EventTx, EventRx) {
    mpsc::channel(capacity)
}

/// Messages sent from the poller to the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayEvent {
    /// A new complete match was stored.
    MatchChanged(MatchSnapshot),
    /// Stored account display names were refreshed.
    PlayerNamesRefreshed,
    SearchResultsReady(Vec<PlayerSearchHit>),
}

/// Everything needed to render one match.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchSnapshot {
    pub map_key: String,
    pub match_id: String,
    pub participant_count: usize,
    pub participants: Vec<ResolvedParticipant>,
    pub category: MatchCategory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerSearchHit {
    pub account_id: i64,
    pub name: String,
    pub last_game_at: Option<String>,
}
