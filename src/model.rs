//! Match data as understood by the poller, independent of the API wire format.

use std::fmt;

use crate::api::types::{LastGameDto, LeaderboardEntryDto};

/// Players per side for team game modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TeamSize {
    Two,
    Three,
    Four,
}

impl TeamSize {
    pub fn players(self) -> usize {
        match self {
            Self::Two => 2,
            Self::Three => 3,
            Self::Four => 4,
        }
    }
}

/// Game mode of a match, parsed from the API `kind` field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MatchCategory {
    RankedSolo,
    RankedTeam(TeamSize),
    QuickSolo,
    QuickTeam(TeamSize),
    /// Free-for-all quick match; keeps the exact kind (`qm_ffa_nomad`, ...).
    QuickFfa(String),
    Other(String),
}

impl MatchCategory {
    pub fn from_kind(kind: &str) -> Self {
        match kind {
            "rm_1v1" => Self::RankedSolo,
            "rm_2v2" => Self::RankedTeam(TeamSize::Two),
            "rm_3v3" => Self::RankedTeam(TeamSize::Three),
            "rm_4v4" => Self::RankedTeam(TeamSize::Four),
            "qm_1v1" => Self::QuickSolo,
            "qm_2v2" => Self::QuickTeam(TeamSize::Two),
            "qm_3v3" => Self::QuickTeam(TeamSize::Three),
            "qm_4v4" => Self::QuickTeam(TeamSize::Four),
            ffa if ffa.starts_with("qm_ffa") => Self::QuickFfa(ffa.to_string()),
            other => Self::Other(other.to_string()),
        }
    }

    /// The API `kind` string this category was parsed from.
    pub fn kind(&self) -> &str {
        match self {
            Self::RankedSolo => "rm_1v1",
            Self::RankedTeam(TeamSize::Two) => "rm_2v2",
            Self::RankedTeam(TeamSize::Three) => "rm_3v3",
            Self::RankedTeam(TeamSize::Four) => "rm_4v4",
            Self::QuickSolo => "qm_1v1",
            Self::QuickTeam(TeamSize::Two) => "qm_2v2",
            Self::QuickTeam(TeamSize::Three) => "qm_3v3",
            Self::QuickTeam(TeamSize::Four) => "qm_4v4",
            Self::QuickFfa(kind) | Self::Other(kind) => kind,
        }
    }

    /// Leaderboard holding the ratings relevant to this category.
    ///
    /// Ranked team sizes share one board, FFA variants share one board, every
    /// other category has a board named after its own kind.
    pub fn leaderboard(&self) -> &str {
        match self {
            Self::RankedSolo => "rm_solo",
            Self::RankedTeam(_) => "rm_team",
            Self::QuickFfa(_) => "qm_ffa",
            other => other.kind(),
        }
    }

    /// Roster size a complete match of this category has, if fixed.
    pub fn expected_participants(&self) -> Option<usize> {
        match self {
            Self::RankedSolo | Self::QuickSolo => Some(2),
            Self::RankedTeam(size) | Self::QuickTeam(size) => Some(size.players() * 2),
            Self::QuickFfa(_) | Self::Other(_) => None,
        }
    }
}

impl fmt::Display for MatchCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}

/// A match participant as reported by the last-game endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantRef {
    pub display_name: String,
    pub civilization: String,
    pub account_id: i64,
    /// 1-based position of the participant's team in the match.
    pub team_index: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchSummary {
    pub match_id: String,
    pub map_key: String,
    pub category: MatchCategory,
    pub teams: Vec<Vec<ParticipantRef>>,
}

impl MatchSummary {
    pub fn from_dto(dto: LastGameDto) -> Self {
        let category = MatchCategory::from_kind(&dto.kind);
        let teams = dto
            .teams
            .into_iter()
            .enumerate()
            .map(|(idx, members)| {
                members
                    .into_iter()
                    .map(|m| ParticipantRef {
                        display_name: m.name,
                        civilization: m.civilization,
                        account_id: m.profile_id,
                        team_index: idx as u32 + 1,
                    })
                    .collect()
            })
            .collect();

        Self {
            match_id: dto.game_id.to_string(),
            map_key: dto.map,
            category,
            teams,
        }
    }

    /// Participants in team order, then slot order within each team.
    pub fn participants(&self) -> impl Iterator<Item = &ParticipantRef> {
        self.teams.iter().flatten()
    }

    pub fn participant_count(&self) -> usize {
        self.category
            .expected_participants()
            .unwrap_or_else(|| self.participants().count())
    }
}

/// A participant with the rating data of the match's leaderboard.
///
/// `None` rating and win rate mean the participant is unrated on that board.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedParticipant {
    pub participant: ParticipantRef,
    pub rating: Option<i64>,
    pub win_rate: Option<f64>,
}

impl ResolvedParticipant {
    pub const UNRATED: &'static str = "--";

    pub fn new(participant: ParticipantRef, entry: Option<LeaderboardEntryDto>) -> Self {
        Self {
            participant,
            rating: entry.as_ref().map(|e| e.rating),
            win_rate: entry.map(|e| e.win_rate),
        }
    }

    pub fn is_rated(&self) -> bool {
        self.rating.is_some()
    }

    pub fn rating_display(&self) -> String {
        self.rating
            .map(|r| r.to_string())
            .unwrap_or_else(|| Self::UNRATED.to_string())
    }

    pub fn win_rate_display(&self) -> String {
        self.win_rate
            .map(|w| format!("{w:.1}%"))
            .unwrap_or_else(|| Self::UNRATED.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{GameIdDto, TeamMemberDto};

    fn member(id: i64, name: &str) -> TeamMemberDto {
        TeamMemberDto {
            profile_id: id,
            name: name.to_string(),
            civilization: "mongols".to_string(),
        }
    }

    #[test]
    fn category_round_trips_known_kinds() {
        for kind in [
            "rm_1v1", "rm_2v2", "rm_3v3", "rm_4v4", "qm_1v1", "qm_2v2", "qm_3v3", "qm_4v4",
            "qm_ffa_nomad", "custom",
        ] {
            assert_eq!(MatchCategory::from_kind(kind).kind(), kind);
        }
    }

    #[test]
    fn leaderboard_mapping() {
        assert_eq!(MatchCategory::from_kind("rm_1v1").leaderboard(), "rm_solo");
        assert_eq!(MatchCategory::from_kind("rm_2v2").leaderboard(), "rm_team");
        assert_eq!(MatchCategory::from_kind("rm_4v4").leaderboard(), "rm_team");
        assert_eq!(MatchCategory::from_kind("qm_ffa_nomad").leaderboard(), "qm_ffa");
        assert_eq!(MatchCategory::from_kind("qm_3v3").leaderboard(), "qm_3v3");
        assert_eq!(MatchCategory::from_kind("qm_ew_1v1").leaderboard(), "qm_ew_1v1");
    }

    #[test]
    fn expected_participants_by_category() {
        assert_eq!(MatchCategory::RankedSolo.expected_participants(), Some(2));
        assert_eq!(
            MatchCategory::QuickTeam(TeamSize::Three).expected_participants(),
            Some(6)
        );
        assert_eq!(
            MatchCategory::RankedTeam(TeamSize::Four).expected_participants(),
            Some(8)
        );
        assert_eq!(
            MatchCategory::from_kind("qm_ffa_nomad").expected_participants(),
            None
        );
    }

    #[test]
    fn summary_numbers_teams_from_one() {
        let summary = MatchSummary::from_dto(LastGameDto {
            game_id: GameIdDto::Number(42),
            map: "Lipany".into(),
            kind: "rm_2v2".into(),
            teams: vec![
                vec![member(1, "a"), member(2, "b")],
                vec![member(3, "c"), member(4, "d")],
            ],
        });

        let order: Vec<(i64, u32)> = summary
            .participants()
            .map(|p| (p.account_id, p.team_index))
            .collect();

        assert_eq!(summary.match_id, "42");
        assert_eq!(order, vec![(1, 1), (2, 1), (3, 2), (4, 2)]);
        assert_eq!(summary.participant_count(), 4);
    }

    #[test]
    fn unrated_displays_sentinel() {
        let p = ResolvedParticipant::new(
            ParticipantRef {
                display_name: "x".into(),
                civilization: "rus".into(),
                account_id: 9,
                team_index: 1,
            },
            None,
        );

        assert!(!p.is_rated());
        assert_eq!(p.rating_display(), "--");
        assert_eq!(p.win_rate_display(), "--");
    }
}
