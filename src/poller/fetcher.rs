use tracing::{debug, instrument};

use super::error::CycleError;
use crate::api::StatsApi;
use crate::model::MatchSummary;

/// Latest match of `account_id`, as reported by the stats API.
#[instrument(skip(api), level = "debug")]
pub async fn fetch_latest_match<A>(api: &A, account_id: i64) -> Result<MatchSummary, CycleError>
where
    A: StatsApi + ?Sized,
{
    let dto = api.get_last_game(account_id).await?;

    if dto.teams.iter().all(|team| team.is_empty()) {
        return Err(CycleError::Parse(format!(
            "match {} has no participants",
            dto.game_id
        )));
    }

    let summary = MatchSummary::from_dto(dto);
    debug!(
        match_id = %summary.match_id,
        category = %summary.category,
        map = %summary.map_key,
        "🔄 Latest match fetched"
    );

    Ok(summary)
}

/// Whether `summary` differs from the last match processed.
pub fn is_new(summary: &MatchSummary, last_seen: Option<&str>) -> bool {
    last_seen != Some(summary.match_id.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::LastGameDto;
    use crate::poller::testing::{MockApi, game};

    #[tokio::test]
    async fn converts_last_game() {
        let api = MockApi::new(game("555", "rm_1v1", &[&[(1, "me")], &[(2, "you")]]));

        let summary = fetch_latest_match(&api, 1).await.unwrap();

        assert_eq!(summary.match_id, "555");
        assert_eq!(summary.participants().count(), 2);
    }

    #[tokio::test]
    async fn empty_teams_are_malformed() {
        let api = MockApi::new(LastGameDto {
            teams: vec![vec![], vec![]],
            ..game("556", "rm_1v1", &[])
        });

        let res = fetch_latest_match(&api, 1).await;

        assert!(matches!(res, Err(CycleError::Parse(_))));
    }

    #[test]
    fn novelty_against_cursor() {
        let summary = MatchSummary::from_dto(game("9", "qm_2v2", &[&[(1, "a")]]));

        assert!(is_new(&summary, None));
        assert!(is_new(&summary, Some("8")));
        assert!(!is_new(&summary, Some("9")));
    }
}
