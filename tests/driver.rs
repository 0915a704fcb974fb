use std::num::NonZeroU32;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use aoe4mmr::api::Aoe4WorldClient;
use aoe4mmr::api::client::{ReqwestTransport, RemoteClient, RetryPolicy};
use aoe4mmr::api::metrics::RequestMetrics;
use aoe4mmr::db::{Repository, connect_in_memory};
use aoe4mmr::diagnostics::DiagnosticLog;
use aoe4mmr::events::{self, EventRx, MatchSnapshot, OverlayEvent};
use aoe4mmr::poller::{Driver, DriverState, Poller, SessionHooks};
use httpmock::{Method::GET, MockServer};
use serde_json::json;
use tokio::sync::watch;

#[derive(Default)]
struct Session {
    acquired: AtomicUsize,
    released: AtomicUsize,
}

impl SessionHooks for Session {
    fn acquire(&self) {
        self.acquired.fetch_add(1, Ordering::SeqCst);
    }

    fn release(&self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

async fn mock_team_game(server: &MockServer) {
    server
        .mock_async(|when, then| {
            when.method(GET).path("/players/12345/games/last");
            then.status(200).json_body(json!({
                "game_id": 188001,
                "map": "Mountain Pass",
                "kind": "rm_2v2",
                "teams": [
                    [
                        {"profile_id": 12345, "name": "Tracked", "civilization": "english"},
                        {"profile_id": 2, "name": "Mate", "civilization": "mongols"}
                    ],
                    [
                        {"profile_id": 3, "name": "Newcomer", "civilization": "rus"},
                        {"profile_id": 4, "name": "Veteran", "civilization": "french"}
                    ]
                ]
            }));
        })
        .await;

    for (id, rating, win_rate) in [(12345, 1620, 57.1), (2, 1540, 50.9), (4, 1710, 61.0)] {
        server
            .mock_async(move |when, then| {
                when.method(GET)
                    .path("/leaderboards/rm_team")
                    .query_param("profile_id", id.to_string());
                then.status(200).json_body(json!({
                    "players": [{"rating": rating, "win_rate": win_rate}]
                }));
            })
            .await;
    }
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/leaderboards/rm_team")
                .query_param("profile_id", "3");
            then.status(200).json_body(json!({"players": []}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/players/12345");
            then.status(200)
                .json_body(json!({"profile_id": 12345, "name": "Tracked Renamed"}));
        })
        .await;
}

async fn next_match(events: &mut EventRx) -> MatchSnapshot {
    loop {
        let event = tokio::time::timeout(Duration::from_secs(10), events.recv())
            .await
            .expect("no overlay event")
            .expect("event channel closed");
        if let OverlayEvent::MatchChanged(snapshot) = event {
            return snapshot;
        }
    }
}

#[tokio::test]
async fn team_game_is_stored_while_game_runs() {
    let server = MockServer::start_async().await;
    mock_team_game(&server).await;

    let remote = RemoteClient::new(
        Arc::new(ReqwestTransport::new(Duration::from_secs(5)).unwrap()),
        RetryPolicy::immediate(1),
        NonZeroU32::new(1_000).unwrap(),
        RequestMetrics::new(),
    );
    let api = Arc::new(Aoe4WorldClient::new(remote, server.base_url()));

    let repo = Repository::new(connect_in_memory().await.unwrap());
    repo.track_account(12345, "Tracked").await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let (events_tx, mut events_rx) = events::channel(16);
    let poller = Poller::new(
        api,
        repo.clone(),
        events_tx,
        DiagnosticLog::new(dir.path().join("data.log"), 1000),
        Duration::from_secs(10),
    );

    let session = Arc::new(Session::default());
    let (liveness_tx, liveness_rx) = watch::channel(false);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let driver = Driver::new(
        poller,
        session.clone(),
        liveness_rx,
        shutdown_rx,
        Duration::from_millis(50),
        6,
    );
    let mut state = driver.subscribe_state();
    let handle = tokio::spawn(driver.run());

    liveness_tx.send(true).unwrap();
    let snapshot = next_match(&mut events_rx).await;

    assert_eq!(snapshot.match_id, "188001");
    assert_eq!(snapshot.map_key, "Mountain Pass");
    assert_eq!(snapshot.participant_count, 4);
    let newcomer = &snapshot.participants[2];
    assert_eq!(newcomer.participant.display_name, "Newcomer");
    assert_eq!(newcomer.rating_display(), "--");
    assert_eq!(newcomer.win_rate_display(), "--");
    assert_eq!(snapshot.participants[3].rating, Some(1710));

    let stored = repo.load_last_match().await.unwrap().unwrap();
    assert_eq!(stored.match_id, "188001");
    assert_eq!(stored.participants.len(), 4);

    liveness_tx.send(false).unwrap();
    tokio::time::timeout(
        Duration::from_secs(5),
        state.wait_for(|s| *s == DriverState::Idle),
    )
    .await
    .expect("driver never went idle")
    .unwrap();
    assert_eq!(session.acquired.load(Ordering::SeqCst), 1);
    assert_eq!(session.released.load(Ordering::SeqCst), 1);

    shutdown_tx.send(true).unwrap();
    let poller = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("driver did not stop")
        .unwrap();
    assert_eq!(poller.last_seen_match_id(), Some("188001"));
    assert_eq!(*state.borrow(), DriverState::Stopping);
}
