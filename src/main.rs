use std::sync::Arc;
use std::time::Duration;

use aoe4mmr::api::client::{ReqwestTransport, RemoteClient, RetryPolicy};
use aoe4mmr::api::metrics::RequestMetrics;
use aoe4mmr::api::{Aoe4WorldClient, StatsApi};
use aoe4mmr::config::{Config, Settings};
use aoe4mmr::db::{self, Repository};
use aoe4mmr::diagnostics::DiagnosticLog;
use aoe4mmr::error::AppError;
use aoe4mmr::events::{self, EventRx, OverlayEvent};
use aoe4mmr::liveness::{SysinfoProbe, watch_process};
use aoe4mmr::logging;
use aoe4mmr::poller::{Driver, HotkeyHooks, Poller};
use tokio::sync::watch;
use tracing::{error, info, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const METRICS_EVERY: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), AppError> {
    logging::init();
    let config = Config::from_env()?;

    info!("🏰 Starting...");

    let repo = Repository::new(db::connect(&config.database_url).await?);

    let settings = match repo.load_settings().await {
        Ok(settings) => settings,
        Err(e) => {
            warn!(error = %e, "⚙️ ⚠️ Could not load settings, using defaults");
            Settings::default()
        }
    };
    info!(?settings, "⚙️ Settings loaded");

    let metrics = RequestMetrics::new();
    let remote = RemoteClient::new(
        Arc::new(ReqwestTransport::new(REQUEST_TIMEOUT)?),
        RetryPolicy {
            max_retries: config.request_max_retries,
            ..RetryPolicy::default()
        },
        config.api_rate_limit_per_second,
        metrics.clone(),
    );
    let api = Arc::new(Aoe4WorldClient::new(remote, config.api_base_url.clone()));
    tokio::spawn(metrics.log_loop(METRICS_EVERY));

    if let Some(account_id) = config.tracked_account_id {
        track_from_env(api.as_ref(), &repo, account_id).await?;
    }

    let (events_tx, events_rx) = events::channel(64);
    tokio::spawn(log_events(events_rx));

    let mut poller = Poller::new(
        api,
        repo,
        events_tx,
        DiagnosticLog::new(&config.diagnostic_log_path, config.diagnostic_log_max_lines),
        config.cycle_timeout,
    );
    if let Err(e) = poller.restore_last_match().await {
        warn!(error = %e, "🎮 ⚠️ Could not restore stored match");
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (liveness_tx, liveness_rx) = watch::channel(false);
    watch_process(
        SysinfoProbe::new(config.target_process.clone()),
        config.liveness_interval,
        liveness_tx,
        shutdown_rx.clone(),
    );

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("🛑 Received Ctrl+C, shutting down"),
            Err(e) => error!(error = %e, "🛑 ❌ Failed to listen for Ctrl+C, shutting down"),
        }
        let _ = shutdown_tx.send(true);
    });

    info!(process = %config.target_process, "🖥️ Waiting for the game");
    Driver::new(
        poller,
        Arc::new(HotkeyHooks::new(settings.hotkey)),
        liveness_rx,
        shutdown_rx,
        config.poll_interval,
        config.name_refresh_limit,
    )
    .run()
    .await;

    info!("🏰 Bye");
    Ok(())
}

/// Makes `account_id` the tracked account, named after its stats profile when reachable.
async fn track_from_env<A: StatsApi + ?Sized>(
    api: &A,
    repo: &Repository,
    account_id: i64,
) -> Result<(), AppError> {
    let name = match api.get_player(account_id).await {
        Ok(player) => player.name,
        Err(e) => {
            warn!(account_id, error = %e, "👤 ⚠️ Could not fetch player name");
            account_id.to_string()
        }
    };

    repo.track_account(account_id, &name).await?;
    info!(account_id, name = %name, "👤 Tracking account");
    Ok(())
}

/// Stand-in presentation layer: reports what would be rendered.
async fn log_events(mut rx: EventRx) {
    while let Some(event) = rx.recv().await {
        match event {
            OverlayEvent::MatchChanged(snapshot) => {
                info!(
                    match_id = %snapshot.match_id,
                    map = %snapshot.map_key,
                    category = %snapshot.category,
                    participants = snapshot.participant_count,
                    "🪟 Overlay updated"
                );
                for p in &snapshot.participants {
                    info!(
                        team = p.participant.team_index,
                        name = %p.participant.display_name,
                        civ = %p.participant.civilization,
                        rating = %p.rating_display(),
                        win_rate = %p.win_rate_display(),
                        "🪟"
                    );
                }
            }
            OverlayEvent::PlayerNamesRefreshed => info!("🪟 Account list refreshed"),
            OverlayEvent::SearchResultsReady(hits) => {
                info!(hits = hits.len(), "🪟 Search results ready")
            }
        }
    }
}
