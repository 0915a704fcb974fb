use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info};

use super::cycle::Poller;
use super::names::spawn_name_refresh;
use crate::api::StatsApi;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// Game not running, nothing is polled.
    Idle,
    Polling,
    /// Terminal.
    Stopping,
}

/// Resources held only while the game is running.
pub trait SessionHooks: Send + Sync {
    fn acquire(&self);
    fn release(&self);
}

/// Keeps the session resources acquired until dropped.
pub struct SessionGuard {
    hooks: Arc<dyn SessionHooks>,
}

impl SessionGuard {
    pub fn acquire(hooks: Arc<dyn SessionHooks>) -> Self {
        hooks.acquire();
        Self { hooks }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.hooks.release();
    }
}

/// Binds the overlay toggle hotkey for the duration of a game session.
#[derive(Debug, Clone)]
pub struct HotkeyHooks {
    hotkey: String,
}

impl HotkeyHooks {
    pub fn new(hotkey: impl Into<String>) -> Self {
        Self {
            hotkey: hotkey.into(),
        }
    }
}

impl SessionHooks for HotkeyHooks {
    fn acquire(&self) {
        info!(hotkey = %self.hotkey, "⌨️ Overlay hotkey bound");
    }

    fn release(&self) {
        info!(hotkey = %self.hotkey, "⌨️ Overlay hotkey released");
    }
}

/// Runs fetch cycles while the game process is alive.
pub struct Driver<A: StatsApi + ?Sized + 'static> {
    poller: Poller<A>,
    hooks: Arc<dyn SessionHooks>,
    liveness: watch::Receiver<bool>,
    shutdown: watch::Receiver<bool>,
    poll_interval: Duration,
    name_refresh_limit: u32,
    state: watch::Sender<DriverState>,
}

impl<A: StatsApi + ?Sized + 'static> Driver<A> {
    pub fn new(
        poller: Poller<A>,
        hooks: Arc<dyn SessionHooks>,
        liveness: watch::Receiver<bool>,
        shutdown: watch::Receiver<bool>,
        poll_interval: Duration,
        name_refresh_limit: u32,
    ) -> Self {
        let (state, _) = watch::channel(DriverState::Idle);
        Self {
            poller,
            hooks,
            liveness,
            shutdown,
            poll_interval,
            name_refresh_limit,
            state,
        }
    }

    pub fn subscribe_state(&self) -> watch::Receiver<DriverState> {
        self.state.subscribe()
    }

    /// Drives the state machine until shutdown, then hands the poller back.
    pub async fn run(mut self) -> Poller<A> {
        let mut state = DriverState::Idle;
        info!(interval = ?self.poll_interval, "🔄 Poll driver started");

        loop {
            self.state.send_replace(state);
            state = match state {
                DriverState::Idle => self.wait_for_game().await,
                DriverState::Polling => self.run_polling().await,
                DriverState::Stopping => break,
            };
            debug!(?state, "🔄 Driver state changed");
        }

        info!("🔄 Poll driver stopped");
        self.poller
    }

    async fn wait_for_game(&mut self) -> DriverState {
        if *self.liveness.borrow_and_update() {
            return DriverState::Polling;
        }

        loop {
            tokio::select! {
                biased;
                _ = wait_shutdown(&mut self.shutdown) => return DriverState::Stopping,
                alive = next_liveness(&mut self.liveness) => match alive {
                    None => return DriverState::Stopping,
                    Some(true) => return DriverState::Polling,
                    Some(false) => {}
                },
            }
        }
    }

    async fn run_polling(&mut self) -> DriverState {
        let _session = SessionGuard::acquire(self.hooks.clone());
        info!("🎮 Game running, polling started");

        spawn_name_refresh(
            self.poller.api().clone(),
            self.poller.repo().clone(),
            self.poller.events().clone(),
            self.name_refresh_limit,
        );

        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = wait_shutdown(&mut self.shutdown) => return DriverState::Stopping,
                alive = next_liveness(&mut self.liveness) => return session_ended(alive),
                _ = ticker.tick() => {
                    tokio::select! {
                        biased;
                        _ = wait_shutdown(&mut self.shutdown) => return DriverState::Stopping,
                        alive = next_liveness(&mut self.liveness) => return session_ended(alive),
                        // Failures are already logged by the poller; the next tick retries.
                        _ = self.poller.run_cycle() => {}
                    }
                }
            }
        }
    }
}

/// State to enter after a liveness change observed while polling.
///
/// The publisher only sends flips, so a change that still reads `true` means
/// the game exited and restarted in between: the session starts over.
fn session_ended(alive: Option<bool>) -> DriverState {
    match alive {
        None => DriverState::Stopping,
        Some(false) => {
            info!("🎮 Game closed, polling suspended");
            DriverState::Idle
        }
        Some(true) => {
            info!("🎮 Game restarted, starting a new session");
            DriverState::Polling
        }
    }
}

/// Resolves once shutdown is requested or its sender is gone.
async fn wait_shutdown(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            return;
        }
    }
}

/// Next liveness value, `None` once the publisher is gone.
async fn next_liveness(rx: &mut watch::Receiver<bool>) -> Option<bool> {
    rx.changed().await.ok()?;
    Some(*rx.borrow_and_update())
}
