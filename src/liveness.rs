//! Watches whether the game client process is running.

use std::ffi::OsStr;
use std::time::Duration;

use sysinfo::{ProcessesToUpdate, System};
use tokio::sync::watch;
use tracing::{debug, error, info};

/// Answers whether the target process is currently running.
pub trait ProcessProbe: Send + 'static {
    fn is_target_process_running(&mut self) -> bool;
}

/// Probe backed by the OS process table.
pub struct SysinfoProbe {
    system: System,
    process_name: String,
}

impl SysinfoProbe {
    pub fn new(process_name: impl Into<String>) -> Self {
        Self {
            system: System::new(),
            process_name: process_name.into(),
        }
    }
}

impl ProcessProbe for SysinfoProbe {
    fn is_target_process_running(&mut self) -> bool {
        self.system.refresh_processes(ProcessesToUpdate::All, true);
        self.system
            .processes_by_exact_name(OsStr::new(&self.process_name))
            .next()
            .is_some()
    }
}

/// Publishes the probe result every `every` until shutdown or until nobody listens.
///
/// Subscribers only wake when the value flips.
pub fn watch_process<P: ProcessProbe>(
    mut probe: P,
    every: Duration,
    liveness: watch::Sender<bool>,
    mut shutdown: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(every);
        timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = timer.tick() => {
                    // The process table scan blocks, keep it off the runtime workers.
                    let scan = tokio::task::spawn_blocking(move || {
                        let running = probe.is_target_process_running();
                        (probe, running)
                    });
                    let running = match scan.await {
                        Ok((returned, running)) => {
                            probe = returned;
                            running
                        }
                        Err(e) => {
                            error!(error = %e, "🖥️ ❌ Process scan failed, liveness watcher stopped");
                            return;
                        }
                    };
                    let flipped = liveness.send_if_modified(|current| {
                        let changed = *current != running;
                        *current = running;
                        changed
                    });
                    if flipped {
                        info!(running, "🖥️ Game process state changed");
                    }
                    if liveness.is_closed() {
                        debug!("🖥️ No liveness subscribers left");
                        return;
                    }
                }
                _ = shutdown.changed() => {
                    debug!("🖥️ Liveness watcher shutting down");
                    return;
                }
            }
        }
    })
}
