use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tracing::{Instrument, info_span};

/// Simple counter used to log the amount of stats API requests performed.
#[derive(Debug)]
pub struct RequestMetrics {
    start: Instant,
    count: AtomicU64,
    failures: AtomicU64,
}

impl RequestMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            start: Instant::now(),
            count: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        })
    }

    pub fn inc(&self) {
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts an attempt that failed at the transport level.
    pub fn inc_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn total(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Logs totals every `every`, skipping the immediate first tick.
    pub async fn log_loop(self: Arc<Self>, every: Duration) {
        let mut ticker = tokio::time::interval(every);
        ticker.tick().await;

        loop {
            ticker.tick().await;
            self.log_totals()
                .instrument(info_span!("📊 ", api = "aoe4world"))
                .await;
        }
    }

    async fn log_totals(&self) {
        let total = self.total();
        let failures = self.failures();
        let minutes = self.start.elapsed().as_secs_f64() / 60.0;
        let per_minute = if minutes > 0.0 { total as f64 / minutes } else { 0.0 };

        tracing::info!(
            total,
            failures,
            "{total} stats requests so far ({per_minute:.2}/min, {failures} failed)"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_are_independent() {
        let metrics = RequestMetrics::new();
        metrics.inc();
        metrics.inc();
        metrics.inc_failure();

        assert_eq!(metrics.total(), 2);
        assert_eq!(metrics.failures(), 1);
    }

    #[tokio::test]
    async fn log_loop_runs_once() {
        tokio::time::pause();

        let metrics = RequestMetrics::new();
        let cloned = metrics.clone();
        let handle = tokio::spawn(async move { cloned.log_loop(Duration::from_secs(60)).await });

        tokio::time::advance(Duration::from_secs(61)).await;
        handle.abort();
        let _ = handle.await;
    }
}
