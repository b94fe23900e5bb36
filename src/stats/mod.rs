mod types;

pub use types::StatsSnapshot;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct Counters {
    runs_started: AtomicU64,
    runs_completed: AtomicU64,
    runs_interrupted: AtomicU64,
    degenerate_runs: AtomicU64,
    sensor_failures: AtomicU64,
    deliveries_ok: AtomicU64,
    deliveries_failed: AtomicU64,
    deliveries_dropped: AtomicU64,
}

/// Process-lifetime counters shared by the poll loop and the delivery worker.
#[derive(Clone, Default)]
pub struct MonitorStats {
    inner: Arc<Counters>,
}

impl MonitorStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_run_started(&self) {
        self.inner.runs_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_run_completed(&self) {
        self.inner.runs_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_run_interrupted(&self) {
        self.inner.runs_interrupted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_degenerate_run(&self) {
        self.inner.degenerate_runs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sensor_failure(&self) {
        self.inner.sensor_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delivery_ok(&self) {
        self.inner.deliveries_ok.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delivery_failed(&self) {
        self.inner.deliveries_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delivery_dropped(&self) {
        self.record_deliveries_dropped(1);
    }

    pub fn record_deliveries_dropped(&self, count: u64) {
        self.inner.deliveries_dropped.fetch_add(count, Ordering::Relaxed);
    }

    /// Completed runs that have neither been delivered, failed, nor dropped yet.
    pub fn deliveries_pending(&self) -> u64 {
        let s = self.snapshot();
        s.runs_completed
            .saturating_sub(s.deliveries_ok + s.deliveries_failed + s.deliveries_dropped)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let c = &self.inner;
        StatsSnapshot {
            runs_started: c.runs_started.load(Ordering::Relaxed),
            runs_completed: c.runs_completed.load(Ordering::Relaxed),
            runs_interrupted: c.runs_interrupted.load(Ordering::Relaxed),
            degenerate_runs: c.degenerate_runs.load(Ordering::Relaxed),
            sensor_failures: c.sensor_failures.load(Ordering::Relaxed),
            deliveries_ok: c.deliveries_ok.load(Ordering::Relaxed),
            deliveries_failed: c.deliveries_failed.load(Ordering::Relaxed),
            deliveries_dropped: c.deliveries_dropped.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_counters() {
        let stats = MonitorStats::new();
        let other = stats.clone();
        stats.record_run_completed();
        other.record_run_completed();
        other.record_delivery_failed();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.runs_completed, 2);
        assert_eq!(snapshot.deliveries_failed, 1);
        assert_eq!(snapshot.runs_started, 0);
    }
}
