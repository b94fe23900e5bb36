use chrono::{DateTime, FixedOffset};
use log::info;

use crate::error::MonitorError;
use crate::models::{speed_kmh, RunRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Idle,
    InProgress,
}

impl Default for RunStatus {
    fn default() -> Self {
        RunStatus::Idle
    }
}

/// The single run slot. `start_time` is `Some` exactly when the status is
/// `InProgress`.
#[derive(Debug, Clone)]
pub struct RunTracker {
    wheel_circumference_m: f64,
    status: RunStatus,
    start_time: Option<DateTime<FixedOffset>>,
}

impl RunTracker {
    pub fn new(wheel_circumference_m: f64) -> Self {
        Self {
            wheel_circumference_m,
            status: RunStatus::Idle,
            start_time: None,
        }
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == RunStatus::InProgress
    }

    pub fn start_time(&self) -> Option<DateTime<FixedOffset>> {
        self.start_time
    }

    /// Begins a run at `now`, silently replacing whatever was in the slot.
    pub fn start_run(&mut self, now: DateTime<FixedOffset>) {
        self.start_time = Some(now);
        self.status = RunStatus::InProgress;
        info!("Run started at: {}", now.to_rfc3339());
    }

    /// Finishes the active run and returns its record.
    ///
    /// The slot is cleared even when the duration turns out to be degenerate,
    /// so a bad run is consumed rather than carried into the next one.
    pub fn end_run(&mut self, now: DateTime<FixedOffset>) -> Result<RunRecord, MonitorError> {
        let start_time = match (self.status, self.start_time) {
            (RunStatus::InProgress, Some(start_time)) => start_time,
            _ => return Err(MonitorError::RunNotActive),
        };

        self.status = RunStatus::Idle;
        self.start_time = None;

        let seconds = elapsed_secs(start_time, now);
        if seconds <= 0.0 {
            return Err(MonitorError::DegenerateRunDuration { seconds });
        }

        let speed = speed_kmh(self.wheel_circumference_m, seconds);
        info!(
            "Run ended at: {}, Duration: {:.2}s, Speed: {:.2} km/h",
            now.to_rfc3339(),
            seconds,
            speed
        );

        Ok(RunRecord {
            from: start_time,
            to: now,
            seconds,
            speed,
        })
    }

    /// Drops the active run without producing a record. No-op when idle.
    pub fn reset_run(&mut self) {
        if self.status == RunStatus::Idle {
            return;
        }
        info!("Run interrupted. Resetting state.");
        self.status = RunStatus::Idle;
        self.start_time = None;
    }
}

fn elapsed_secs(from: DateTime<FixedOffset>, to: DateTime<FixedOffset>) -> f64 {
    let delta = to - from;
    match delta.num_nanoseconds() {
        Some(nanos) => nanos as f64 / 1_000_000_000.0,
        // Beyond ~292 years; fall back to millisecond precision.
        None => delta.num_milliseconds() as f64 / 1000.0,
    }
}
