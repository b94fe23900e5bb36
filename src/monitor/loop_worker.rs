use chrono::{DateTime, FixedOffset, TimeDelta, Utc};
use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::delivery::DeliveryQueue;
use crate::error::MonitorError;
use crate::models::RunRecord;
use crate::sensor::SignalSource;
use crate::stats::MonitorStats;
use crate::tracker::RunTracker;

use super::edge::MonitorState;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

/// What a single tick did to the run slot.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    NoChange,
    /// First edge after idle; nothing to report yet.
    RunStarted,
    /// Edge closed the previous run (queued for delivery) and opened a new one.
    RunCompleted(RunRecord),
    /// Edge closed a run whose duration was not positive; it was not queued.
    DegenerateRun,
    /// No edge within the stall timeout; the run was discarded.
    RunStalled,
    SensorFailed,
}

/// Drives the run tracker from sensor samples.
pub struct EdgeMonitor {
    sensor: Box<dyn SignalSource>,
    tracker: RunTracker,
    state: MonitorState,
    stall_timeout: TimeDelta,
    outbox: DeliveryQueue,
    stats: MonitorStats,
}

impl EdgeMonitor {
    pub fn new(
        sensor: Box<dyn SignalSource>,
        tracker: RunTracker,
        stall_timeout: Duration,
        started_at: DateTime<FixedOffset>,
        outbox: DeliveryQueue,
        stats: MonitorStats,
    ) -> Self {
        let stall_timeout = TimeDelta::from_std(stall_timeout).unwrap_or(TimeDelta::MAX);
        Self {
            sensor,
            tracker,
            state: MonitorState::new(started_at),
            stall_timeout,
            outbox,
            stats,
        }
    }

    pub fn tracker(&self) -> &RunTracker {
        &self.tracker
    }

    pub fn state(&self) -> &MonitorState {
        &self.state
    }

    /// Samples the sensor once and applies the result at `now`.
    ///
    /// The edge check always runs before the stall check. An edge refreshes
    /// `last_edge_time`, so a run opened in this tick can never be discarded
    /// by the stall check of the same tick.
    pub fn poll_tick(&mut self, now: DateTime<FixedOffset>) -> TickOutcome {
        let current = match self.sensor.read_signal() {
            Ok(level) => level,
            Err(err) => {
                self.stats.record_sensor_failure();
                self.state.forget_sample();
                log_error!("skipping tick: {err}");
                return TickOutcome::SensorFailed;
            }
        };

        let mut outcome = TickOutcome::NoChange;

        if self.state.is_falling_edge(current) {
            outcome = self.on_falling_edge(now);
        }

        if self.tracker.is_active() && now - self.state.last_edge_time() > self.stall_timeout {
            self.tracker.reset_run();
            self.stats.record_run_interrupted();
            outcome = TickOutcome::RunStalled;
        }

        self.state.commit_sample(current);
        outcome
    }

    fn on_falling_edge(&mut self, now: DateTime<FixedOffset>) -> TickOutcome {
        let outcome = if self.tracker.is_active() {
            match self.tracker.end_run(now) {
                Ok(record) => {
                    self.stats.record_run_completed();
                    self.outbox.submit(record.clone());
                    TickOutcome::RunCompleted(record)
                }
                Err(MonitorError::DegenerateRunDuration { seconds }) => {
                    self.stats.record_degenerate_run();
                    log_warn!("rejecting run with non-positive duration {seconds}s");
                    TickOutcome::DegenerateRun
                }
                Err(err) => {
                    log_error!("failed to finish run: {err}");
                    TickOutcome::RunStarted
                }
            }
        } else {
            TickOutcome::RunStarted
        };

        self.tracker.start_run(now);
        self.stats.record_run_started();
        self.state.mark_edge(now);
        outcome
    }
}

/// Polls `monitor` every `poll_interval` until `cancel_token` fires. A tick
/// that has already begun always runs to completion.
pub async fn monitor_loop(
    mut monitor: EdgeMonitor,
    poll_interval: Duration,
    utc_offset: FixedOffset,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    log_info!("Monitoring sensor every {:?}", poll_interval);

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                log_info!("monitor loop shutting down");
                break;
            }
            _ = ticker.tick() => {
                let now = Utc::now().with_timezone(&utc_offset);
                monitor.poll_tick(now);
            }
        }
    }
}
