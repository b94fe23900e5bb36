use anyhow::{bail, Context, Result};
use chrono::Utc;
use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::delivery::{spawn_delivery_worker, Deliver};
use crate::sensor::SignalSource;
use crate::settings::MonitorSettings;
use crate::stats::{MonitorStats, StatsSnapshot};
use crate::tracker::RunTracker;

use super::loop_worker::{monitor_loop, EdgeMonitor};

/// Owns the poll loop and the delivery worker for one sensor.
pub struct MonitorController {
    handle: Option<JoinHandle<()>>,
    delivery_handle: Option<JoinHandle<()>>,
    cancel_token: CancellationToken,
    stats: MonitorStats,
    /// How long shutdown waits for queued records before giving up on them.
    drain_timeout: Duration,
}

impl MonitorController {
    pub fn new() -> Self {
        Self {
            handle: None,
            delivery_handle: None,
            cancel_token: CancellationToken::new(),
            stats: MonitorStats::new(),
            drain_timeout: Duration::ZERO,
        }
    }

    /// Spawns the delivery worker and the poll loop. Must be called from
    /// within a tokio runtime.
    pub fn start(
        &mut self,
        settings: &MonitorSettings,
        sensor: Box<dyn SignalSource>,
        deliverer: Arc<dyn Deliver>,
    ) -> Result<()> {
        if self.handle.is_some() {
            bail!("monitor already active");
        }
        if self.cancel_token.is_cancelled() {
            bail!("monitor has been stopped");
        }
        settings.validate()?;

        let utc_offset = settings.utc_offset()?;

        let (queue, delivery_handle) = spawn_delivery_worker(
            deliverer,
            settings.delivery_queue_capacity,
            settings.delivery_timeout(),
            self.stats.clone(),
        );

        let monitor = EdgeMonitor::new(
            sensor,
            RunTracker::new(settings.wheel_circumference_m),
            settings.stall_timeout(),
            Utc::now().with_timezone(&utc_offset),
            queue,
            self.stats.clone(),
        );

        let handle = tokio::spawn(monitor_loop(
            monitor,
            settings.poll_interval(),
            utc_offset,
            self.cancel_token.clone(),
        ));

        self.handle = Some(handle);
        self.delivery_handle = Some(delivery_handle);
        self.drain_timeout = settings.delivery_timeout();
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some() && !self.cancel_token.is_cancelled()
    }

    /// Stops scheduling further ticks. Safe to call any number of times.
    pub fn stop(&self) {
        if self.cancel_token.is_cancelled() {
            return;
        }
        self.cancel_token.cancel();
        info!("Monitoring stopped.");
    }

    /// Stops the loop, then gives the delivery worker one delivery timeout to
    /// drain what was already queued. Anything still queued after that is
    /// abandoned and counted as dropped.
    pub async fn shutdown(&mut self) -> Result<StatsSnapshot> {
        self.stop();

        if let Some(handle) = self.handle.take() {
            handle.await.context("monitor loop task failed to join")?;
        }
        if let Some(mut handle) = self.delivery_handle.take() {
            match tokio::time::timeout(self.drain_timeout, &mut handle).await {
                Ok(joined) => joined.context("delivery worker task failed to join")?,
                Err(_) => {
                    handle.abort();
                    let _ = handle.await;
                    let abandoned = self.stats.deliveries_pending();
                    self.stats.record_deliveries_dropped(abandoned);
                    warn!(
                        "Delivery drain exceeded {:?}; dropped {} queued runs",
                        self.drain_timeout, abandoned
                    );
                }
            }
        }

        Ok(self.stats.snapshot())
    }
}

impl Default for MonitorController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MonitorError;
    use crate::models::RunRecord;
    use crate::sensor::SignalLevel;
    use async_trait::async_trait;
    use std::time::{Duration, Instant};

    /// Square wave: a falling edge every `period`.
    struct SquareWave {
        started: Instant,
        period: Duration,
    }

    impl SignalSource for SquareWave {
        fn read_signal(&mut self) -> Result<SignalLevel, MonitorError> {
            let phase = self.started.elapsed().as_secs_f64() / self.period.as_secs_f64();
            Ok(SignalLevel::from(phase.fract() < 0.5))
        }
    }

    struct AlwaysFails;

    #[async_trait]
    impl Deliver for AlwaysFails {
        async fn deliver(&self, _record: &RunRecord) -> Result<(), MonitorError> {
            Err(MonitorError::Delivery("connection refused".into()))
        }
    }

    struct Accepts;

    #[async_trait]
    impl Deliver for Accepts {
        async fn deliver(&self, _record: &RunRecord) -> Result<(), MonitorError> {
            Ok(())
        }
    }

    struct NeverAnswers;

    #[async_trait]
    impl Deliver for NeverAnswers {
        async fn deliver(&self, _record: &RunRecord) -> Result<(), MonitorError> {
            std::future::pending().await
        }
    }

    fn sensor(period_ms: u64) -> Box<dyn SignalSource> {
        Box::new(SquareWave {
            started: Instant::now(),
            period: Duration::from_millis(period_ms),
        })
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn completed_runs_reach_the_deliverer() {
        let mut controller = MonitorController::new();
        controller
            .start(&MonitorSettings::default(), sensor(40), Arc::new(Accepts))
            .unwrap();
        assert!(controller.is_running());

        tokio::time::sleep(Duration::from_millis(300)).await;
        let snapshot = controller.shutdown().await.unwrap();

        assert!(snapshot.runs_completed >= 2, "{snapshot:?}");
        assert_eq!(
            snapshot.deliveries_ok + snapshot.deliveries_failed + snapshot.deliveries_dropped,
            snapshot.runs_completed
        );
        assert!(!controller.is_running());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn delivery_failures_do_not_stop_polling() {
        let mut controller = MonitorController::new();
        controller
            .start(&MonitorSettings::default(), sensor(40), Arc::new(AlwaysFails))
            .unwrap();

        tokio::time::sleep(Duration::from_millis(300)).await;
        let snapshot = controller.shutdown().await.unwrap();

        assert!(snapshot.runs_completed >= 2, "{snapshot:?}");
        assert_eq!(snapshot.deliveries_ok, 0);
        assert!(snapshot.deliveries_failed >= 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn shutdown_does_not_wait_on_a_hung_collector() {
        let settings = MonitorSettings {
            delivery_timeout_ms: 200,
            ..Default::default()
        };
        let mut controller = MonitorController::new();
        controller
            .start(&settings, sensor(20), Arc::new(NeverAnswers))
            .unwrap();

        tokio::time::sleep(Duration::from_millis(400)).await;
        let begun = Instant::now();
        let snapshot = controller.shutdown().await.unwrap();
        let took = begun.elapsed();

        // Draining ~19 records one timeout at a time would take seconds.
        assert!(took < Duration::from_secs(1), "shutdown took {took:?}");
        assert!(snapshot.runs_completed >= 5, "{snapshot:?}");
        assert_eq!(snapshot.deliveries_ok, 0);
        assert!(snapshot.deliveries_dropped >= 1, "{snapshot:?}");
        assert_eq!(
            snapshot.deliveries_failed + snapshot.deliveries_dropped,
            snapshot.runs_completed
        );
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let mut controller = MonitorController::new();
        controller
            .start(&MonitorSettings::default(), sensor(40), Arc::new(Accepts))
            .unwrap();

        controller.stop();
        controller.stop();
        assert!(!controller.is_running());
        controller.shutdown().await.unwrap();
        controller.stop();
        controller.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn cannot_start_twice() {
        let mut controller = MonitorController::new();
        controller
            .start(&MonitorSettings::default(), sensor(40), Arc::new(Accepts))
            .unwrap();
        assert!(controller
            .start(&MonitorSettings::default(), sensor(40), Arc::new(Accepts))
            .is_err());
        controller.shutdown().await.unwrap();

        assert!(controller
            .start(&MonitorSettings::default(), sensor(40), Arc::new(Accepts))
            .is_err());
    }

    #[tokio::test]
    async fn invalid_settings_are_rejected() {
        let mut controller = MonitorController::new();
        let settings = MonitorSettings {
            poll_interval_ms: 0,
            ..Default::default()
        };
        assert!(controller
            .start(&settings, sensor(40), Arc::new(Accepts))
            .is_err());
        assert!(!controller.is_running());
    }
}
