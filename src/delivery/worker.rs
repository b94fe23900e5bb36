use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use super::Deliver;
use crate::models::RunRecord;
use crate::stats::MonitorStats;

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// Non-blocking sender side of the delivery queue.
#[derive(Clone)]
pub struct DeliveryQueue {
    tx: mpsc::Sender<RunRecord>,
    stats: MonitorStats,
}

impl DeliveryQueue {
    /// Creates a queue of `capacity` records and hands back the receiving end.
    pub fn channel(capacity: usize, stats: MonitorStats) -> (Self, mpsc::Receiver<RunRecord>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx, stats }, rx)
    }

    /// Queues `record` for delivery. Never waits: a full or closed queue drops
    /// the record.
    pub fn submit(&self, record: RunRecord) {
        match self.tx.try_send(record) {
            Ok(()) => {}
            Err(TrySendError::Full(record)) => {
                self.stats.record_delivery_dropped();
                log_warn!("Delivery queue full; dropping run ending {}", record.to.to_rfc3339());
            }
            Err(TrySendError::Closed(record)) => {
                self.stats.record_delivery_dropped();
                log_warn!("Delivery worker gone; dropping run ending {}", record.to.to_rfc3339());
            }
        }
    }
}

/// Starts the worker that drains the queue through `deliverer`.
///
/// The worker exits once every `DeliveryQueue` clone has been dropped and the
/// records already queued have been attempted.
pub fn spawn_delivery_worker<D>(
    deliverer: Arc<D>,
    capacity: usize,
    attempt_timeout: Duration,
    stats: MonitorStats,
) -> (DeliveryQueue, JoinHandle<()>)
where
    D: Deliver + ?Sized + 'static,
{
    let (queue, mut rx) = DeliveryQueue::channel(capacity, stats.clone());

    let handle = tokio::spawn(async move {
        while let Some(record) = rx.recv().await {
            match tokio::time::timeout(attempt_timeout, deliverer.deliver(&record)).await {
                Ok(Ok(())) => {
                    stats.record_delivery_ok();
                    log_info!(
                        "Data sent successfully: from={} to={} seconds={:.3} speed={:.2}",
                        record.from.to_rfc3339(),
                        record.to.to_rfc3339(),
                        record.seconds,
                        record.speed
                    );
                }
                Ok(Err(err)) => {
                    stats.record_delivery_failed();
                    log_warn!("Failed to send data: {err}");
                }
                Err(_) => {
                    stats.record_delivery_failed();
                    log_warn!("Failed to send data: timed out after {:?}", attempt_timeout);
                }
            }
        }
        log_info!("delivery worker shutting down");
    });

    (queue, handle)
}
