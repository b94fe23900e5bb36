//! Best-effort hand-off of finished runs to the collector.
//!
//! The poll loop only ever calls [`DeliveryQueue::submit`], which never
//! blocks. A worker task drains the queue and talks to the network, so a slow
//! collector cannot hold up edge detection.

mod http;
mod worker;

pub use http::HttpDelivery;
pub use worker::{spawn_delivery_worker, DeliveryQueue};

use async_trait::async_trait;

use crate::error::MonitorError;
use crate::models::RunRecord;

#[async_trait]
pub trait Deliver: Send + Sync {
    async fn deliver(&self, record: &RunRecord) -> Result<(), MonitorError>;
}
