use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::Deliver;
use crate::error::MonitorError;
use crate::models::RunRecord;

const CONNECT_TIMEOUT_SECS: u64 = 3;

/// POSTs each record as JSON to a fixed collector endpoint.
pub struct HttpDelivery {
    client: Client,
    endpoint: String,
}

impl HttpDelivery {
    pub fn new(endpoint: impl Into<String>, request_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS).min(request_timeout))
            .timeout(request_timeout)
            .user_agent(concat!("ham-counter/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl Deliver for HttpDelivery {
    async fn deliver(&self, record: &RunRecord) -> Result<(), MonitorError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(record)
            .send()
            .await
            .map_err(|err| MonitorError::Delivery(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MonitorError::Delivery(format!(
                "HTTP {} - {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown error")
            )));
        }
        Ok(())
    }
}
