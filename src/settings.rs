use anyhow::{anyhow, bail, Context, Result};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, time::Duration};

pub const ENDPOINT_ENV: &str = "HAM_COUNTER_ENDPOINT";

/// Startup tunables. Every key is optional in the file; missing keys take the
/// defaults below.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MonitorSettings {
    /// Wheel circumference in metres.
    pub wheel_circumference_m: f64,
    pub stall_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub endpoint: String,
    /// Fixed offset from UTC applied to record timestamps. Not DST-aware.
    pub utc_offset_secs: i32,
    pub gpio_pin: u8,
    pub delivery_timeout_ms: u64,
    pub delivery_queue_capacity: usize,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            wheel_circumference_m: 0.425,
            stall_timeout_ms: 1500,
            poll_interval_ms: 1,
            endpoint: "http://192.168.1.8:8000/run".into(),
            utc_offset_secs: 9 * 60 * 60,
            gpio_pin: 13,
            delivery_timeout_ms: 5000,
            delivery_queue_capacity: 64,
        }
    }
}

impl MonitorSettings {
    /// Reads settings from `path`, falling back to defaults when the file does
    /// not exist. The endpoint env var, if set, wins over the file.
    pub fn load(path: &Path) -> Result<Self> {
        let mut settings = if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse settings in {}", path.display()))?
        } else {
            Self::default()
        };

        if let Ok(endpoint) = std::env::var(ENDPOINT_ENV) {
            if !endpoint.trim().is_empty() {
                settings.endpoint = endpoint;
            }
        }

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.wheel_circumference_m.is_finite() && self.wheel_circumference_m > 0.0) {
            bail!(
                "wheel_circumference_m must be a positive number, got {}",
                self.wheel_circumference_m
            );
        }
        if self.stall_timeout_ms == 0 {
            bail!("stall_timeout_ms must be greater than zero");
        }
        if self.poll_interval_ms == 0 {
            bail!("poll_interval_ms must be greater than zero");
        }
        if self.delivery_timeout_ms == 0 {
            bail!("delivery_timeout_ms must be greater than zero");
        }
        if self.delivery_queue_capacity == 0 {
            bail!("delivery_queue_capacity must be greater than zero");
        }
        if self.endpoint.trim().is_empty() {
            bail!("endpoint must not be empty");
        }
        self.utc_offset()?;
        Ok(())
    }

    pub fn utc_offset(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_secs)
            .ok_or_else(|| anyhow!("utc_offset_secs {} is outside ±24h", self.utc_offset_secs))
    }

    pub fn stall_timeout(&self) -> Duration {
        Duration::from_millis(self.stall_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_millis(self.delivery_timeout_ms)
    }
}
