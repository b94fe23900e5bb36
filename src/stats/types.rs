use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub runs_started: u64,
    pub runs_completed: u64,
    pub runs_interrupted: u64,
    pub degenerate_runs: u64,
    pub sensor_failures: u64,
    pub deliveries_ok: u64,
    pub deliveries_failed: u64,
    /// Records dropped because the delivery queue was full or closed.
    pub deliveries_dropped: u64,
}
