use thiserror::Error;

/// Failures that can occur inside a single poll tick or delivery attempt.
///
/// None of these escape the poll loop; they are logged and counted where they
/// happen.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MonitorError {
    #[error("sensor read failed: {0}")]
    SensorRead(String),

    #[error("delivery failed: {0}")]
    Delivery(String),

    /// A run finished with a zero or negative duration (duplicate trigger or
    /// a clock that went backwards). Such a run has no meaningful speed.
    #[error("degenerate run duration: {seconds}s")]
    DegenerateRunDuration { seconds: f64 },

    #[error("no run in progress")]
    RunNotActive,
}
