//! Sources of the photo-interrupter signal.
//!
//! The monitor only ever sees the [`SignalSource`] trait; real hardware sits
//! behind the `gpio` feature and [`SimulatedWheel`] covers bench runs.

#[cfg(feature = "gpio")]
mod gpio;
mod simulated;

#[cfg(feature = "gpio")]
pub use gpio::GpioSensor;
pub use simulated::SimulatedWheel;

use crate::error::MonitorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalLevel {
    Low = 0,
    High = 1,
}

impl SignalLevel {
    pub fn from_bit(bit: u8) -> Self {
        if bit == 0 {
            SignalLevel::Low
        } else {
            SignalLevel::High
        }
    }
}

impl From<bool> for SignalLevel {
    fn from(high: bool) -> Self {
        if high {
            SignalLevel::High
        } else {
            SignalLevel::Low
        }
    }
}

/// A binary sensor polled on demand.
pub trait SignalSource: Send {
    fn read_signal(&mut self) -> Result<SignalLevel, MonitorError>;
}
