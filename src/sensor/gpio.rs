use anyhow::{Context, Result};
use log::info;
use rppal::gpio::{Gpio, InputPin};

use super::{SignalLevel, SignalSource};
use crate::error::MonitorError;

/// Photo-interrupter wired to a BCM-numbered input pin.
pub struct GpioSensor {
    pin: InputPin,
}

impl GpioSensor {
    pub fn new(bcm_pin: u8) -> Result<Self> {
        let gpio = Gpio::new().context("failed to open GPIO peripheral")?;
        let pin = gpio
            .get(bcm_pin)
            .with_context(|| format!("failed to claim GPIO{bcm_pin}"))?
            .into_input();

        info!("Photo-interrupter ready on GPIO{}", bcm_pin);
        Ok(Self { pin })
    }
}

impl SignalSource for GpioSensor {
    fn read_signal(&mut self) -> Result<SignalLevel, MonitorError> {
        Ok(SignalLevel::from(self.pin.is_high()))
    }
}
