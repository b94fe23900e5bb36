use rand::{rngs::StdRng, Rng, SeedableRng};
use std::time::{Duration, Instant};

use super::{SignalLevel, SignalSource};
use crate::error::MonitorError;

const JITTER_FRACTION: f64 = 0.1;

/// A wheel turning at a roughly constant rate. Each revolution is a short high
/// pulse followed by a falling edge.
pub struct SimulatedWheel {
    period: Duration,
    pulse_width: Duration,
    next_pulse_at: Instant,
    high_until: Option<Instant>,
    rng: StdRng,
}

impl SimulatedWheel {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            pulse_width: period / 5,
            next_pulse_at: Instant::now() + period,
            high_until: None,
            rng: StdRng::from_entropy(),
        }
    }

    fn jittered_period(&mut self) -> Duration {
        let factor = 1.0 + self.rng.gen_range(-JITTER_FRACTION..=JITTER_FRACTION);
        self.period.mul_f64(factor)
    }
}

impl SignalSource for SimulatedWheel {
    fn read_signal(&mut self) -> Result<SignalLevel, MonitorError> {
        let now = Instant::now();
        if now >= self.next_pulse_at {
            self.high_until = Some(now + self.pulse_width);
            self.next_pulse_at = now + self.jittered_period();
        }

        let high = self.high_until.is_some_and(|until| now < until);
        Ok(SignalLevel::from(high))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produces_a_falling_edge_per_period() {
        let mut wheel = SimulatedWheel::new(Duration::from_millis(20));
        let mut previous = None;
        let mut edges = 0;
        let deadline = Instant::now() + Duration::from_millis(150);

        while Instant::now() < deadline {
            let level = wheel.read_signal().unwrap();
            if previous == Some(SignalLevel::High) && level == SignalLevel::Low {
                edges += 1;
            }
            previous = Some(level);
            std::thread::sleep(Duration::from_micros(500));
        }

        assert!(edges >= 3, "expected several revolutions, saw {edges}");
    }
}
