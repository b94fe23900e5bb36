use chrono::{DateTime, FixedOffset};

use crate::sensor::SignalLevel;

/// State the poll loop carries between ticks.
#[derive(Debug, Clone)]
pub struct MonitorState {
    /// `None` until the first successful read, and again after a failed one.
    previous_sample: Option<SignalLevel>,
    /// Reference point for the stall timeout.
    last_edge_time: DateTime<FixedOffset>,
}

impl MonitorState {
    pub fn new(started_at: DateTime<FixedOffset>) -> Self {
        Self {
            previous_sample: None,
            last_edge_time: started_at,
        }
    }

    pub fn previous_sample(&self) -> Option<SignalLevel> {
        self.previous_sample
    }

    pub fn last_edge_time(&self) -> DateTime<FixedOffset> {
        self.last_edge_time
    }

    /// True iff the previous sample was high and `current` is low.
    pub fn is_falling_edge(&self, current: SignalLevel) -> bool {
        is_falling_edge(self.previous_sample, current)
    }

    pub fn mark_edge(&mut self, at: DateTime<FixedOffset>) {
        self.last_edge_time = at;
    }

    pub fn commit_sample(&mut self, current: SignalLevel) {
        self.previous_sample = Some(current);
    }

    pub fn forget_sample(&mut self) {
        self.previous_sample = None;
    }
}

pub fn is_falling_edge(previous: Option<SignalLevel>, current: SignalLevel) -> bool {
    previous == Some(SignalLevel::High) && current == SignalLevel::Low
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::SignalLevel::{High, Low};

    #[test]
    fn only_high_to_low_is_an_edge() {
        assert!(is_falling_edge(Some(High), Low));
        assert!(!is_falling_edge(Some(High), High));
        assert!(!is_falling_edge(Some(Low), Low));
        assert!(!is_falling_edge(Some(Low), High));
        assert!(!is_falling_edge(None, Low));
        assert!(!is_falling_edge(None, High));
    }

    #[test]
    fn counts_edges_in_a_sample_sequence() {
        let bits = [1, 1, 0, 0, 1, 0, 1, 1, 1, 0, 0, 1];
        let mut previous = None;
        let mut edges = Vec::new();
        for (i, bit) in bits.iter().enumerate() {
            let current = SignalLevel::from_bit(*bit);
            if is_falling_edge(previous, current) {
                edges.push(i);
            }
            previous = Some(current);
        }
        assert_eq!(edges, vec![2, 5, 9]);
    }
}
