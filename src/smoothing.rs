//! Prediction smoothing over a bounded history.
//!
//! Raw per-tick classifier output is noisy; recognition is gated on the
//! trailing mean of recent predictions instead. The smoother keeps the last
//! [`KEEP_LAST_PREDICTIONS`] pairs in arrival order and computes the mean on
//! demand.
//!
//! One quirk is deliberately preserved: `average_of_last(n)` requires the
//! history to be strictly longer than `n`. Exactly `n` accumulated
//! predictions is not enough, matching the behavior the recognition
//! threshold was tuned against.

use std::collections::VecDeque;

use crate::types::{PredictionPair, KEEP_LAST_PREDICTIONS};

/// Bounded FIFO of validated prediction pairs with trailing-mean queries.
#[derive(Debug, Clone)]
pub struct PredictionSmoother {
    history: VecDeque<PredictionPair>,
    depth: usize,
}

impl PredictionSmoother {
    pub fn new() -> Self {
        Self::with_depth(KEEP_LAST_PREDICTIONS)
    }

    pub fn with_depth(depth: usize) -> Self {
        Self {
            history: VecDeque::with_capacity(depth),
            depth,
        }
    }

    /// Record a validated prediction, evicting the oldest beyond the depth.
    ///
    /// Callers only push pairs that passed the adapter's finiteness check;
    /// NaN never enters the history.
    pub fn push(&mut self, pair: PredictionPair) {
        self.history.push_back(pair);
        while self.history.len() > self.depth {
            self.history.pop_front();
        }
    }

    /// Arithmetic mean of the idle and gesture probabilities over the most
    /// recent `count` entries, computed independently per component.
    ///
    /// Returns `None` unless the history holds strictly more than `count`
    /// entries. Pure read.
    pub fn average_of_last(&self, count: usize) -> Option<PredictionPair> {
        if count == 0 || self.history.len() <= count {
            return None;
        }

        let mut idle_sum = 0.0;
        let mut gesture_sum = 0.0;
        for pair in self.history.iter().rev().take(count) {
            idle_sum += pair.idle;
            gesture_sum += pair.gesture;
        }
        Some(PredictionPair::new(
            idle_sum / count as f64,
            gesture_sum / count as f64,
        ))
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

impl Default for PredictionSmoother {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_strictly_more_than_count() {
        let mut smoother = PredictionSmoother::new();
        for _ in 0..5 {
            smoother.push(PredictionPair::new(0.1, 0.9));
        }

        // Exactly n entries is insufficient.
        assert!(smoother.average_of_last(5).is_none());

        smoother.push(PredictionPair::new(0.1, 0.9));
        assert!(smoother.average_of_last(5).is_some());
    }

    #[test]
    fn test_average_over_most_recent_entries() {
        let mut smoother = PredictionSmoother::new();
        // Older entries that must be excluded from a 3-wide average.
        smoother.push(PredictionPair::new(1.0, 0.0));
        smoother.push(PredictionPair::new(1.0, 0.0));
        // The three most recent.
        smoother.push(PredictionPair::new(0.2, 0.8));
        smoother.push(PredictionPair::new(0.4, 0.6));
        smoother.push(PredictionPair::new(0.6, 0.4));

        let average = smoother.average_of_last(3).unwrap();
        assert!((average.idle - 0.4).abs() < 1e-12);
        assert!((average.gesture - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_history_depth_eviction() {
        let mut smoother = PredictionSmoother::new();
        for i in 0..(KEEP_LAST_PREDICTIONS + 5) {
            smoother.push(PredictionPair::new(i as f64, 0.0));
        }

        assert_eq!(smoother.len(), KEEP_LAST_PREDICTIONS);

        // Retained entries carry idle values 5..=24; the most recent 19 of
        // those are 6..=24.
        let average = smoother.average_of_last(KEEP_LAST_PREDICTIONS - 1).unwrap();
        let expected: f64 = (6..=24).sum::<i64>() as f64 / 19.0;
        assert!((average.idle - expected).abs() < 1e-12);
    }

    #[test]
    fn test_zero_count_is_rejected() {
        let mut smoother = PredictionSmoother::new();
        smoother.push(PredictionPair::new(0.5, 0.5));
        assert!(smoother.average_of_last(0).is_none());
    }

    #[test]
    fn test_average_is_pure_read() {
        let mut smoother = PredictionSmoother::new();
        for _ in 0..4 {
            smoother.push(PredictionPair::new(0.25, 0.75));
        }

        let first = smoother.average_of_last(2);
        let second = smoother.average_of_last(2);
        assert_eq!(first, second);
        assert_eq!(smoother.len(), 4);
    }
}
