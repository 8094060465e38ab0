//! Recognition gating and debouncing.
//!
//! One trailing-average threshold decides whether the smoothed gesture
//! probability counts as a recognition, and a minimum inter-recognition
//! interval keeps a single physical gesture from firing the host callback
//! repeatedly while its window is still sliding past the classifier.
//!
//! The gate is strictly sequential and keeps no memory of failed attempts
//! beyond the timer: interval first, then history availability, then
//! threshold.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::smoothing::PredictionSmoother;
use crate::types::PredictionPair;

/// Tunables for the recognition gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionConfig {
    /// Minimum time between recognitions, in seconds.
    /// Typical: 1.0. Shorter intervals re-fire on the same gesture.
    pub debounce_interval_s: f64,

    /// Smoothed gesture probability that must be exceeded to recognize.
    /// Typical: 0.93. Tuned against the trailing average, not raw output.
    pub threshold: f64,

    /// How many recent predictions the trailing average covers.
    /// Typical: 5. The history must hold strictly more than this many.
    pub average_count: usize,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            debounce_interval_s: 1.0,
            threshold: 0.93,
            average_count: 5,
        }
    }
}

/// Debounced threshold gate over the smoothed gesture probability.
///
/// `last_recognition` starts at the pipeline start time, so the debounce
/// interval also covers the first moments after startup.
#[derive(Debug, Clone)]
pub struct RecognitionDebouncer {
    config: RecognitionConfig,
    last_recognition: f64,
}

impl RecognitionDebouncer {
    /// `now` is the clock value at pipeline start, in seconds.
    pub fn new(config: RecognitionConfig, now: f64) -> Self {
        Self {
            config,
            last_recognition: now,
        }
    }

    /// Evaluate the gate for one completed prediction tick.
    ///
    /// Returns the smoothed average when all gates pass, advancing the
    /// debounce timer; `None` means no recognition this tick. The timer
    /// only moves on success.
    pub fn evaluate(
        &mut self,
        smoother: &PredictionSmoother,
        now: f64,
    ) -> Option<PredictionPair> {
        if now - self.last_recognition <= self.config.debounce_interval_s {
            return None;
        }

        let average = smoother.average_of_last(self.config.average_count)?;

        if average.gesture <= self.config.threshold {
            debug!(
                gesture = average.gesture,
                threshold = self.config.threshold,
                "smoothed probability below recognition threshold"
            );
            return None;
        }

        info!(gesture = average.gesture, at = now, "gesture recognized");
        self.last_recognition = now;
        Some(average)
    }

    /// Timestamp of the most recent recognition (or the start time).
    pub fn last_recognition(&self) -> f64 {
        self.last_recognition
    }
}
