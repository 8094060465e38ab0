//! Sample assembly from independently-timed sensor streams.
//!
//! The armband delivers acceleration, orientation, and EMG on separate
//! callbacks at unsynchronized rates (EMG is typically the fastest). The
//! assembler merges them keyed by "most recent": each channel update
//! overwrites that channel and the shared timestamp, and once every channel
//! has reported the assembled sample is yielded and the assembler resets.
//!
//! Design note: there is no queueing. A second arrival on a channel before
//! the sample completes discards the prior unconsumed value for that channel
//! only (last-write-wins). All updates are O(1) and allocation-free, so the
//! assembler is safe to drive directly from the sensor delivery context.

use crate::types::{Quaternion, RawSample, EMG_CHANNELS};

/// Merges per-channel readings into completed [`RawSample`]s.
///
/// Owns the in-progress sample exclusively; completed samples are handed off
/// by value and the internal state resets atomically in the same call.
#[derive(Debug, Default)]
pub struct SampleAssembler {
    current: RawSample,
    completed_count: u64,
}

impl SampleAssembler {
    pub fn new() -> Self {
        Self {
            current: RawSample::empty(),
            completed_count: 0,
        }
    }

    /// Record an accelerometer reading, overwriting any unconsumed one.
    ///
    /// Returns the completed sample if this update filled the last missing
    /// channel.
    pub fn set_acceleration(&mut self, acceleration: [f32; 3], timestamp: f64) -> Option<RawSample> {
        self.current.acceleration = Some(acceleration);
        self.current.timestamp = Some(timestamp);
        self.complete_if_ready()
    }

    /// Record an orientation quaternion, overwriting any unconsumed one.
    pub fn set_orientation(&mut self, orientation: Quaternion, timestamp: f64) -> Option<RawSample> {
        self.current.orientation = Some(orientation);
        self.current.timestamp = Some(timestamp);
        self.complete_if_ready()
    }

    /// Record an EMG reading, overwriting any unconsumed one.
    pub fn set_emg(&mut self, emg: [i8; EMG_CHANNELS], timestamp: f64) -> Option<RawSample> {
        self.current.emg = Some(emg);
        self.current.timestamp = Some(timestamp);
        self.complete_if_ready()
    }

    /// Mark the in-progress sample as part of a labeled gesture (training
    /// data capture). Carried into the next completed sample.
    pub fn set_gesture_label(&mut self, is_gesture: bool) {
        self.current.is_gesture = is_gesture;
    }

    /// Number of samples completed since construction.
    pub fn completed_count(&self) -> u64 {
        self.completed_count
    }

    fn complete_if_ready(&mut self) -> Option<RawSample> {
        if !self.current.is_complete() {
            return None;
        }
        self.completed_count += 1;
        // Hand off by value and reset in one step; the label flag does not
        // persist across completions.
        Some(std::mem::take(&mut self.current))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zero_emg() -> [i8; EMG_CHANNELS] {
        [0; EMG_CHANNELS]
    }

    #[test]
    fn test_completion_requires_all_three_channels() {
        let mut assembler = SampleAssembler::new();

        assert!(assembler.set_acceleration([0.0, 0.0, 1.0], 0.1).is_none());
        assert!(assembler.set_orientation(Quaternion::identity(), 0.2).is_none());

        let sample = assembler.set_emg(zero_emg(), 0.3);
        let sample = sample.expect("third channel completes the sample");
        assert_eq!(sample.timestamp, Some(0.3));
        assert!(sample.is_complete());
    }

    #[test]
    fn test_completion_is_order_independent() {
        // Each channel may arrive first; completion fires exactly on the
        // third distinct channel regardless of order.
        let orders: [[u8; 3]; 6] = [
            [0, 1, 2],
            [0, 2, 1],
            [1, 0, 2],
            [1, 2, 0],
            [2, 0, 1],
            [2, 1, 0],
        ];

        for order in orders {
            let mut assembler = SampleAssembler::new();
            let mut completed = None;
            for (i, ch) in order.iter().enumerate() {
                let result = match ch {
                    0 => assembler.set_acceleration([1.0, 2.0, 3.0], i as f64),
                    1 => assembler.set_orientation(Quaternion::identity(), i as f64),
                    _ => assembler.set_emg(zero_emg(), i as f64),
                };
                if i < 2 {
                    assert!(result.is_none(), "completed early for order {order:?}");
                } else {
                    completed = result;
                }
            }
            assert!(completed.is_some(), "never completed for order {order:?}");
        }
    }

    #[test]
    fn test_last_write_wins_per_channel() {
        let mut assembler = SampleAssembler::new();

        assembler.set_acceleration([1.0, 1.0, 1.0], 0.1);
        // Re-delivery before completion replaces the unconsumed value.
        assembler.set_acceleration([2.0, 2.0, 2.0], 0.2);
        assembler.set_orientation(Quaternion::identity(), 0.3);
        let sample = assembler.set_emg(zero_emg(), 0.4).unwrap();

        assert_eq!(sample.acceleration, Some([2.0, 2.0, 2.0]));
        assert_eq!(sample.timestamp, Some(0.4));
    }

    #[test]
    fn test_resets_after_completion() {
        let mut assembler = SampleAssembler::new();

        assembler.set_acceleration([0.0; 3], 0.1);
        assembler.set_orientation(Quaternion::identity(), 0.2);
        assert!(assembler.set_emg(zero_emg(), 0.3).is_some());

        // A fresh cycle must require all three channels again.
        assert!(assembler.set_emg(zero_emg(), 0.4).is_none());
        assert!(assembler.set_acceleration([0.0; 3], 0.5).is_none());
        assert!(assembler.set_orientation(Quaternion::identity(), 0.6).is_some());
        assert_eq!(assembler.completed_count(), 2);
    }

    #[test]
    fn test_gesture_label_applies_to_current_sample_only() {
        let mut assembler = SampleAssembler::new();
        assembler.set_gesture_label(true);

        assembler.set_acceleration([0.0; 3], 0.1);
        assembler.set_orientation(Quaternion::identity(), 0.2);
        let labeled = assembler.set_emg(zero_emg(), 0.3).unwrap();
        assert!(labeled.is_gesture);

        assembler.set_acceleration([0.0; 3], 0.4);
        assembler.set_orientation(Quaternion::identity(), 0.5);
        let unlabeled = assembler.set_emg(zero_emg(), 0.6).unwrap();
        assert!(!unlabeled.is_gesture);
    }
}
