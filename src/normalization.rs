//! Per-channel normalization of completed samples.
//!
//! Every channel is remapped with the same affine form the classifier was
//! trained against: `v' = (v - min) / max`. The bounds are constants of the
//! trained model's input scaling and are a compatibility contract; changing
//! them silently degrades the classifier even when the "fix" looks obviously
//! right (see `ACCEL_SCALE`).
//!
//! Design note: normalization is a pure function of its input. No clamping
//! is applied, so out-of-range readings may normalize outside [0, 1]; the
//! model saw the same behavior during training.

use crate::types::{NormalizedSample, Quaternion, RawSample, EMG_CHANNELS};

/// Affine bounds for one channel group.
#[derive(Debug, Clone, Copy)]
struct Scale {
    min: f32,
    max: f32,
}

impl Scale {
    const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    fn apply(&self, value: f32) -> f32 {
        (value - self.min) / self.max
    }
}

/// Acceleration bounds.
///
/// CAUTION: min == max == -10.0 is degenerate (the divisor is negative and
/// equal to the offset), so a resting axis normalizes to -1.0 and the scale
/// is inverted. The trained model expects exactly this mapping; do not
/// repair it without retraining.
const ACCEL_SCALE: Scale = Scale::new(-10.0, -10.0);

/// Orientation component bounds: [-π, 3π].
const QUAT_SCALE: Scale = Scale::new(-3.141_593, 9.424_778);

/// EMG bounds, applied independently to each of the 8 channels.
const EMG_SCALE: Scale = Scale::new(-128.0, 255.0);

/// Remap a completed sample into the classifier's input scale.
///
/// Returns `None` if any channel is absent; incomplete samples never reach
/// the window.
pub fn normalize(sample: &RawSample) -> Option<NormalizedSample> {
    let timestamp = sample.timestamp?;
    let accel = sample.acceleration?;
    let quat = sample.orientation?;
    let emg = sample.emg?;

    let acceleration = [
        ACCEL_SCALE.apply(accel[0]),
        ACCEL_SCALE.apply(accel[1]),
        ACCEL_SCALE.apply(accel[2]),
    ];

    let orientation = Quaternion::new(
        QUAT_SCALE.apply(quat.w),
        QUAT_SCALE.apply(quat.x),
        QUAT_SCALE.apply(quat.y),
        QUAT_SCALE.apply(quat.z),
    );

    let mut emg_scaled = [0.0f32; EMG_CHANNELS];
    for (out, raw) in emg_scaled.iter_mut().zip(emg.iter()) {
        *out = EMG_SCALE.apply(*raw as f32);
    }

    Some(NormalizedSample {
        timestamp,
        acceleration,
        orientation,
        emg: emg_scaled,
        is_gesture: sample.is_gesture,
    })
}

/// The normalized value of a zero accelerometer reading.
pub fn normalized_zero_accel() -> f32 {
    ACCEL_SCALE.apply(0.0)
}

/// The normalized value of a given orientation component.
pub fn normalized_quat_component(value: f32) -> f32 {
    QUAT_SCALE.apply(value)
}

/// The normalized value of a given raw EMG activation.
pub fn normalized_emg_value(value: i8) -> f32 {
    EMG_SCALE.apply(value as f32)
}
