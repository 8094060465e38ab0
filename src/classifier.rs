//! Classifier boundary: opaque model trait, input tensor construction,
//! output validation, and the single-flight guard.
//!
//! The trained model is a black box behind [`GestureModel`]: it takes a
//! dense `(1, 60, 15)` row-major tensor and returns two probabilities
//! `[idle, gesture]`. Everything model-format specific lives behind that
//! trait; the pipeline only depends on this one capability.
//!
//! Inference is the only potentially slow operation in the pipeline, so the
//! adapter carries an atomic single-flight flag: at most one `predict` call
//! may be in flight, and windows that become ready while the flag is held
//! are skipped, never queued. The flag is held through an RAII permit so it
//! clears on every exit path.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ndarray::Array3;
use thiserror::Error;
use tracing::{trace, warn};

use crate::types::{NormalizedSample, PredictionPair, CHANNELS_PER_FRAME, FRAME_SIZE};

/// Failure at the inference boundary.
///
/// Every variant degrades to "no prediction this tick"; nothing here is
/// fatal to the pipeline.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The underlying inference call failed.
    #[error("inference failed: {0}")]
    Inference(String),

    /// The model produced output of an unexpected shape or type.
    #[error("malformed model output: {0}")]
    MalformedOutput(String),
}

/// The single capability the pipeline needs from a trained model.
///
/// Implementations are synchronous and stateless across calls. Input is a
/// `(1, FRAME_SIZE, CHANNELS_PER_FRAME)` tensor, row-major, `f64`; output is
/// `[idle_probability, gesture_probability]`.
pub trait GestureModel {
    fn predict(&mut self, input: &Array3<f64>) -> Result<[f64; 2], ModelError>;
}

/// Cloneable handle on the at-most-one-inference-in-flight flag.
///
/// `try_acquire` is a compare-and-set, so the handle is sound even when the
/// sensor delivery context and the inference worker race on it.
#[derive(Debug, Clone, Default)]
pub struct SingleFlight {
    active: Arc<AtomicBool>,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the flag. Returns `None` if an inference is already in flight.
    pub fn try_acquire(&self) -> Option<FlightPermit> {
        self.active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlightPermit {
                active: Arc::clone(&self.active),
            })
    }

    /// True while a permit is outstanding.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

/// Held for the duration of one inference; releases the flag on drop,
/// including during unwinding.
#[derive(Debug)]
pub struct FlightPermit {
    active: Arc<AtomicBool>,
}

impl Drop for FlightPermit {
    fn drop(&mut self) {
        self.active.store(false, Ordering::Release);
    }
}

/// Wraps an opaque [`GestureModel`] with tensor construction, output
/// validation, and the single-flight guard.
pub struct ClassifierAdapter<M> {
    model: M,
    flight: SingleFlight,
}

impl<M: GestureModel> ClassifierAdapter<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            flight: SingleFlight::new(),
        }
    }

    /// A handle on this adapter's single-flight flag, for callers that
    /// dispatch inference to another thread.
    pub fn flight(&self) -> SingleFlight {
        self.flight.clone()
    }

    /// True while an inference is in flight.
    pub fn is_predicting(&self) -> bool {
        self.flight.is_active()
    }

    /// Run one inference over a full window.
    ///
    /// Returns `None` when the guard is busy, the window is not exactly
    /// [`FRAME_SIZE`] frames, the model fails, or its output is non-finite.
    /// A `None` tick leaves no trace in downstream state.
    pub fn predict(&mut self, frames: &[NormalizedSample]) -> Option<PredictionPair> {
        let Some(permit) = self.flight.try_acquire() else {
            trace!("inference already in flight, tick skipped");
            return None;
        };
        self.predict_with_permit(frames, permit)
    }

    /// Run one inference under a permit already claimed by the caller.
    ///
    /// Used by the threaded runtime, where the sensor side claims the permit
    /// before handing the window to the inference worker.
    pub fn predict_with_permit(
        &mut self,
        frames: &[NormalizedSample],
        permit: FlightPermit,
    ) -> Option<PredictionPair> {
        let result = self.predict_locked(frames);
        drop(permit);
        result
    }

    fn predict_locked(&mut self, frames: &[NormalizedSample]) -> Option<PredictionPair> {
        let input = build_input(frames)?;

        let output = match self.model.predict(&input) {
            Ok(output) => output,
            Err(err) => {
                warn!("model inference failed: {err}");
                return None;
            }
        };

        let pair = PredictionPair::new(output[0], output[1]);
        if !pair.is_finite() {
            warn!(
                idle = output[0],
                gesture = output[1],
                "model produced non-finite probabilities, tick dropped"
            );
            return None;
        }
        Some(pair)
    }
}

/// Build the classifier input tensor from a full window.
///
/// Shape `(1, FRAME_SIZE, CHANNELS_PER_FRAME)`, frame order oldest-first,
/// channel order `[ax, ay, az, qw, qx, qy, qz, e0..e7]`. Returns `None` for
/// a partial window; callers must not invoke inference without one.
pub fn build_input(frames: &[NormalizedSample]) -> Option<Array3<f64>> {
    if frames.len() != FRAME_SIZE {
        return None;
    }

    let mut input = Array3::<f64>::zeros((1, FRAME_SIZE, CHANNELS_PER_FRAME));
    for (i, frame) in frames.iter().enumerate() {
        for (c, value) in frame.channel_row().iter().enumerate() {
            input[[0, i, c]] = *value;
        }
    }
    Some(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalization::{
        normalize, normalized_emg_value, normalized_quat_component, normalized_zero_accel,
    };
    use crate::types::{channel, Quaternion, RawSample, EMG_CHANNELS};

    /// Test model replaying a fixed outcome.
    struct ScriptedModel {
        outcome: Result<[f64; 2], ()>,
    }

    impl ScriptedModel {
        fn constant(idle: f64, gesture: f64) -> Self {
            Self {
                outcome: Ok([idle, gesture]),
            }
        }

        fn failing() -> Self {
            Self { outcome: Err(()) }
        }
    }

    impl GestureModel for ScriptedModel {
        fn predict(&mut self, _input: &Array3<f64>) -> Result<[f64; 2], ModelError> {
            match self.outcome {
                Ok(output) => Ok(output),
                Err(()) => Err(ModelError::Inference("backend unavailable".into())),
            }
        }
    }

    fn resting_window() -> Vec<NormalizedSample> {
        // 60 samples: zero acceleration, identity quaternion, zero EMG.
        (0..FRAME_SIZE)
            .map(|i| {
                let raw = RawSample {
                    timestamp: Some(i as f64 * 0.02),
                    acceleration: Some([0.0; 3]),
                    orientation: Some(Quaternion::identity()),
                    emg: Some([0; EMG_CHANNELS]),
                    is_gesture: false,
                };
                normalize(&raw).unwrap()
            })
            .collect()
    }

    #[test]
    fn test_tensor_shape_and_channel_values() {
        let frames = resting_window();
        let input = build_input(&frames).unwrap();

        assert_eq!(input.dim(), (1, FRAME_SIZE, CHANNELS_PER_FRAME));

        let zero_accel = normalized_zero_accel() as f64;
        let identity_w = normalized_quat_component(1.0) as f64;
        let zero_component = normalized_quat_component(0.0) as f64;
        let zero_emg = normalized_emg_value(0) as f64;

        for i in 0..FRAME_SIZE {
            // Channels 0-2: normalized zero acceleration in every row.
            for c in channel::AX..=channel::AZ {
                assert_eq!(input[[0, i, c]], zero_accel);
            }
            // Channel 3: the normalized identity w component in every row.
            assert_eq!(input[[0, i, channel::QW]], identity_w);
            for c in channel::QX..=channel::QZ {
                assert_eq!(input[[0, i, c]], zero_component);
            }
            // Channels 7-14: normalized zero EMG in every row.
            for c in channel::E0..CHANNELS_PER_FRAME {
                assert_eq!(input[[0, i, c]], zero_emg);
            }
        }
    }

    #[test]
    fn test_build_input_rejects_partial_window() {
        let mut frames = resting_window();
        frames.pop();
        assert!(build_input(&frames).is_none());
        assert!(build_input(&[]).is_none());
    }

    #[test]
    fn test_predict_success() {
        let mut adapter = ClassifierAdapter::new(ScriptedModel::constant(0.1, 0.9));
        let pair = adapter.predict(&resting_window()).unwrap();

        assert_eq!(pair.idle, 0.1);
        assert_eq!(pair.gesture, 0.9);
        assert!(!adapter.is_predicting());
    }

    #[test]
    fn test_predict_rejects_nan_output() {
        let mut adapter = ClassifierAdapter::new(ScriptedModel::constant(f64::NAN, 0.9));
        assert!(adapter.predict(&resting_window()).is_none());
        assert!(!adapter.is_predicting());
    }

    #[test]
    fn test_predict_handles_model_failure() {
        let mut adapter = ClassifierAdapter::new(ScriptedModel::failing());
        assert!(adapter.predict(&resting_window()).is_none());
        // Flag must clear on the failure path too.
        assert!(!adapter.is_predicting());
    }

    #[test]
    fn test_single_flight_skips_concurrent_tick() {
        let mut adapter = ClassifierAdapter::new(ScriptedModel::constant(0.1, 0.9));
        let flight = adapter.flight();

        let _held = flight.try_acquire().unwrap();
        assert!(adapter.is_predicting());
        assert!(adapter.predict(&resting_window()).is_none());
    }

    #[test]
    fn test_permit_releases_on_drop() {
        let flight = SingleFlight::new();
        let permit = flight.try_acquire().unwrap();
        assert!(flight.is_active());
        assert!(flight.try_acquire().is_none());

        drop(permit);
        assert!(!flight.is_active());
        assert!(flight.try_acquire().is_some());
    }
}
