//! Complete gesture recognition pipeline.
//!
//! This module orchestrates the full data flow from raw per-channel sensor
//! events through sample assembly, normalization, window maintenance,
//! classification, smoothing, and recognition debouncing.
//!
//! # Architecture
//!
//! 1. **Assembly**: merge the three sensor streams into completed samples
//! 2. **Normalization**: remap every channel into the model's input scale
//! 3. **Window**: keep the most recent 60 frames, oldest first
//! 4. **Inference**: classify the full window under the single-flight guard
//! 5. **Smoothing + recognition**: trailing average, threshold, debounce
//!
//! Each stage fails soft: incomplete samples, model failures, skipped ticks,
//! and insufficient history all degrade to "no event this tick". The
//! pipeline has no fatal-error state.
//!
//! [`GesturePipeline`] is the synchronous, deterministic orchestrator: the
//! caller's event timestamps are its clock, and inference runs inline. The
//! deployed, threaded shape lives in [`crate::runtime`] and reuses
//! [`InferenceStage`] for everything downstream of the window.

use serde::{Deserialize, Serialize};
use tracing::{info, trace};

use crate::assembly::SampleAssembler;
use crate::classifier::{ClassifierAdapter, FlightPermit, GestureModel, SingleFlight};
use crate::diagnostics::{
    csv_line, prediction_line, recognition_line, CSV_TARGET, PREDICTION_TARGET,
};
use crate::normalization::normalize;
use crate::recognition::{RecognitionConfig, RecognitionDebouncer};
use crate::smoothing::PredictionSmoother;
use crate::types::{
    NormalizedSample, PredictionPair, Quaternion, RawSample, EMG_CHANNELS, FRAME_SIZE,
    KEEP_LAST_PREDICTIONS,
};
use crate::window::SlidingWindow;

/// Configuration for the complete pipeline.
///
/// Bundles the recognition tunables with the structural constants and the
/// diagnostic toggles into a single, coherent package.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Recognition gate configuration (debounce, threshold, averaging).
    pub recognition: RecognitionConfig,

    /// Frames per classifier window. The trained model expects 60; changing
    /// this requires a matching model.
    pub frame_size: usize,

    /// Prediction pairs retained for smoothing. Typical: 20.
    pub history_depth: usize,

    /// Emit one CSV line per completed raw sample (training-data format).
    pub log_csv: bool,

    /// Emit one line per successful prediction and recognition.
    pub log_predictions: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            recognition: RecognitionConfig::default(),
            frame_size: FRAME_SIZE,
            history_depth: KEEP_LAST_PREDICTIONS,
            log_csv: false,
            log_predictions: true,
        }
    }
}

/// What one completed prediction cycle produced.
#[derive(Debug, Clone, Copy, Default)]
pub struct TickOutcome {
    /// The validated classifier output, if inference ran and succeeded.
    pub prediction: Option<PredictionPair>,
    /// Whether the debounced recognition gate fired this tick.
    pub recognized: bool,
}

/// Everything downstream of the window: inference, smoothing, recognition.
///
/// Shared between the synchronous pipeline (runs it inline) and the
/// threaded runtime (runs it on the inference worker). The smoothed average
/// is computed once per tick and reused for both gating and logging.
pub struct InferenceStage<M> {
    adapter: ClassifierAdapter<M>,
    smoother: PredictionSmoother,
    debouncer: RecognitionDebouncer,
    log_predictions: bool,
}

impl<M: GestureModel> InferenceStage<M> {
    /// `start_time` seeds the debounce timer (seconds on the caller's clock).
    pub fn new(model: M, config: &PipelineConfig, start_time: f64) -> Self {
        Self {
            adapter: ClassifierAdapter::new(model),
            smoother: PredictionSmoother::with_depth(config.history_depth),
            debouncer: RecognitionDebouncer::new(config.recognition.clone(), start_time),
            log_predictions: config.log_predictions,
        }
    }

    /// Handle on the single-flight flag, for producers that dispatch to a
    /// worker thread.
    pub fn flight(&self) -> SingleFlight {
        self.adapter.flight()
    }

    /// True while an inference is in flight.
    pub fn is_predicting(&self) -> bool {
        self.adapter.is_predicting()
    }

    /// Number of predictions currently in the smoothing history.
    pub fn history_len(&self) -> usize {
        self.smoother.len()
    }

    /// Run one inference tick over a full window, acquiring the guard.
    pub fn run_tick(&mut self, frames: &[NormalizedSample], now: f64) -> TickOutcome {
        let prediction = self.adapter.predict(frames);
        self.finish_tick(prediction, now)
    }

    /// Run one inference tick under a permit the producer already claimed.
    pub fn run_tick_with_permit(
        &mut self,
        frames: &[NormalizedSample],
        permit: FlightPermit,
        now: f64,
    ) -> TickOutcome {
        let prediction = self.adapter.predict_with_permit(frames, permit);
        self.finish_tick(prediction, now)
    }

    fn finish_tick(&mut self, prediction: Option<PredictionPair>, now: f64) -> TickOutcome {
        let Some(pair) = prediction else {
            // Failed or skipped inference leaves no trace downstream.
            return TickOutcome::default();
        };

        self.smoother.push(pair);
        if self.log_predictions {
            info!(target: PREDICTION_TARGET, "{}", prediction_line(&pair));
        }

        let recognized = self.debouncer.evaluate(&self.smoother, now);
        if let Some(average) = &recognized {
            if self.log_predictions {
                info!(target: PREDICTION_TARGET, "{}", recognition_line(average));
            }
        }

        TickOutcome {
            prediction: Some(pair),
            recognized: recognized.is_some(),
        }
    }
}

/// Synchronous pipeline orchestrator.
///
/// Drive it with per-channel sensor events; each call returns what that
/// event produced. Deterministic: the event timestamps are the only clock,
/// which is what makes the recognition debounce testable in simulated time.
pub struct GesturePipeline<M> {
    config: PipelineConfig,
    assembler: SampleAssembler,
    window: SlidingWindow,
    stage: InferenceStage<M>,
}

impl<M: GestureModel> GesturePipeline<M> {
    /// Pipeline with default configuration, clock starting at zero.
    pub fn new(model: M) -> Self {
        Self::with_config(model, PipelineConfig::default(), 0.0)
    }

    /// Pipeline with explicit configuration and start time.
    pub fn with_config(model: M, config: PipelineConfig, start_time: f64) -> Self {
        Self {
            assembler: SampleAssembler::new(),
            window: SlidingWindow::with_capacity(config.frame_size),
            stage: InferenceStage::new(model, &config, start_time),
            config,
        }
    }

    /// Accelerometer event from the sensor boundary.
    pub fn on_acceleration(&mut self, acceleration: [f32; 3], timestamp: f64) -> TickOutcome {
        let completed = self.assembler.set_acceleration(acceleration, timestamp);
        self.process_completion(completed)
    }

    /// Orientation event from the sensor boundary.
    pub fn on_orientation(&mut self, orientation: Quaternion, timestamp: f64) -> TickOutcome {
        let completed = self.assembler.set_orientation(orientation, timestamp);
        self.process_completion(completed)
    }

    /// EMG event from the sensor boundary.
    pub fn on_emg(&mut self, emg: [i8; EMG_CHANNELS], timestamp: f64) -> TickOutcome {
        let completed = self.assembler.set_emg(emg, timestamp);
        self.process_completion(completed)
    }

    /// Label the in-progress sample for training-data capture.
    pub fn set_gesture_label(&mut self, is_gesture: bool) {
        self.assembler.set_gesture_label(is_gesture);
    }

    /// Number of frames currently buffered.
    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    /// Number of predictions in the smoothing history.
    pub fn history_len(&self) -> usize {
        self.stage.history_len()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn process_completion(&mut self, completed: Option<RawSample>) -> TickOutcome {
        let Some(raw) = completed else {
            return TickOutcome::default();
        };

        if self.config.log_csv {
            if let Some(line) = csv_line(&raw) {
                info!(target: CSV_TARGET, "{line}");
            }
        }

        let Some(sample) = normalize(&raw) else {
            // Assembler only yields complete samples, so this is unreachable
            // in practice; a missing channel is silently dropped regardless.
            trace!("incomplete sample dropped before normalization");
            return TickOutcome::default();
        };

        self.window.push(sample);
        if !self.window.is_full() {
            return TickOutcome::default();
        }

        let frames = self.window.snapshot();
        self.stage.run_tick(&frames, sample.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ModelError;
    use ndarray::Array3;

    struct ConstantModel {
        idle: f64,
        gesture: f64,
    }

    impl ConstantModel {
        fn new(idle: f64, gesture: f64) -> Self {
            Self { idle, gesture }
        }
    }

    impl GestureModel for ConstantModel {
        fn predict(&mut self, _input: &Array3<f64>) -> Result<[f64; 2], ModelError> {
            Ok([self.idle, self.gesture])
        }
    }

    /// Feed one full sample (all three channels) completing at `timestamp`.
    fn feed_sample(pipeline: &mut GesturePipeline<ConstantModel>, timestamp: f64) -> TickOutcome {
        pipeline.on_acceleration([0.0, 0.0, 1.0], timestamp - 0.002);
        pipeline.on_orientation(Quaternion::identity(), timestamp - 0.001);
        pipeline.on_emg([0; EMG_CHANNELS], timestamp)
    }

    #[test]
    fn test_pipeline_config_default() {
        let config = PipelineConfig::default();
        assert_eq!(config.frame_size, FRAME_SIZE);
        assert_eq!(config.history_depth, KEEP_LAST_PREDICTIONS);
        assert_eq!(config.recognition.debounce_interval_s, 1.0);
        assert_eq!(config.recognition.threshold, 0.93);
        assert_eq!(config.recognition.average_count, 5);
        assert!(!config.log_csv);
        assert!(config.log_predictions);
    }

    #[test]
    fn test_no_prediction_until_window_full() {
        let mut pipeline = GesturePipeline::new(ConstantModel::new(0.5, 0.5));

        for i in 0..FRAME_SIZE - 1 {
            let outcome = feed_sample(&mut pipeline, i as f64 * 0.02);
            assert!(outcome.prediction.is_none());
            assert!(!outcome.recognized);
        }
        assert_eq!(pipeline.window_len(), FRAME_SIZE - 1);

        // The 60th completed sample fills the window and triggers inference.
        let outcome = feed_sample(&mut pipeline, (FRAME_SIZE - 1) as f64 * 0.02);
        let pair = outcome.prediction.expect("window full, inference runs");
        assert_eq!(pair.idle, 0.5);
        assert_eq!(pair.gesture, 0.5);
    }

    #[test]
    fn test_partial_channel_events_produce_nothing() {
        let mut pipeline = GesturePipeline::new(ConstantModel::new(0.5, 0.5));

        // Acceleration alone never completes a sample.
        for i in 0..200 {
            let outcome = pipeline.on_acceleration([0.0; 3], i as f64 * 0.01);
            assert!(outcome.prediction.is_none());
        }
        assert_eq!(pipeline.window_len(), 0);
    }

    #[test]
    fn test_prediction_history_accumulates_per_tick() {
        let mut pipeline = GesturePipeline::new(ConstantModel::new(0.9, 0.1));

        for i in 0..FRAME_SIZE + 3 {
            feed_sample(&mut pipeline, i as f64 * 0.02);
        }

        // One prediction per completion once the window is full.
        assert_eq!(pipeline.history_len(), 4);
    }

    #[test]
    fn test_low_probability_never_recognizes() {
        let mut pipeline = GesturePipeline::new(ConstantModel::new(0.9, 0.1));

        // Spread ticks far apart so the debounce interval never interferes.
        for i in 0..FRAME_SIZE + 20 {
            let outcome = feed_sample(&mut pipeline, i as f64 * 2.0);
            assert!(!outcome.recognized);
        }
    }
}
