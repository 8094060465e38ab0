//! Gesture Sensing Pipeline
//!
//! Demo entry point: drives the synchronous pipeline with synthetic sensor
//! data and a stub model to show the event flow. For library use, see
//! lib.rs.

use gesture_sensing::{
    GestureModel, GesturePipeline, ModelError, PipelineConfig, Quaternion, EMG_CHANNELS,
    FRAME_SIZE,
};
use ndarray::Array3;

/// Stub model: reports high gesture probability once the mean EMG channel
/// activation in the window crosses a made-up level. Stands in for the
/// trained classifier, which is loaded by the host application.
struct EnergyStubModel;

impl GestureModel for EnergyStubModel {
    fn predict(&mut self, input: &Array3<f64>) -> Result<[f64; 2], ModelError> {
        let emg_mean = input
            .slice(ndarray::s![0, .., 7..])
            .mean()
            .unwrap_or_default();
        let gesture = if emg_mean > 0.6 { 0.97 } else { 0.05 };
        Ok([1.0 - gesture, gesture])
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    println!("Gesture Sensing Pipeline v0.1.0");
    println!("EMG + motion armband gesture recognition demo");

    let mut config = PipelineConfig::default();
    config.log_predictions = false;
    let mut pipeline = GesturePipeline::with_config(EnergyStubModel, config, 0.0);

    let mut recognitions = 0;
    let mut predictions = 0;

    // Two seconds of idle, then a burst of high EMG activity.
    for i in 0..(FRAME_SIZE * 4) {
        let t = i as f64 * 0.02;
        let emg: [i8; EMG_CHANNELS] = if t > 2.0 { [120; EMG_CHANNELS] } else { [0; EMG_CHANNELS] };

        pipeline.on_acceleration([0.0, 0.0, 1.0], t);
        pipeline.on_orientation(Quaternion::identity(), t);
        let outcome = pipeline.on_emg(emg, t);

        if outcome.prediction.is_some() {
            predictions += 1;
        }
        if outcome.recognized {
            recognitions += 1;
            println!("gesture recognized at t={t:.2}s");
        }
    }

    println!("predictions made: {predictions}");
    println!("gestures recognized: {recognitions}");
}
