//! Gesture Sensing Pipeline Library
//!
//! A sensor-fusion and gesture-classification pipeline for a wearable
//! EMG/motion armband. Three independently-timed sensor streams
//! (accelerometer, orientation quaternion, 8-channel EMG) are merged into
//! aligned samples, normalized, buffered into a 60-frame sliding window,
//! classified by an opaque trained model, smoothed over time, and finally
//! gated into a debounced "gesture recognized" event for the host
//! application.
//!
//! # Design Philosophy
//!
//! - **Degrade, never fail**: missing channels, model failures, and busy
//!   inference all resolve to "no event this tick". The pipeline has no
//!   fatal-error state.
//! - **Real-time first**: everything on the sensor delivery path is O(1)
//!   and allocation-light; inference is single-flight on a worker thread.
//! - **Opaque model**: the classifier is pluggable behind one trait with a
//!   fixed tensor contract; no model format leaks into the pipeline.
//!
//! # Example
//!
//! ```ignore
//! use gesture_sensing::{spawn_pipeline, PipelineConfig, PipelineEvent};
//!
//! let (mut frontend, events) = spawn_pipeline(my_model, PipelineConfig::default());
//!
//! // Drive frontend.on_acceleration / on_orientation / on_emg from the
//! // sensor callbacks, then drain recognition events:
//! for event in events.iter() {
//!     if let PipelineEvent::GestureRecognized = event {
//!         checklist.advance();
//!     }
//! }
//! ```

pub mod assembly;
pub mod classifier;
pub mod diagnostics;
pub mod normalization;
pub mod pipeline;
pub mod recognition;
pub mod runtime;
pub mod smoothing;
pub mod types;
pub mod window;


// Re-export commonly used types
pub use classifier::{ClassifierAdapter, GestureModel, ModelError, SingleFlight};
pub use pipeline::{GesturePipeline, InferenceStage, PipelineConfig, TickOutcome};
pub use recognition::RecognitionConfig;
pub use runtime::{spawn_pipeline, PipelineEvent, SensorFrontend};
pub use types::{
    NormalizedSample, PredictionPair, Quaternion, RawSample, CHANNELS_PER_FRAME, EMG_CHANNELS,
    FRAME_SIZE, KEEP_LAST_PREDICTIONS,
};
