//! Core data types for the gesture recognition pipeline.
//!
//! This module defines the fundamental types used throughout the sensor
//! fusion and classification pipeline. All types are carefully designed to
//! minimize allocation and maximize clarity.
//!
//! Design principle: Types should make intent obvious. If a concept exists,
//! it gets a type. Never pass raw tuples or untyped collections across
//! boundaries.
//!
//! The channel layout defined here is part of the wire contract with the
//! trained classifier and must never be permuted.

/// Number of normalized samples fed to the classifier per inference.
pub const FRAME_SIZE: usize = 60;

/// Number of EMG channels delivered by the armband.
pub const EMG_CHANNELS: usize = 8;

/// Values per frame row in the classifier input tensor:
/// 3 acceleration + 4 quaternion + 8 EMG.
pub const CHANNELS_PER_FRAME: usize = 15;

/// Maximum number of prediction pairs retained for smoothing.
pub const KEEP_LAST_PREDICTIONS: usize = 20;

/// Classifier input channel indices.
///
/// Frame row layout is `[ax, ay, az, qw, qx, qy, qz, e0..e7]`, in that exact
/// order. The trained model consumes rows positionally, so these indices are
/// a compatibility contract, not a convenience.
pub mod channel {
    pub const AX: usize = 0;
    pub const AY: usize = 1;
    pub const AZ: usize = 2;
    pub const QW: usize = 3;
    pub const QX: usize = 4;
    pub const QY: usize = 5;
    pub const QZ: usize = 6;
    pub const E0: usize = 7;
}

/// A rotation quaternion (w, x, y, z) as delivered by the armband.
///
/// The pipeline never interprets the rotation; components are only remapped
/// and forwarded to the classifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion {
    pub w: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Quaternion {
    pub fn new(w: f32, x: f32, y: f32, z: f32) -> Self {
        Self { w, x, y, z }
    }

    /// Identity rotation.
    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0)
    }
}

/// A raw sample under assembly from three independently-timed sensor streams.
///
/// Fields are optional because the streams arrive at unsynchronized rates;
/// the sample is complete once every channel has reported at least once
/// since the last completion. Owned exclusively by the assembler until
/// handed off.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawSample {
    /// Seconds since the pipeline started, taken from the most recent
    /// channel update (last-write-wins across all three streams).
    pub timestamp: Option<f64>,

    /// Accelerometer reading [x, y, z].
    pub acceleration: Option<[f32; 3]>,

    /// Orientation quaternion from the armband's onboard fusion.
    pub orientation: Option<Quaternion>,

    /// Raw 8-channel EMG activations, signed byte range.
    pub emg: Option<[i8; EMG_CHANNELS]>,

    /// Label flag used when capturing training data; not set by the
    /// pipeline itself.
    pub is_gesture: bool,
}

impl RawSample {
    /// A sample with no channels reported yet.
    pub fn empty() -> Self {
        Self::default()
    }

    /// True once every channel (and the timestamp they carry) is present.
    pub fn is_complete(&self) -> bool {
        self.timestamp.is_some()
            && self.acceleration.is_some()
            && self.orientation.is_some()
            && self.emg.is_some()
    }
}

/// A completed sample with every channel remapped into the classifier's
/// expected input scale.
///
/// Immutable once produced; value semantics throughout (copied into the
/// window, never aliased).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedSample {
    /// Seconds since the pipeline started.
    pub timestamp: f64,

    /// Rescaled acceleration [x, y, z].
    pub acceleration: [f32; 3],

    /// Rescaled orientation components.
    pub orientation: Quaternion,

    /// Rescaled EMG channels.
    pub emg: [f32; EMG_CHANNELS],

    /// Training-data label flag, carried through unchanged.
    pub is_gesture: bool,
}

impl NormalizedSample {
    /// The sample as one classifier input row, in the fixed channel order.
    pub fn channel_row(&self) -> [f64; CHANNELS_PER_FRAME] {
        let mut row = [0.0; CHANNELS_PER_FRAME];
        row[channel::AX] = self.acceleration[0] as f64;
        row[channel::AY] = self.acceleration[1] as f64;
        row[channel::AZ] = self.acceleration[2] as f64;
        row[channel::QW] = self.orientation.w as f64;
        row[channel::QX] = self.orientation.x as f64;
        row[channel::QY] = self.orientation.y as f64;
        row[channel::QZ] = self.orientation.z as f64;
        for (i, value) in self.emg.iter().enumerate() {
            row[channel::E0 + i] = *value as f64;
        }
        row
    }
}

/// One two-class classifier output.
///
/// Well-formed pairs are finite and non-NaN; the classifier adapter
/// validates this before a pair is allowed to exist downstream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionPair {
    /// Probability that the window contains no gesture.
    pub idle: f64,
    /// Probability that the window contains the trained gesture.
    pub gesture: f64,
}

impl PredictionPair {
    pub fn new(idle: f64, gesture: f64) -> Self {
        Self { idle, gesture }
    }

    /// True when both probabilities are finite numbers.
    ///
    /// Validated, not derived: the model is opaque and a bad input window
    /// can surface as NaN output, which must never enter the prediction
    /// history.
    pub fn is_finite(&self) -> bool {
        self.idle.is_finite() && self.gesture.is_finite()
    }
}
