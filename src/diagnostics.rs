//! Config-gated diagnostic output.
//!
//! When enabled, the pipeline emits one CSV line per completed raw sample
//! (the same column layout used when recording training data) and one line
//! per successful prediction. The output is purely observational: no
//! consumer contract, no stability guarantee.
//!
//! Lines are routed through `tracing` so deployments choose the sink; the
//! formatting itself is plain functions so tests can pin the layout.

use std::fmt::Write as _;

use crate::types::{PredictionPair, RawSample};

/// Column header matching the recorded-training-data format.
pub const CSV_HEADER: &str = "time,gesture,ax,ay,az,qw,qx,qy,qz,e0,e1,e2,e3,e4,e5,e6,e7";

/// Tracing target carrying per-sample CSV lines.
pub const CSV_TARGET: &str = "gesture_csv";

/// Tracing target carrying per-prediction lines.
pub const PREDICTION_TARGET: &str = "gesture_prediction";

/// One compact CSV line for a completed raw sample.
///
/// Returns `None` for incomplete samples; they carry no row worth logging.
pub fn csv_line(sample: &RawSample) -> Option<String> {
    let timestamp = sample.timestamp?;
    let accel = sample.acceleration?;
    let quat = sample.orientation?;
    let emg = sample.emg?;

    let mut line = String::with_capacity(128);
    let _ = write!(
        line,
        "{},{},{},{},{},{},{},{},{}",
        timestamp,
        sample.is_gesture,
        accel[0],
        accel[1],
        accel[2],
        quat.w,
        quat.x,
        quat.y,
        quat.z,
    );
    for value in emg {
        let _ = write!(line, ",{value}");
    }
    Some(line)
}

/// One line per successful prediction.
pub fn prediction_line(pair: &PredictionPair) -> String {
    format!("prediction,{},{}", pair.idle, pair.gesture)
}

/// One line per recognized gesture, carrying the smoothed probability that
/// crossed the threshold.
pub fn recognition_line(average: &PredictionPair) -> String {
    format!("recognized,{}", average.gesture)
}
