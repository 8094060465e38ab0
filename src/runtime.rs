//! Threaded deployment of the gesture pipeline.
//!
//! Sensor events arrive on a background delivery context at unsynchronized
//! per-channel rates. Assembly, normalization, and window maintenance are
//! O(1) and run synchronously on that context inside [`SensorFrontend`];
//! inference is the only slow operation and is handed to a dedicated worker
//! thread so the delivery path never stalls on it.
//!
//! The handoff carries the single-flight permit: the frontend claims it
//! before sending, the worker releases it after the inference completes, so
//! windows that become ready in between are dropped, never queued. There is
//! no cancellation and no backpressure.
//!
//! Host callbacks are a `crossbeam_channel` receiver of [`PipelineEvent`]s.
//! The channel serializes delivery, so host state mutation stays
//! single-threaded from the host's perspective.

use std::thread;
use std::time::Instant;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TrySendError};
use tracing::{info, trace, warn};

use crate::assembly::SampleAssembler;
use crate::classifier::{FlightPermit, GestureModel, SingleFlight};
use crate::diagnostics::{csv_line, CSV_TARGET};
use crate::normalization::normalize;
use crate::pipeline::{InferenceStage, PipelineConfig};
use crate::types::{NormalizedSample, PredictionPair, Quaternion, RawSample, EMG_CHANNELS};
use crate::window::SlidingWindow;

/// Notification delivered to the host on the event channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PipelineEvent {
    /// A successful inference completed; fired for every validated
    /// prediction, recognized or not.
    Prediction(PredictionPair),
    /// The debounced recognition gate fired.
    GestureRecognized,
}

/// A full window handed to the inference worker, with the claimed permit.
struct InferenceRequest {
    frames: Vec<NormalizedSample>,
    permit: FlightPermit,
}

/// Sensor-side half of the threaded pipeline.
///
/// Lives on the sensor delivery context; one producer only. Every method is
/// non-blocking.
pub struct SensorFrontend {
    config: PipelineConfig,
    assembler: SampleAssembler,
    window: SlidingWindow,
    flight: SingleFlight,
    requests: Sender<InferenceRequest>,
}

impl SensorFrontend {
    /// Accelerometer event; `timestamp` in seconds since pipeline start.
    pub fn on_acceleration(&mut self, acceleration: [f32; 3], timestamp: f64) {
        let completed = self.assembler.set_acceleration(acceleration, timestamp);
        self.process_completion(completed);
    }

    /// Orientation event.
    pub fn on_orientation(&mut self, orientation: Quaternion, timestamp: f64) {
        let completed = self.assembler.set_orientation(orientation, timestamp);
        self.process_completion(completed);
    }

    /// EMG event.
    pub fn on_emg(&mut self, emg: [i8; EMG_CHANNELS], timestamp: f64) {
        let completed = self.assembler.set_emg(emg, timestamp);
        self.process_completion(completed);
    }

    /// Label the in-progress sample for training-data capture.
    pub fn set_gesture_label(&mut self, is_gesture: bool) {
        self.assembler.set_gesture_label(is_gesture);
    }

    /// True while an inference is in flight on the worker.
    pub fn is_predicting(&self) -> bool {
        self.flight.is_active()
    }

    /// Number of frames currently buffered.
    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    fn process_completion(&mut self, completed: Option<RawSample>) {
        let Some(raw) = completed else { return };

        if self.config.log_csv {
            if let Some(line) = csv_line(&raw) {
                info!(target: CSV_TARGET, "{line}");
            }
        }

        let Some(sample) = normalize(&raw) else {
            trace!("incomplete sample dropped before normalization");
            return;
        };

        self.window.push(sample);
        if !self.window.is_full() {
            return;
        }

        // Single-flight: claim the flag before dispatch; a busy flag means
        // this tick is skipped outright.
        let Some(permit) = self.flight.try_acquire() else {
            trace!("inference in flight, window tick skipped");
            return;
        };

        let request = InferenceRequest {
            frames: self.window.snapshot(),
            permit,
        };
        match self.requests.try_send(request) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                // Cannot happen while the permit gates dispatch, but a
                // dropped request must not leak the permit either way.
                trace!("inference queue full, window tick skipped");
            }
            Err(TrySendError::Disconnected(_)) => {
                warn!("inference worker gone, window tick dropped");
            }
        }
    }
}

/// Spawn the inference worker and return the sensor frontend plus the host
/// event receiver.
///
/// The worker owns the model and everything downstream of the window. It
/// exits when the frontend is dropped (request channel closes) or when the
/// host stops listening (event channel closes). In-flight inference always
/// runs to completion; there are no timeouts.
pub fn spawn_pipeline<M>(
    model: M,
    config: PipelineConfig,
) -> (SensorFrontend, Receiver<PipelineEvent>)
where
    M: GestureModel + Send + 'static,
{
    let started = Instant::now();
    let stage = InferenceStage::new(model, &config, 0.0);
    let flight = stage.flight();

    // The permit guarantees at most one outstanding request.
    let (request_tx, request_rx) = bounded::<InferenceRequest>(1);
    let (event_tx, event_rx) = unbounded::<PipelineEvent>();

    thread::spawn(move || inference_loop(stage, request_rx, event_tx, started));

    let frontend = SensorFrontend {
        assembler: SampleAssembler::new(),
        window: SlidingWindow::with_capacity(config.frame_size),
        flight,
        requests: request_tx,
        config,
    };
    (frontend, event_rx)
}

fn inference_loop<M: GestureModel>(
    mut stage: InferenceStage<M>,
    requests: Receiver<InferenceRequest>,
    events: Sender<PipelineEvent>,
    started: Instant,
) {
    info!("inference worker started");

    for request in requests.iter() {
        let now = started.elapsed().as_secs_f64();
        let outcome = stage.run_tick_with_permit(&request.frames, request.permit, now);

        let Some(pair) = outcome.prediction else {
            continue;
        };
        if events.send(PipelineEvent::Prediction(pair)).is_err() {
            warn!("event channel closed, stopping inference worker");
            return;
        }
        if outcome.recognized && events.send(PipelineEvent::GestureRecognized).is_err() {
            warn!("event channel closed, stopping inference worker");
            return;
        }
    }

    info!("sensor frontend dropped, inference worker exiting");
}
