//! Fixed-cadence capture/inference loop.
//!
//! Each tick verifies stream health, samples the newest frame, and spawns an
//! asynchronous round-trip to the inference endpoint. Round-trips are not
//! serialized against the tick cadence: a slow endpoint simply means more
//! requests in flight, and completion order decides which label lands last
//! in the smoothing window.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};
use std::time::Duration;

use anyhow::{Result, bail};
use frame_ingest::{Frame, FrameSource};
use tokio::task::JoinHandle;
use tracing::{debug, error, trace, warn};

use crate::gesture::{
    client::InferenceService,
    config::GestureConfig,
    display::DisplaySink,
    encoding,
    lifecycle::CameraController,
    smoother::PredictionSmoother,
};

/// Shown on the label area while the endpoint is unreachable.
const LABEL_CONNECTING: &str = "Connecting...";

/// Cooperative stop flag shared with in-flight round-trips.
#[derive(Clone)]
pub struct ShutdownHandle(Arc<AtomicBool>);

impl ShutdownHandle {
    pub fn stop(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Outcome of a single tick.
pub(crate) enum TickFlow {
    /// Stream went unhealthy; the loop must stop.
    Stop,
    /// Healthy, but no frame is available yet.
    Skipped,
    /// One round-trip was dispatched.
    Dispatched(JoinHandle<()>),
}

pub struct GesturePipeline<S: FrameSource> {
    controller: CameraController<S>,
    service: Arc<dyn InferenceService>,
    smoother: Arc<Mutex<PredictionSmoother>>,
    display: Arc<dyn DisplaySink>,
    running: Arc<AtomicBool>,
    tick_interval: Duration,
    confidence_threshold: f64,
}

impl<S: FrameSource> GesturePipeline<S> {
    pub fn new(
        controller: CameraController<S>,
        service: Arc<dyn InferenceService>,
        display: Arc<dyn DisplaySink>,
        config: &GestureConfig,
    ) -> Self {
        Self {
            controller,
            service,
            smoother: Arc::new(Mutex::new(PredictionSmoother::new(config.window))),
            display,
            running: Arc::new(AtomicBool::new(true)),
            tick_interval: Duration::from_millis(config.interval_ms),
            confidence_threshold: config.confidence_threshold,
        }
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle(self.running.clone())
    }

    /// Run ticks at the fixed cadence until the stream is lost or a shutdown
    /// handle fires. Dispatched round-trips complete (or discard themselves)
    /// on their own; they are never awaited by the loop.
    pub async fn run(mut self) -> Result<()> {
        if !self.controller.state().allows_loop() {
            bail!("capture loop requires an active camera");
        }

        let mut ticker = tokio::time::interval(self.tick_interval);
        while self.running.load(Ordering::SeqCst) {
            ticker.tick().await;
            if !self.running.load(Ordering::SeqCst) {
                break;
            }
            if let TickFlow::Stop = self.tick() {
                break;
            }
        }
        debug!("capture loop stopped");
        Ok(())
    }

    /// One loop iteration: health check, frame grab, dispatch.
    pub(crate) fn tick(&mut self) -> TickFlow {
        metrics::counter!("gesture_ticks_total").increment(1);

        if !self.controller.check_stream_health() {
            self.running.store(false, Ordering::SeqCst);
            return TickFlow::Stop;
        }

        let frame = self
            .controller
            .source_mut()
            .and_then(FrameSource::latest_frame);
        let Some(frame) = frame else {
            trace!("no frame available this tick");
            return TickFlow::Skipped;
        };

        metrics::counter!("gesture_frames_submitted_total").increment(1);
        TickFlow::Dispatched(self.dispatch(frame))
    }

    /// Spawn the encode → upload → route round-trip for one frame.
    fn dispatch(&self, frame: Frame) -> JoinHandle<()> {
        let service = self.service.clone();
        let smoother = self.smoother.clone();
        let display = self.display.clone();
        let running = self.running.clone();
        let threshold = self.confidence_threshold;

        tokio::spawn(async move {
            metrics::gauge!("gesture_inflight_requests").increment(1.0);
            round_trip(frame, service, smoother, display, running, threshold).await;
            metrics::gauge!("gesture_inflight_requests").decrement(1.0);
        })
    }
}

async fn round_trip(
    frame: Frame,
    service: Arc<dyn InferenceService>,
    smoother: Arc<Mutex<PredictionSmoother>>,
    display: Arc<dyn DisplaySink>,
    running: Arc<AtomicBool>,
    threshold: f64,
) {
    let encoded = tokio::task::spawn_blocking(move || encoding::encode_png(&frame)).await;
    let png = match encoded {
        Ok(Ok(png)) => png,
        Ok(Err(err)) => {
            warn!("frame encoding failed: {err:#}");
            return;
        }
        Err(err) => {
            warn!("frame encoding task failed: {err}");
            return;
        }
    };

    match service.classify(png).await {
        Err(err) => {
            // Transient: the next scheduled tick is the implicit retry.
            warn!("inference request failed: {err}");
            metrics::counter!("gesture_transport_errors_total").increment(1);
            if running.load(Ordering::SeqCst) {
                display.show_label(LABEL_CONNECTING);
            }
        }
        Ok(response) => {
            if let Some(message) = response.error.as_deref() {
                error!("prediction service error: {message}");
                metrics::counter!("gesture_service_errors_total").increment(1);
                return;
            }
            let Some(prediction) = response.prediction() else {
                return;
            };
            if !prediction.passes_gate(threshold) {
                trace!(
                    "discarding low-confidence prediction {:?} ({:.3})",
                    prediction.label, prediction.confidence
                );
                metrics::counter!("gesture_low_confidence_total").increment(1);
                return;
            }
            // A round-trip that outlives the active stream must not touch
            // the smoothing window.
            if !running.load(Ordering::SeqCst) {
                debug!("discarding late prediction {:?} after loop stop", prediction.label);
                return;
            }
            let update = match smoother.lock() {
                Ok(mut guard) => guard.observe(prediction.label),
                Err(_) => return,
            };
            if let Some(text) = update {
                metrics::counter!("gesture_label_updates_total").increment(1);
                display.show_label(&text);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use async_trait::async_trait;
    use frame_ingest::{CaptureError, FrameFormat};

    use super::*;
    use crate::gesture::client::{Confidence, InferenceError, PredictResponse};
    use crate::gesture::display::StatusBoard;
    use crate::gesture::lifecycle::CameraState;

    struct TestSource {
        frames: bool,
    }

    impl FrameSource for TestSource {
        fn latest_frame(&mut self) -> Option<Frame> {
            self.frames.then(|| Frame {
                data: vec![0; 4 * 4 * 3],
                width: 4,
                height: 4,
                timestamp_ms: 0,
                format: FrameFormat::Rgb8,
            })
        }

        fn is_active(&self) -> bool {
            true
        }
    }

    struct ScriptedService {
        responses: Mutex<VecDeque<PredictResponse>>,
    }

    impl ScriptedService {
        fn repeating(label: &str, confidence: f64, count: usize) -> Arc<Self> {
            let response = PredictResponse {
                predicted_gesture: Some(label.to_string()),
                confidence: Some(Confidence::Number(confidence)),
                error: None,
            };
            Arc::new(Self {
                responses: Mutex::new(std::iter::repeat(response).take(count).collect()),
            })
        }
    }

    #[async_trait]
    impl InferenceService for ScriptedService {
        async fn classify(&self, _png: Vec<u8>) -> Result<PredictResponse, InferenceError> {
            let next = self
                .responses
                .lock()
                .expect("responses mutex")
                .pop_front()
                .expect("scripted response available");
            Ok(next)
        }
    }

    fn active_pipeline(
        service: Arc<dyn InferenceService>,
        frames: bool,
    ) -> (GesturePipeline<TestSource>, Arc<StatusBoard>) {
        let board = Arc::new(StatusBoard::new());
        let mut controller = CameraController::new(board.clone());
        assert!(controller.request_access(move || Ok::<_, CaptureError>(TestSource { frames })));
        assert!(controller.activate());

        let config = GestureConfig {
            interval_ms: 1,
            ..GestureConfig::default()
        };
        let pipeline = GesturePipeline::new(controller, service, board.clone(), &config);
        (pipeline, board)
    }

    async fn run_ticks(pipeline: &mut GesturePipeline<TestSource>, count: usize) {
        for _ in 0..count {
            match pipeline.tick() {
                TickFlow::Dispatched(handle) => handle.await.expect("round-trip task"),
                TickFlow::Skipped => {}
                TickFlow::Stop => panic!("unexpected loop stop"),
            }
        }
    }

    #[tokio::test]
    async fn ten_confident_frames_promote_the_label() {
        let service = ScriptedService::repeating("open_palm", 0.9, 10);
        let (mut pipeline, board) = active_pipeline(service, true);

        run_ticks(&mut pipeline, 10).await;

        let smoother = pipeline.smoother.lock().expect("smoother mutex");
        assert_eq!(smoother.displayed(), "open_palm");
        drop(smoother);
        assert_eq!(board.snapshot().label, "open palm");
    }

    #[tokio::test]
    async fn low_confidence_frames_never_enter_the_window() {
        let service = ScriptedService::repeating("open_palm", 0.75, 12);
        let (mut pipeline, board) = active_pipeline(service, true);

        run_ticks(&mut pipeline, 12).await;

        let smoother = pipeline.smoother.lock().expect("smoother mutex");
        assert_eq!(smoother.window_len(), 0);
        drop(smoother);
        assert_eq!(board.snapshot().label, "Initializing...");
    }

    #[tokio::test]
    async fn ticks_without_frames_are_skipped() {
        let service = ScriptedService::repeating("open_palm", 0.9, 1);
        let (mut pipeline, _board) = active_pipeline(service, false);

        assert!(matches!(pipeline.tick(), TickFlow::Skipped));
    }

    #[tokio::test]
    async fn run_rejects_inactive_camera() {
        let board = Arc::new(StatusBoard::new());
        let mut controller: CameraController<TestSource> = CameraController::new(board.clone());
        assert!(controller.request_access(|| Ok(TestSource { frames: true })));
        assert_eq!(controller.state(), CameraState::Ready);

        let service = ScriptedService::repeating("open_palm", 0.9, 1);
        let config = GestureConfig::default();
        let pipeline = GesturePipeline::new(controller, service, board, &config);
        assert!(pipeline.run().await.is_err());
    }
}
