//! Camera lifecycle state machine gating the capture/inference loop.

use std::sync::Arc;

use frame_ingest::{CaptureError, FrameSource};
use serde::Serialize;
use tracing::{info, warn};

use crate::gesture::display::{DisplaySink, Layout};

pub(crate) const MSG_REQUESTING: &str = "Requesting camera access...";
pub(crate) const MSG_READY: &str = "Camera ready. Press Enter to start recognition.";
pub(crate) const MSG_DENIED: &str =
    "Camera access denied. Enable camera permissions and restart.";
pub(crate) const MSG_ERRORED: &str = "Error: could not access camera.";
pub(crate) const MSG_LOST: &str = "Camera feed lost.";
pub(crate) const LABEL_OFF: &str = "Camera Off";
pub(crate) const LABEL_INITIALIZING: &str = "Initializing...";

/// Operational state of the capture device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraState {
    Requesting,
    Ready,
    Active,
    Denied,
    Lost,
    Errored,
}

impl CameraState {
    /// Whether the capture/inference loop may be scheduled.
    pub fn allows_loop(self) -> bool {
        matches!(self, CameraState::Active)
    }
}

/// Owns the frame source and its operational state.
///
/// Transitions are one-directional; Active → Lost is terminal for the
/// process (recovery means restarting the program).
pub struct CameraController<S: FrameSource> {
    state: CameraState,
    source: Option<S>,
    display: Arc<dyn DisplaySink>,
}

impl<S: FrameSource> CameraController<S> {
    pub fn new(display: Arc<dyn DisplaySink>) -> Self {
        display.set_state(CameraState::Requesting);
        display.show_status(MSG_REQUESTING);
        Self {
            state: CameraState::Requesting,
            source: None,
            display,
        }
    }

    pub fn state(&self) -> CameraState {
        self.state
    }

    /// Acquire the capture device. Success parks the controller in `Ready`;
    /// the loop starts only on an explicit [`activate`](Self::activate).
    /// Returns whether the application can proceed.
    pub fn request_access<F>(&mut self, open: F) -> bool
    where
        F: FnOnce() -> Result<S, CaptureError>,
    {
        match open() {
            Ok(source) => {
                self.source = Some(source);
                self.transition(CameraState::Ready);
                self.display.show_status(MSG_READY);
                true
            }
            Err(CaptureError::PermissionDenied) => {
                warn!("camera access denied");
                self.transition(CameraState::Denied);
                self.display.show_status(MSG_DENIED);
                self.display.show_label(LABEL_OFF);
                false
            }
            Err(err) => {
                warn!("camera acquisition failed: {err}");
                self.transition(CameraState::Errored);
                self.display.show_status(MSG_ERRORED);
                self.display.show_label(LABEL_OFF);
                false
            }
        }
    }

    /// Explicit user trigger; only valid from `Ready`.
    pub fn activate(&mut self) -> bool {
        if self.state != CameraState::Ready {
            warn!("activation ignored in state {:?}", self.state);
            return false;
        }
        self.transition(CameraState::Active);
        self.display.set_layout(Layout::Active);
        self.display.clear_status();
        self.display.show_label(LABEL_INITIALIZING);
        true
    }

    /// Invoked at the top of each loop tick. An absent or inactive stream
    /// moves the controller to `Lost` and reverts the lobby presentation.
    pub fn check_stream_health(&mut self) -> bool {
        if self.state != CameraState::Active {
            return false;
        }
        let healthy = self
            .source
            .as_ref()
            .map(FrameSource::is_active)
            .unwrap_or(false);
        if !healthy {
            self.mark_lost();
        }
        healthy
    }

    pub(crate) fn source_mut(&mut self) -> Option<&mut S> {
        self.source.as_mut()
    }

    fn mark_lost(&mut self) {
        warn!("camera stream lost; stopping inference loop");
        self.transition(CameraState::Lost);
        self.display.set_layout(Layout::Lobby);
        self.display.show_status(MSG_LOST);
        self.display.show_label(LABEL_OFF);
    }

    fn transition(&mut self, next: CameraState) {
        info!("camera state {:?} -> {:?}", self.state, next);
        self.state = next;
        self.display.set_state(next);
    }
}
