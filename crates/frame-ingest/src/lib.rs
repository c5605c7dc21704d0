//! Frame acquisition boundary for the gesture pipeline.
//!
//! Deployments plug a device-backed implementation of [`FrameSource`] into
//! the app; this crate ships the shared frame types plus a synthetic source
//! that renders a moving test pattern for demos and tests.

pub use synthetic::SyntheticSource;
pub use types::{CaptureError, Frame, FrameFormat};

mod synthetic;
pub mod types;

/// Pull-based video source sampled once per capture tick.
pub trait FrameSource {
    /// Newest frame produced since the stream opened, if any. Frames that
    /// arrived between two calls are discarded in favour of the latest one.
    fn latest_frame(&mut self) -> Option<Frame>;

    /// Whether the underlying stream is still delivering frames.
    fn is_active(&self) -> bool;
}
