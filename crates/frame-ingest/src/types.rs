//! Shared types at the frame-source boundary.

use thiserror::Error;

/// Raw RGB frame captured from a video source.
#[derive(Clone)]
pub struct Frame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub timestamp_ms: i64,
    pub format: FrameFormat,
}

#[derive(Clone, Copy)]
pub enum FrameFormat {
    Rgb8,
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("camera access denied")]
    PermissionDenied,
    #[error("failed to open video source {uri:?}")]
    Open { uri: String },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
