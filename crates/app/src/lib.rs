//! Live hand-gesture recognition front-end.
//!
//! Samples a video stream on a fixed cadence, submits frames to an external
//! inference service, and smooths the noisy per-frame predictions into a
//! stable user-visible label.

pub mod gesture;
