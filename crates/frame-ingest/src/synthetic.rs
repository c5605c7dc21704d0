//! Synthetic capture source producing a moving test pattern.
//!
//! A background thread renders frames at roughly 30 fps and forwards them
//! over a bounded channel. The buffer is intentionally small to backpressure
//! the producer when the consumer falls behind.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

use chrono::Utc;
use crossbeam_channel::{Receiver, Sender, TryRecvError, bounded};
use tracing::debug;

use crate::{CaptureError, Frame, FrameFormat, FrameSource};

const CHANNEL_DEPTH: usize = 2;
const FRAME_PERIOD: Duration = Duration::from_millis(33);

/// Test-pattern stream standing in for a real capture device.
pub struct SyntheticSource {
    rx: Receiver<Frame>,
    current: Option<Frame>,
    stop: Arc<AtomicBool>,
    disconnected: bool,
}

impl SyntheticSource {
    /// Open a synthetic RGB stream at the requested resolution.
    pub fn open(width: u32, height: u32) -> Result<Self, CaptureError> {
        if width == 0 || height == 0 {
            return Err(CaptureError::Open {
                uri: format!("synthetic:{width}x{height}"),
            });
        }

        let (tx, rx) = bounded(CHANNEL_DEPTH);
        let stop = Arc::new(AtomicBool::new(false));
        let producer_stop = stop.clone();
        thread::Builder::new()
            .name("frame-ingest-synthetic".into())
            .spawn(move || pattern_loop(width, height, producer_stop, tx))
            .map_err(|err| CaptureError::Other(err.into()))?;

        Ok(Self {
            rx,
            current: None,
            stop,
            disconnected: false,
        })
    }

    /// Halt the producer thread; the source reports inactive from then on.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

impl FrameSource for SyntheticSource {
    fn latest_frame(&mut self) -> Option<Frame> {
        loop {
            match self.rx.try_recv() {
                Ok(frame) => self.current = Some(frame),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.disconnected = true;
                    break;
                }
            }
        }
        self.current.clone()
    }

    fn is_active(&self) -> bool {
        !self.disconnected && !self.stop.load(Ordering::SeqCst)
    }
}

impl Drop for SyntheticSource {
    fn drop(&mut self) {
        self.stop();
    }
}

fn pattern_loop(width: u32, height: u32, stop: Arc<AtomicBool>, tx: Sender<Frame>) {
    let mut index: u64 = 0;
    while !stop.load(Ordering::SeqCst) {
        let frame = Frame {
            data: render_pattern(width, height, index),
            width,
            height,
            timestamp_ms: Utc::now().timestamp_millis(),
            format: FrameFormat::Rgb8,
        };
        index = index.wrapping_add(1);
        if tx.send(frame).is_err() {
            break;
        }
        thread::sleep(FRAME_PERIOD);
    }
    debug!("synthetic source stopped after {index} frames");
}

/// Horizontal gradient with a white bar sweeping one column per frame.
fn render_pattern(width: u32, height: u32, index: u64) -> Vec<u8> {
    let mut data = Vec::with_capacity((width * height * 3) as usize);
    let bar = (index % u64::from(width)) as u32;
    for y in 0..height {
        for x in 0..width {
            if x == bar {
                data.extend_from_slice(&[255, 255, 255]);
            } else {
                let r = (x * 255 / width) as u8;
                let g = (y * 255 / height) as u8;
                data.extend_from_slice(&[r, g, 64]);
            }
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    #[test]
    fn rejects_zero_resolution() {
        assert!(matches!(
            SyntheticSource::open(0, 480),
            Err(CaptureError::Open { .. })
        ));
    }

    #[test]
    fn produces_frames_until_stopped() {
        let mut source = SyntheticSource::open(8, 8).expect("open synthetic source");
        assert!(source.is_active());

        let deadline = Instant::now() + Duration::from_secs(5);
        let frame = loop {
            if let Some(frame) = source.latest_frame() {
                break frame;
            }
            assert!(Instant::now() < deadline, "no frame before deadline");
            thread::sleep(Duration::from_millis(5));
        };
        assert_eq!(frame.width, 8);
        assert_eq!(frame.height, 8);
        assert_eq!(frame.data.len(), 8 * 8 * 3);

        source.stop();
        assert!(!source.is_active());
    }

    #[test]
    fn pattern_matches_requested_dimensions() {
        let data = render_pattern(4, 2, 1);
        assert_eq!(data.len(), 4 * 2 * 3);
        // The sweeping bar sits at column 1 for frame index 1.
        assert_eq!(&data[3..6], &[255, 255, 255]);
    }
}
