//! Capture-side interface.
//!
//! The capture device is an external collaborator; the core only
//! requires something that yields frames at its own cadence. The
//! synthetic [`TestPatternSource`] stands in for real hardware in the
//! reference client and in tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use crate::error::CaptureError;
use crate::frame::{CameraFrame, PixelFormat};

// ── FrameSource ──────────────────────────────────────────────────

/// A producer of raw frames.
///
/// The source owns its own thread and cadence; frames are handed off
/// by value through the returned channel.
pub trait FrameSource {
    fn start_capture(&mut self) -> Result<mpsc::Receiver<CameraFrame>, CaptureError>;
}

// ── TestPatternSource ────────────────────────────────────────────

/// Synthetic frame source producing a moving RGBA gradient.
pub struct TestPatternSource {
    width: u32,
    height: u32,
    fps: u32,
    frame_limit: Option<u64>,
    running: Arc<AtomicBool>,
    started: bool,
}

impl TestPatternSource {
    pub fn new(width: u32, height: u32, fps: u32) -> Self {
        Self {
            width,
            height,
            fps: fps.max(1),
            frame_limit: None,
            running: Arc::new(AtomicBool::new(false)),
            started: false,
        }
    }

    /// Stop after producing `limit` frames (for tests and demos).
    pub fn with_frame_limit(mut self, limit: u64) -> Self {
        self.frame_limit = Some(limit);
        self
    }

    /// A handle that stops the source from another thread or task:
    /// store `false` to end production.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }
}

impl FrameSource for TestPatternSource {
    fn start_capture(&mut self) -> Result<mpsc::Receiver<CameraFrame>, CaptureError> {
        if self.started {
            return Err(CaptureError::AlreadyRunning);
        }
        self.started = true;
        self.running.store(true, Ordering::SeqCst);

        let (tx, rx) = mpsc::channel();
        let (width, height) = (self.width, self.height);
        let interval = Duration::from_secs_f64(1.0 / self.fps as f64);
        let limit = self.frame_limit;
        let running = Arc::clone(&self.running);

        thread::spawn(move || {
            let mut tick: u64 = 0;
            while running.load(Ordering::SeqCst) && limit.is_none_or(|l| tick < l) {
                if tx.send(pattern_frame(width, height, tick)).is_err() {
                    break; // receiver dropped
                }
                tick += 1;
                thread::sleep(interval);
            }
            running.store(false, Ordering::SeqCst);
        });

        Ok(rx)
    }
}

fn pattern_frame(width: u32, height: u32, tick: u64) -> CameraFrame {
    let shift = (tick & 0xFF) as u32;
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            data.push(((x + shift) & 0xFF) as u8);
            data.push(((y + shift) & 0xFF) as u8);
            data.push(((x ^ y) & 0xFF) as u8);
            data.push(0xFF);
        }
    }
    CameraFrame {
        width,
        height,
        stride: width * 4,
        format: PixelFormat::Rgba8,
        data,
        timestamp: Instant::now(),
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produces_frames_with_declared_geometry() {
        let mut source = TestPatternSource::new(32, 24, 100).with_frame_limit(3);
        let rx = source.start_capture().unwrap();

        let frames: Vec<_> = rx.into_iter().collect();
        assert_eq!(frames.len(), 3);
        for frame in &frames {
            assert_eq!(frame.width, 32);
            assert_eq!(frame.height, 24);
            assert_eq!(frame.format, PixelFormat::Rgba8);
            assert_eq!(frame.data.len(), frame.byte_len());
        }
    }

    #[test]
    fn pattern_moves_between_ticks() {
        let a = pattern_frame(16, 16, 0);
        let b = pattern_frame(16, 16, 1);
        assert_ne!(a.data, b.data);
    }

    #[test]
    fn cannot_start_twice() {
        let mut source = TestPatternSource::new(8, 8, 100).with_frame_limit(1);
        let _rx = source.start_capture().unwrap();
        assert!(matches!(
            source.start_capture(),
            Err(CaptureError::AlreadyRunning)
        ));
    }

    #[test]
    fn stop_handle_ends_production() {
        let mut source = TestPatternSource::new(8, 8, 200);
        let stop = source.stop_handle();
        let rx = source.start_capture().unwrap();

        rx.recv_timeout(Duration::from_secs(1)).unwrap();
        stop.store(false, Ordering::SeqCst);

        // Drain whatever is in flight; the channel must then close.
        while rx.recv_timeout(Duration::from_secs(1)).is_ok() {}
    }
}
