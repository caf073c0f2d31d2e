//! Frame representations used between pipeline stages.
//!
//! [`CameraFrame`] is the raw, uncompressed form handed over by the
//! capture collaborator; it lives only until the encode step.
//! [`EncodedFrame`] is the compressed form that travels through the
//! gate and onto the wire.

use std::time::Instant;

use bytes::Bytes;

// ── PixelFormat ──────────────────────────────────────────────────

/// Pixel layout for raw captured frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 4 bytes per pixel: Red, Green, Blue, Alpha.
    Rgba8,
    /// 4 bytes per pixel: Blue, Green, Red, Alpha.
    Bgra8,
    /// 3 bytes per pixel: Red, Green, Blue.
    Rgb8,
}

impl PixelFormat {
    /// Bytes consumed by a single pixel in this format.
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgba8 | PixelFormat::Bgra8 => 4,
            PixelFormat::Rgb8 => 3,
        }
    }
}

// ── CameraFrame ──────────────────────────────────────────────────

/// A raw, uncompressed frame obtained from the capture device.
///
/// The `data` buffer holds `height` rows of `stride` bytes each.
/// `stride` may exceed `width * bytes_per_pixel` when the device pads
/// rows for alignment; the encoder strips the padding.
#[derive(Debug, Clone)]
pub struct CameraFrame {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Row pitch in **bytes** (may exceed `width * bpp`).
    pub stride: u32,
    /// Pixel layout.
    pub format: PixelFormat,
    /// Raw pixel data — `stride * height` bytes.
    pub data: Vec<u8>,
    /// Monotonic capture timestamp.
    pub timestamp: Instant,
}

impl CameraFrame {
    /// Total byte size the raw bitmap occupies.
    pub fn byte_len(&self) -> usize {
        self.stride as usize * self.height as usize
    }

    /// Returns row `y` without its padding bytes.
    ///
    /// # Panics
    ///
    /// Panics if `y` is out of bounds.
    pub fn tight_row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride as usize;
        let row_len = self.width as usize * self.format.bytes_per_pixel();
        &self.data[start..start + row_len]
    }
}

// ── EncodedFrame ─────────────────────────────────────────────────

/// A compressed frame ready for network transmission.
#[derive(Debug, Clone)]
pub struct EncodedFrame {
    /// Sequence number, monotonic within one streaming cycle.
    pub sequence: u64,
    /// Capture timestamp of the source frame.
    pub timestamp: Instant,
    /// Compressed payload (JPEG).
    pub data: Bytes,
}

// ── Tests ────────────────────────────────────────────────────────
