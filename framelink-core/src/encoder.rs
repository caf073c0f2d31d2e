//! JPEG frame encoder.
//!
//! Converts one raw [`CameraFrame`] into a compressed [`EncodedFrame`]
//! at a fixed quality chosen at construction. The encoder holds no
//! mutable state: sequence numbers are supplied by the caller, so the
//! same instance can encode independent frames from any thread.

use bytes::Bytes;
use image::ImageEncoder;
use image::codecs::jpeg::JpegEncoder;

use crate::error::EncodeError;
use crate::frame::{CameraFrame, EncodedFrame, PixelFormat};

// ── FrameEncoder ─────────────────────────────────────────────────

/// Fixed-quality JPEG encoder.
#[derive(Debug, Clone)]
pub struct FrameEncoder {
    /// JPEG quality, 1..=100.
    quality: u8,
}

impl FrameEncoder {
    /// Default JPEG quality.
    pub const DEFAULT_QUALITY: u8 = 85;

    /// Create an encoder with the given JPEG quality (clamped to
    /// 1..=100).
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    /// The configured JPEG quality.
    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Compress `frame` into a JPEG payload tagged with `sequence`.
    ///
    /// Deterministic for a given frame and quality. Fails if the
    /// frame's declared geometry does not match its buffer.
    pub fn encode(
        &self,
        frame: &CameraFrame,
        sequence: u64,
    ) -> Result<EncodedFrame, EncodeError> {
        self.validate(frame)?;

        let rgb = pack_rgb(frame);
        let mut out = Vec::with_capacity(rgb.len() / 8);
        JpegEncoder::new_with_quality(&mut out, self.quality).write_image(
            &rgb,
            frame.width,
            frame.height,
            image::ExtendedColorType::Rgb8,
        )?;

        Ok(EncodedFrame {
            sequence,
            timestamp: frame.timestamp,
            data: Bytes::from(out),
        })
    }

    fn validate(&self, frame: &CameraFrame) -> Result<(), EncodeError> {
        if frame.width == 0 || frame.height == 0 {
            return Err(EncodeError::EmptyFrame {
                width: frame.width,
                height: frame.height,
            });
        }
        let row_bytes = frame.width as usize * frame.format.bytes_per_pixel();
        if (frame.stride as usize) < row_bytes {
            return Err(EncodeError::StrideMismatch {
                stride: frame.stride,
                row_bytes,
            });
        }
        if frame.data.len() < frame.byte_len() {
            return Err(EncodeError::BufferTooShort {
                expected: frame.byte_len(),
                actual: frame.data.len(),
            });
        }
        Ok(())
    }
}

impl Default for FrameEncoder {
    fn default() -> Self {
        Self::new(Self::DEFAULT_QUALITY)
    }
}

// ── Pixel packing ────────────────────────────────────────────────

/// Repack the frame as tightly packed RGB rows: stride padding is
/// dropped and the alpha channel, if any, is discarded (JPEG carries
/// no alpha).
fn pack_rgb(frame: &CameraFrame) -> Vec<u8> {
    let w = frame.width as usize;
    let h = frame.height as usize;
    let mut out = Vec::with_capacity(w * h * 3);

    for y in 0..frame.height {
        let row = frame.tight_row(y);
        match frame.format {
            PixelFormat::Rgb8 => out.extend_from_slice(row),
            PixelFormat::Rgba8 => {
                for px in row.chunks_exact(4) {
                    out.extend_from_slice(&px[..3]);
                }
            }
            PixelFormat::Bgra8 => {
                for px in row.chunks_exact(4) {
                    out.extend_from_slice(&[px[2], px[1], px[0]]);
                }
            }
        }
    }

    out
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn rgba_frame(w: u32, h: u32, rgba: [u8; 4]) -> CameraFrame {
        let stride = w * 4;
        let mut data = Vec::with_capacity((stride * h) as usize);
        for _ in 0..w * h {
            data.extend_from_slice(&rgba);
        }
        CameraFrame {
            width: w,
            height: h,
            stride,
            format: PixelFormat::Rgba8,
            data,
            timestamp: Instant::now(),
        }
    }

    #[test]
    fn encodes_valid_jpeg() {
        let enc = FrameEncoder::default();
        let frame = rgba_frame(64, 48, [200, 30, 30, 255]);
        let encoded = enc.encode(&frame, 9).unwrap();

        assert_eq!(encoded.sequence, 9);
        assert!(!encoded.data.is_empty());
        // JPEG SOI / EOI markers.
        assert_eq!(&encoded.data[..2], &[0xFF, 0xD8]);
        assert_eq!(&encoded.data[encoded.data.len() - 2..], &[0xFF, 0xD9]);
    }

    #[test]
    fn encoding_is_deterministic() {
        let enc = FrameEncoder::new(80);
        let frame = rgba_frame(32, 32, [10, 120, 240, 255]);

        let a = enc.encode(&frame, 0).unwrap();
        let b = enc.encode(&frame, 1).unwrap();
        assert_eq!(a.data, b.data);
    }

    #[test]
    fn bgra_is_swizzled_to_match_rgba() {
        let enc = FrameEncoder::default();
        let rgba = rgba_frame(16, 16, [10, 20, 30, 255]);

        let mut bgra = rgba.clone();
        bgra.format = PixelFormat::Bgra8;
        for px in bgra.data.chunks_exact_mut(4) {
            px.swap(0, 2);
        }

        let a = enc.encode(&rgba, 0).unwrap();
        let b = enc.encode(&bgra, 0).unwrap();
        assert_eq!(a.data, b.data);
    }

    #[test]
    fn stride_padding_does_not_change_output() {
        let enc = FrameEncoder::default();
        let tight = rgba_frame(8, 8, [1, 2, 3, 255]);

        // Same pixels with 16 bytes of padding per row.
        let mut padded_data = Vec::new();
        for y in 0..8 {
            padded_data.extend_from_slice(tight.tight_row(y));
            padded_data.extend_from_slice(&[0xEE; 16]);
        }
        let padded = CameraFrame {
            width: 8,
            height: 8,
            stride: 8 * 4 + 16,
            format: PixelFormat::Rgba8,
            data: padded_data,
            timestamp: tight.timestamp,
        };

        let a = enc.encode(&tight, 0).unwrap();
        let b = enc.encode(&padded, 0).unwrap();
        assert_eq!(a.data, b.data);
    }

    #[test]
    fn rejects_zero_sized_frame() {
        let enc = FrameEncoder::default();
        let mut frame = rgba_frame(4, 4, [0, 0, 0, 255]);
        frame.width = 0;

        assert!(matches!(
            enc.encode(&frame, 0),
            Err(EncodeError::EmptyFrame { .. })
        ));
    }

    #[test]
    fn rejects_short_buffer() {
        let enc = FrameEncoder::default();
        let mut frame = rgba_frame(16, 16, [0, 0, 0, 255]);
        frame.data.truncate(frame.data.len() / 2);

        assert!(matches!(
            enc.encode(&frame, 0),
            Err(EncodeError::BufferTooShort { .. })
        ));
    }

    #[test]
    fn rejects_undersized_stride() {
        let enc = FrameEncoder::default();
        let mut frame = rgba_frame(16, 16, [0, 0, 0, 255]);
        frame.stride = 16; // needs 64

        assert!(matches!(
            enc.encode(&frame, 0),
            Err(EncodeError::StrideMismatch { .. })
        ));
    }

    #[test]
    fn quality_is_clamped() {
        assert_eq!(FrameEncoder::new(0).quality(), 1);
        assert_eq!(FrameEncoder::new(255).quality(), 100);
    }
}
