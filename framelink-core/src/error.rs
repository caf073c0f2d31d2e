//! Error types for the streaming pipeline.
//!
//! Per-frame failures ([`EncodeError`]) are absorbed by the controller
//! and never escalate; per-connection failures ([`ConnectError`],
//! [`SendError`]) end the current session cycle and are surfaced
//! through the status channel. No fallible operation panics.

use std::time::Duration;

use thiserror::Error;

use crate::state::SessionState;

// ── EncodeError ──────────────────────────────────────────────────

/// A frame could not be compressed.
///
/// Always non-fatal: the controller logs it, counts the frame as
/// dropped, and continues with the next one.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The frame declares no pixels.
    #[error("zero-sized frame: {width}x{height}")]
    EmptyFrame { width: u32, height: u32 },

    /// The pixel buffer is shorter than the declared dimensions require.
    #[error("pixel buffer too short: {actual} bytes, need {expected}")]
    BufferTooShort { expected: usize, actual: usize },

    /// The declared row pitch cannot hold a full row of pixels.
    #[error("stride {stride} smaller than row width {row_bytes}")]
    StrideMismatch { stride: u32, row_bytes: usize },

    /// The JPEG codec rejected the frame.
    #[error("jpeg codec: {0}")]
    Codec(#[from] image::ImageError),
}

// ── ConnectError ─────────────────────────────────────────────────

/// Opening a session failed.
///
/// The session is left in `Failed`; reconnecting is the caller's
/// decision, never an internal retry.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// The endpoint string is not a valid WebSocket address.
    #[error("invalid endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// The transport handshake was rejected by the remote end.
    #[error("handshake rejected: {0}")]
    Handshake(String),

    /// The connection attempt exceeded its deadline.
    #[error("connect timed out after {0:?}")]
    Timeout(Duration),

    /// The network layer reported an error before the handshake completed.
    #[error("transport: {0}")]
    Io(#[from] std::io::Error),

    /// `open` was called on a session that already left `Disconnected`.
    #[error(transparent)]
    State(#[from] InvalidTransition),
}

// ── SendError ────────────────────────────────────────────────────

/// A mid-stream transmission failed.
///
/// The session transitions to `Failed` and the payload is lost; the
/// session never retries on its own.
#[derive(Debug, Error)]
pub enum SendError {
    /// `send` was called outside the `Open` state.
    #[error("session is not open (state: {state})")]
    NotOpen { state: SessionState },

    /// The transmission exceeded its deadline.
    #[error("send timed out after {0:?}")]
    Timeout(Duration),

    /// The transport reported a failure or the remote end closed.
    #[error("transport: {0}")]
    Transport(String),
}

// ── InvalidTransition ────────────────────────────────────────────

/// A session state transition was requested from a state that does
/// not permit it.
#[derive(Debug, Error)]
#[error("invalid session transition: {0}")]
pub struct InvalidTransition(pub &'static str);

// ── CaptureError ─────────────────────────────────────────────────

/// The capture collaborator failed to deliver frames.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The source was asked to start a second time.
    #[error("capture source already running")]
    AlreadyRunning,

    /// The source reported a device-side failure.
    #[error("capture source failed: {0}")]
    Source(String),
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let e = EncodeError::BufferTooShort {
            expected: 1000,
            actual: 500,
        };
        assert!(e.to_string().contains("1000"));
        assert!(e.to_string().contains("500"));

        let e = ConnectError::Timeout(Duration::from_secs(10));
        assert!(e.to_string().contains("10s"));

        let e = SendError::NotOpen {
            state: SessionState::Failed,
        };
        assert!(e.to_string().contains("Failed"));
    }

    #[test]
    fn from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let e: ConnectError = io_err.into();
        assert!(matches!(e, ConnectError::Io(_)));
    }
}
