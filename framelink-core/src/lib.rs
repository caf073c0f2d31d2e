//! # framelink-core
//!
//! Client-side pipeline for streaming live camera frames to a remote
//! consumer over a persistent WebSocket connection.
//!
//! This crate contains:
//! - **Frame types**: `CameraFrame`, `EncodedFrame`, `PixelFormat`
//! - **Encoder**: `FrameEncoder` — fixed-quality JPEG compression
//! - **Gate**: `FrameGate` — single-slot, overwrite-on-offer relay
//!   that favours freshness over completeness under backpressure
//! - **Session**: `StreamSession` with an explicit `SessionState`
//!   machine owning one connection cycle
//! - **Controller**: `StreamController` — `start`/`stop` lifecycle,
//!   frame ingestion and the drain task
//! - **Source**: `FrameSource` — the capture collaborator boundary
//! - **Error**: typed, `thiserror`-based error hierarchy
//!
//! Under sustained network slowness the pipeline deliberately drops
//! stale frames: at most one encoded frame is ever pending, and a
//! newer frame overwrites it. Memory stays O(1) frames regardless of
//! encode or network latency.

pub mod controller;
pub mod encoder;
pub mod error;
pub mod frame;
pub mod gate;
pub mod session;
pub mod source;
pub mod state;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use controller::{StreamConfig, StreamController, StreamStats};
pub use encoder::FrameEncoder;
pub use error::{CaptureError, ConnectError, EncodeError, InvalidTransition, SendError};
pub use frame::{CameraFrame, EncodedFrame, PixelFormat};
pub use gate::FrameGate;
pub use session::{SessionConfig, StreamSession, StreamStatus};
pub use source::{FrameSource, TestPatternSource};
pub use state::SessionState;
