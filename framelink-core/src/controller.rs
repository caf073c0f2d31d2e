//! Pipeline orchestration.
//!
//! The controller wires the capture callback to the encoder, the
//! encoder to the gate, and drains the gate into the session on a
//! dedicated task. It owns the two-call lifecycle (`start` / `stop`)
//! and re-publishes session status for the control surface.
//!
//! One `start`/`stop` cycle creates and destroys exactly one session;
//! after a failure, streaming resumes only through an explicit new
//! `start`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, trace, warn};

use crate::encoder::FrameEncoder;
use crate::frame::CameraFrame;
use crate::gate::FrameGate;
use crate::session::{SessionConfig, StatusSender, StreamSession, StreamStatus};
use crate::state::SessionState;

// ── StreamConfig ─────────────────────────────────────────────────

/// Configuration for [`StreamController`].
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// JPEG quality, 1..=100.
    pub jpeg_quality: u8,
    /// Session network timeouts.
    pub session: SessionConfig,
    /// How long `stop` waits for the drain task before aborting it.
    pub stop_grace: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: FrameEncoder::DEFAULT_QUALITY,
            session: SessionConfig::default(),
            stop_grace: Duration::from_secs(10),
        }
    }
}

// ── StreamStats ──────────────────────────────────────────────────

/// Pipeline counters for the current streaming cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Frames successfully encoded and offered to the gate.
    pub frames_encoded: u64,
    /// Frames lost to encode failures or gate overwrites.
    pub frames_dropped: u64,
    /// Frames delivered to the network.
    pub frames_sent: u64,
    /// Compressed bytes delivered to the network.
    pub bytes_sent: u64,
}

#[derive(Debug, Default)]
struct StatsInner {
    frames_encoded: AtomicU64,
    frames_dropped: AtomicU64,
    frames_sent: AtomicU64,
    bytes_sent: AtomicU64,
}

impl StatsInner {
    fn snapshot(&self) -> StreamStats {
        StreamStats {
            frames_encoded: self.frames_encoded.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            frames_sent: self.frames_sent.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
        }
    }

    fn reset(&self) {
        self.frames_encoded.store(0, Ordering::Relaxed);
        self.frames_dropped.store(0, Ordering::Relaxed);
        self.frames_sent.store(0, Ordering::Relaxed);
        self.bytes_sent.store(0, Ordering::Relaxed);
    }
}

// ── StreamController ─────────────────────────────────────────────

/// Orchestrates capture ingestion, encoding, backpressure and the
/// network session.
pub struct StreamController {
    config: StreamConfig,
    encoder: FrameEncoder,
    gate: Arc<FrameGate>,
    streaming: AtomicBool,
    sequence: AtomicU64,
    stats: Arc<StatsInner>,
    status: StatusSender,
    drain: Option<JoinHandle<()>>,
}

impl StreamController {
    /// Create an idle controller.
    pub fn new(config: StreamConfig) -> Self {
        let encoder = FrameEncoder::new(config.jpeg_quality);
        let (status_tx, _status_rx) = watch::channel(StreamStatus::default());
        Self {
            config,
            encoder,
            gate: Arc::new(FrameGate::new()),
            streaming: AtomicBool::new(false),
            sequence: AtomicU64::new(0),
            stats: Arc::new(StatsInner::default()),
            status: Arc::new(status_tx),
            drain: None,
        }
    }

    /// Subscribe to session status transitions.
    pub fn status_receiver(&self) -> watch::Receiver<StreamStatus> {
        self.status.subscribe()
    }

    /// Counters for the current streaming cycle.
    pub fn stats(&self) -> StreamStats {
        self.stats.snapshot()
    }

    /// Whether frames offered via [`on_frame`](Self::on_frame) are
    /// currently being ingested.
    pub fn is_streaming(&self) -> bool {
        self.streaming.load(Ordering::SeqCst)
    }

    /// Begin a streaming cycle towards `endpoint`.
    ///
    /// No-op while a cycle is live. A previous cycle left in `Failed`
    /// is torn down first, so `start` doubles as the explicit reset
    /// after a failure.
    pub async fn start(&mut self, endpoint: impl Into<String>) {
        if let Some(drain) = &self.drain {
            let failed = self.status.borrow().state.is_failed();
            if !drain.is_finished() && !failed {
                debug!("start ignored: already streaming");
                return;
            }
        }
        self.shutdown_cycle().await;

        let endpoint = endpoint.into();
        self.sequence.store(0, Ordering::SeqCst);
        self.stats.reset();

        let gate = Arc::new(FrameGate::new());
        self.gate = Arc::clone(&gate);
        self.streaming.store(true, Ordering::SeqCst);

        let session = StreamSession::new(self.config.session.clone(), Arc::clone(&self.status));
        let stats = Arc::clone(&self.stats);
        self.drain = Some(tokio::spawn(drain(gate, session, endpoint, stats)));
    }

    /// End the current streaming cycle.
    ///
    /// Idempotent; completes in bounded time regardless of network
    /// state. Frames arriving after `stop` are discarded unencoded.
    pub async fn stop(&mut self) {
        self.streaming.store(false, Ordering::SeqCst);
        self.shutdown_cycle().await;
    }

    /// Ingest one captured frame.
    ///
    /// Called by the capture collaborator at the device's cadence;
    /// performs the encode on the caller's thread and never blocks on
    /// the network. Encode failures are logged and absorbed.
    pub fn on_frame(&self, frame: CameraFrame) {
        if !self.streaming.load(Ordering::SeqCst) {
            trace!("frame discarded: not streaming");
            return;
        }

        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);
        match self.encoder.encode(&frame, sequence) {
            Ok(encoded) => {
                self.stats.frames_encoded.fetch_add(1, Ordering::Relaxed);
                if self.gate.offer(encoded) {
                    // An undrained frame was overwritten.
                    self.stats.frames_dropped.fetch_add(1, Ordering::Relaxed);
                }
            }
            Err(e) => {
                self.stats.frames_dropped.fetch_add(1, Ordering::Relaxed);
                warn!(sequence, "frame dropped: {e}");
            }
        }
    }

    // ── Internal ─────────────────────────────────────────────────

    /// Close the gate and wait out the drain task, aborting it if a
    /// network call is wedged past the grace period.
    async fn shutdown_cycle(&mut self) {
        self.gate.close();
        let Some(mut drain) = self.drain.take() else {
            return;
        };
        match timeout(self.config.stop_grace, &mut drain).await {
            Ok(_) => {}
            Err(_) => {
                warn!(
                    "drain task still busy after {:?}; aborting",
                    self.config.stop_grace
                );
                drain.abort();
                // The session was dropped mid-operation and could not
                // publish its teardown; restore the idle status.
                self.status.send_replace(StreamStatus {
                    state: SessionState::Disconnected,
                    detail: None,
                });
            }
        }
    }
}

// ── Drain task ───────────────────────────────────────────────────

/// Move frames from the gate into the session until the gate closes
/// or the session fails.
///
/// A failed session is held until the gate closes so that the final
/// `close` can walk it from `Failed` through `Closing` back to
/// `Disconnected` under the caller's control.
async fn drain(
    gate: Arc<FrameGate>,
    mut session: StreamSession,
    endpoint: String,
    stats: Arc<StatsInner>,
) {
    let mut failed = session.open(&endpoint).await.is_err();

    if !failed {
        while let Some(frame) = gate.take_next().await {
            let bytes = frame.data.len() as u64;
            match session.send(frame).await {
                Ok(()) => {
                    stats.frames_sent.fetch_add(1, Ordering::Relaxed);
                    stats.bytes_sent.fetch_add(bytes, Ordering::Relaxed);
                }
                Err(e) => {
                    warn!("streaming interrupted: {e}");
                    failed = true;
                    break;
                }
            }
        }
    }

    if failed {
        gate.closed().await;
    }
    session.close().await;
}

// ── Tests ────────────────────────────────────────────────────────
