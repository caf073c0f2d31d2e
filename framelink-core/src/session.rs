//! WebSocket streaming session.
//!
//! A `StreamSession` owns one persistent connection cycle: connect,
//! send encoded frames as binary messages, detect failures, close.
//! Every state transition is published on a `watch` channel so the
//! controller (and through it the control surface) can observe the
//! session without polling.
//!
//! The session never reconnects on its own: after `Failed`, the only
//! valid operation is `close()`, driven by the caller's next `stop`
//! or `start`.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, trace};

use crate::error::{ConnectError, SendError};
use crate::frame::EncodedFrame;
use crate::state::SessionState;

type WsTx = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsRx = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Deadline for a graceful socket shutdown; past it the socket is
/// simply dropped.
const TEARDOWN_TIMEOUT: Duration = Duration::from_secs(5);

// ── StreamStatus ─────────────────────────────────────────────────

/// Externally observable session status.
///
/// `detail` carries a human-readable description when the state is
/// `Failed`.
#[derive(Debug, Clone, Default)]
pub struct StreamStatus {
    pub state: SessionState,
    pub detail: Option<String>,
}

/// Shared sender half of the status channel.
pub type StatusSender = Arc<watch::Sender<StreamStatus>>;

// ── SessionConfig ────────────────────────────────────────────────

/// Timeouts for session network operations.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Deadline for the transport handshake.
    pub connect_timeout: Duration,
    /// Deadline for a single frame transmission.
    pub send_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            send_timeout: Duration::from_secs(15),
        }
    }
}

// ── StreamSession ────────────────────────────────────────────────

/// One streaming connection cycle.
pub struct StreamSession {
    state: SessionState,
    config: SessionConfig,
    status: StatusSender,
    ws_tx: Option<WsTx>,
    reader: Option<JoinHandle<()>>,
}

impl StreamSession {
    /// Create an idle session publishing transitions to `status`.
    pub fn new(config: SessionConfig, status: StatusSender) -> Self {
        Self {
            state: SessionState::Disconnected,
            config,
            status,
            ws_tx: None,
            reader: None,
        }
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Connect to `endpoint` and perform the WebSocket handshake.
    ///
    /// On failure the session is left in `Failed` with the error
    /// detail published; there is no automatic retry.
    pub async fn open(&mut self, endpoint: &str) -> Result<(), ConnectError> {
        self.state.begin_connect()?;
        self.publish(None);
        debug!(endpoint, "connecting");

        let connected = timeout(self.config.connect_timeout, connect_async(endpoint)).await;
        let stream = match connected {
            Err(_) => {
                let err = ConnectError::Timeout(self.config.connect_timeout);
                self.fail_with(err.to_string());
                return Err(err);
            }
            Ok(Err(e)) => {
                let err = connect_error(endpoint, e);
                self.fail_with(err.to_string());
                return Err(err);
            }
            Ok(Ok((stream, _response))) => stream,
        };

        let (tx, rx) = stream.split();
        self.ws_tx = Some(tx);
        self.reader = Some(tokio::spawn(read_inbound(rx)));
        self.state.handshake_complete()?;
        self.publish(None);
        debug!(endpoint, "session open");
        Ok(())
    }

    /// Transmit one encoded frame as a binary message.
    ///
    /// Only valid in `Open`. A transport error or timeout moves the
    /// session to `Failed`; the frame is considered lost either way.
    pub async fn send(&mut self, frame: EncodedFrame) -> Result<(), SendError> {
        if !self.state.is_open() {
            return Err(SendError::NotOpen { state: self.state });
        }
        let Some(tx) = self.ws_tx.as_mut() else {
            return Err(SendError::NotOpen { state: self.state });
        };

        let sequence = frame.sequence;
        let bytes = frame.data.len();
        match timeout(self.config.send_timeout, tx.send(Message::Binary(frame.data))).await {
            Err(_) => {
                let err = SendError::Timeout(self.config.send_timeout);
                self.fail_with(err.to_string());
                Err(err)
            }
            Ok(Err(e)) => {
                let err = SendError::Transport(e.to_string());
                self.fail_with(err.to_string());
                Err(err)
            }
            Ok(Ok(())) => {
                trace!(sequence, bytes, "frame sent");
                Ok(())
            }
        }
    }

    /// Tear the connection down and return to `Disconnected`.
    ///
    /// Idempotent; failures during teardown are logged and swallowed.
    pub async fn close(&mut self) {
        if self.state.begin_close().is_err() {
            // Disconnected already, or a close is in progress.
            return;
        }
        self.publish(None);

        if let Some(mut tx) = self.ws_tx.take() {
            match timeout(TEARDOWN_TIMEOUT, tx.close()).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => debug!("ignoring teardown error: {e}"),
                Err(_) => debug!("teardown timed out; dropping socket"),
            }
        }
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }

        let _ = self.state.finish_close();
        self.publish(None);
        debug!("session closed");
    }

    // ── Internal ─────────────────────────────────────────────────

    fn publish(&self, detail: Option<String>) {
        self.status.send_replace(StreamStatus {
            state: self.state,
            detail,
        });
    }

    /// Drop the transport and move to `Failed`, publishing `detail`.
    fn fail_with(&mut self, detail: String) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        self.ws_tx = None;
        if self.state.fail().is_ok() {
            self.publish(Some(detail));
        }
    }
}

// ── Inbound reader ───────────────────────────────────────────────

/// Drain inbound messages for the lifetime of the connection.
///
/// The protocol needs no responses for correctness; anything the
/// server says is logged as a best-effort notification and has no
/// effect on pipeline state.
async fn read_inbound(mut rx: WsRx) {
    while let Some(message) = rx.next().await {
        match message {
            Ok(Message::Text(text)) => debug!(%text, "server message"),
            Ok(Message::Binary(data)) => debug!(bytes = data.len(), "server binary message"),
            Ok(Message::Close(frame)) => {
                debug!(?frame, "server closed the connection");
                break;
            }
            Ok(_) => {} // ping/pong, handled by the protocol layer
            Err(e) => {
                debug!("inbound read error: {e}");
                break;
            }
        }
    }
}

fn connect_error(endpoint: &str, err: tungstenite::Error) -> ConnectError {
    match err {
        tungstenite::Error::Url(e) => ConnectError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        },
        tungstenite::Error::Io(e) => ConnectError::Io(e),
        other => ConnectError::Handshake(other.to_string()),
    }
}

// ── Tests ────────────────────────────────────────────────────────
