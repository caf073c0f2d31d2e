//! Session lifecycle state machine.
//!
//! Provides a `SessionState` enum that models the full lifecycle of
//! one streaming connection cycle, with validated transitions that
//! return `Result` instead of panicking.

use crate::error::InvalidTransition;

// ── SessionState ─────────────────────────────────────────────────

/// The current state of a streaming session.
///
/// ```text
///  Disconnected ──► Connecting ──► Open ──┐
///       ▲               │           │     │ (send / transport error)
///       │               ▼           ▼     ▼
///       └────────── Closing ◄──── Failed ─┘
/// ```
///
/// `Disconnected` is both the initial state and the terminal state of
/// every cycle. `Failed` is terminal for the current cycle: the only
/// way out is `close()` (driven by the caller's next `stop`/`start`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No active connection. Initial / terminal state.
    #[default]
    Disconnected,

    /// Transport handshake in progress.
    Connecting,

    /// Handshake complete; payloads may be sent.
    Open,

    /// Teardown in progress.
    Closing,

    /// The connection attempt or an in-flight send failed. Terminal
    /// for this cycle until the caller closes the session.
    Failed,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Open => write!(f, "Open"),
            Self::Closing => write!(f, "Closing"),
            Self::Failed => write!(f, "Failed"),
        }
    }
}

impl SessionState {
    /// Returns `true` when payloads may be sent.
    pub fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }

    /// Returns `true` when the session is idle.
    pub fn is_disconnected(self) -> bool {
        matches!(self, Self::Disconnected)
    }

    /// Returns `true` when the current cycle has failed.
    pub fn is_failed(self) -> bool {
        matches!(self, Self::Failed)
    }

    // ── Transitions ──────────────────────────────────────────────

    /// Transition to `Connecting`.
    ///
    /// Valid from: `Disconnected`.
    pub fn begin_connect(&mut self) -> Result<(), InvalidTransition> {
        match self {
            Self::Disconnected => {
                *self = Self::Connecting;
                Ok(())
            }
            _ => Err(InvalidTransition(
                "cannot connect: not in Disconnected state",
            )),
        }
    }

    /// Transition to `Open`.
    ///
    /// Valid from: `Connecting`.
    pub fn handshake_complete(&mut self) -> Result<(), InvalidTransition> {
        match self {
            Self::Connecting => {
                *self = Self::Open;
                Ok(())
            }
            _ => Err(InvalidTransition(
                "cannot complete handshake: not in Connecting state",
            )),
        }
    }

    /// Transition to `Failed`.
    ///
    /// Valid from: `Connecting` (handshake error or timeout), `Open`
    /// (send error, remote close, transport error).
    pub fn fail(&mut self) -> Result<(), InvalidTransition> {
        match self {
            Self::Connecting | Self::Open => {
                *self = Self::Failed;
                Ok(())
            }
            _ => Err(InvalidTransition(
                "cannot fail: not in Connecting or Open state",
            )),
        }
    }

    /// Transition to `Closing`.
    ///
    /// Valid from: `Connecting`, `Open`, `Failed`.
    pub fn begin_close(&mut self) -> Result<(), InvalidTransition> {
        match self {
            Self::Connecting | Self::Open | Self::Failed => {
                *self = Self::Closing;
                Ok(())
            }
            _ => Err(InvalidTransition(
                "cannot close: not in Connecting, Open or Failed state",
            )),
        }
    }

    /// Transition to `Disconnected`.
    ///
    /// Valid from: `Closing`.
    pub fn finish_close(&mut self) -> Result<(), InvalidTransition> {
        match self {
            Self::Closing => {
                *self = Self::Disconnected;
                Ok(())
            }
            _ => Err(InvalidTransition(
                "cannot finish close: not in Closing state",
            )),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_lifecycle() {
        let mut state = SessionState::Disconnected;

        state.begin_connect().unwrap();
        assert_eq!(state, SessionState::Connecting);

        state.handshake_complete().unwrap();
        assert!(state.is_open());

        state.begin_close().unwrap();
        assert_eq!(state, SessionState::Closing);

        state.finish_close().unwrap();
        assert!(state.is_disconnected());
    }

    #[test]
    fn connect_failure_path() {
        let mut state = SessionState::Disconnected;
        state.begin_connect().unwrap();
        state.fail().unwrap();
        assert!(state.is_failed());

        // Failed is terminal for the cycle: only close leaves it.
        assert!(state.begin_connect().is_err());
        assert!(state.handshake_complete().is_err());

        state.begin_close().unwrap();
        state.finish_close().unwrap();
        assert!(state.is_disconnected());
    }

    #[test]
    fn send_failure_path() {
        let mut state = SessionState::Open;
        state.fail().unwrap();
        assert!(state.is_failed());
    }

    #[test]
    fn close_from_connecting() {
        let mut state = SessionState::Connecting;
        state.begin_close().unwrap();
        state.finish_close().unwrap();
        assert!(state.is_disconnected());
    }

    #[test]
    fn invalid_transition_connect_when_open() {
        let mut state = SessionState::Open;
        assert!(state.begin_connect().is_err());
        assert_eq!(state, SessionState::Open);
    }

    #[test]
    fn invalid_transition_fail_when_disconnected() {
        let mut state = SessionState::Disconnected;
        assert!(state.fail().is_err());
    }

    #[test]
    fn invalid_transition_close_when_disconnected() {
        let mut state = SessionState::Disconnected;
        assert!(state.begin_close().is_err());
    }

    #[test]
    fn display_format() {
        assert_eq!(SessionState::Disconnected.to_string(), "Disconnected");
        assert_eq!(SessionState::Connecting.to_string(), "Connecting");
        assert_eq!(SessionState::Open.to_string(), "Open");
        assert_eq!(SessionState::Closing.to_string(), "Closing");
        assert_eq!(SessionState::Failed.to_string(), "Failed");
    }

    #[test]
    fn default_state_is_disconnected() {
        assert!(SessionState::default().is_disconnected());
    }
}
