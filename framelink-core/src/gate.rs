//! Single-slot relay between frame production and the network drain.
//!
//! The gate holds at most one encoded frame, always the most recent
//! one offered since the last drain. When the network cannot keep up,
//! older undrained frames are overwritten rather than queued, so the
//! consumer always wakes to the freshest frame and pending memory is
//! bounded at exactly one payload.
//!
//! `offer` is synchronous and returns immediately regardless of
//! consumer progress; `take_next` is the drain side's suspension
//! point.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

use crate::frame::EncodedFrame;

// ── FrameGate ────────────────────────────────────────────────────

/// Single-slot, overwrite-on-offer frame relay.
#[derive(Debug, Default)]
pub struct FrameGate {
    slot: Mutex<Option<EncodedFrame>>,
    notify: Notify,
    closed: AtomicBool,
}

impl FrameGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace any pending frame with `frame`. Never blocks.
    ///
    /// Returns `true` when an undrained frame was displaced (the
    /// caller counts it as dropped). Offers after [`close`](Self::close)
    /// are discarded.
    pub fn offer(&self, frame: EncodedFrame) -> bool {
        if self.closed.load(Ordering::Acquire) {
            return false;
        }
        let displaced = {
            let mut slot = self.slot.lock().expect("gate slot mutex poisoned");
            slot.replace(frame).is_some()
        };
        self.notify.notify_one();
        displaced
    }

    /// Remove and return the pending frame, suspending until one is
    /// offered.
    ///
    /// Returns `None` once the gate is closed and the slot is empty.
    /// A frame already pending at close time is still delivered.
    pub async fn take_next(&self) -> Option<EncodedFrame> {
        loop {
            // Register interest before re-checking the slot, so an
            // offer or close racing this call cannot be missed.
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let pending = self
                .slot
                .lock()
                .expect("gate slot mutex poisoned")
                .take();
            if let Some(frame) = pending {
                return Some(frame);
            }
            if self.closed.load(Ordering::Acquire) {
                return None;
            }
            notified.await;
        }
    }

    /// Suspend until the gate is closed, without consuming frames.
    pub async fn closed(&self) {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.closed.load(Ordering::Acquire) {
                return;
            }
            notified.await;
        }
    }

    /// Close the gate, waking any suspended [`take_next`](Self::take_next)
    /// caller. Idempotent.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.notify.notify_waiters();
        // A permit for callers that have not registered yet.
        self.notify.notify_one();
    }

    /// Whether the gate has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

// ── Tests ────────────────────────────────────────────────────────
