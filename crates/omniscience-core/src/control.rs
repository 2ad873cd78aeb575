//! Shared control state for a running session.
//!
//! [`SessionControl`] is wrapped in an [`Arc`](std::sync::Arc) and shared
//! between the session loop and whoever hosts it (a signal handler, a
//! test). Flags are atomics so the loop reads them without locking; a
//! [`Notify`] per flag wakes the loop when it is parked.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tokio::sync::Notify;

/// Reason why a session loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEndReason {
    /// A stop was requested through [`SessionControl::request_stop`].
    Stopped,
    /// The configured maximum duration elapsed.
    DurationReached,
    /// Every input sender was dropped (the page went away).
    InputClosed,
}

/// Pause, resume, and stop flags for one session loop.
#[derive(Debug)]
pub struct SessionControl {
    paused: AtomicBool,
    pause_notify: Notify,
    resume_notify: Notify,
    stop_requested: AtomicBool,
    stop_notify: Notify,
    max_duration_ms: Option<u64>,
}

impl SessionControl {
    /// Create control state. `max_duration_ms` bounds the session's
    /// lifetime; `None` runs until stopped.
    pub fn new(max_duration_ms: Option<u64>) -> Self {
        Self {
            paused: AtomicBool::new(false),
            pause_notify: Notify::new(),
            resume_notify: Notify::new(),
            stop_requested: AtomicBool::new(false),
            stop_notify: Notify::new(),
            max_duration_ms,
        }
    }

    /// Check whether the session is paused.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Pause the session and wake the loop. Timers stop firing and inputs
    /// queue up.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
        self.pause_notify.notify_waiters();
    }

    /// Complete once the session is paused.
    pub async fn paused(&self) {
        loop {
            let notified = self.pause_notify.notified();
            if self.is_paused() {
                return;
            }
            notified.await;
        }
    }

    /// Resume the session and wake the loop.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
        self.resume_notify.notify_waiters();
    }

    /// Wait until the session is no longer paused or a stop is requested.
    ///
    /// Returns immediately if not paused.
    pub async fn wait_if_paused(&self) {
        loop {
            let resumed = self.resume_notify.notified();
            let stopped = self.stop_notify.notified();
            if !self.is_paused() || self.is_stop_requested() {
                return;
            }
            tokio::select! {
                () = resumed => {}
                () = stopped => {}
            }
        }
    }

    /// Request a clean stop and wake the loop.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.stop_notify.notify_waiters();
    }

    /// Check whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Complete once a stop has been requested.
    pub async fn stopped(&self) {
        loop {
            let notified = self.stop_notify.notified();
            if self.is_stop_requested() {
                return;
            }
            notified.await;
        }
    }

    /// The configured maximum session duration.
    pub const fn max_duration_ms(&self) -> Option<u64> {
        self.max_duration_ms
    }

    /// Whether `elapsed_ms` has reached the maximum duration.
    pub fn duration_reached(&self, elapsed_ms: u64) -> bool {
        self.max_duration_ms
            .is_some_and(|limit| elapsed_ms >= limit)
    }
}

impl Default for SessionControl {
    fn default() -> Self {
        Self::new(None)
    }
}
