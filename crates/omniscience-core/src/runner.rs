//! Async session loop with host controls.
//!
//! [`run_session`] drives one [`Session`] on a single task:
//!
//! - **Inputs**: raw signals and collaborator actions arrive on an mpsc
//!   channel and are applied in arrival order
//! - **Timers**: the loop sleeps until the session's next due task
//! - **Pause/resume**: while paused no timer fires and inputs queue up;
//!   missed periodic ticks are coalesced on resume
//! - **Clean shutdown**: stop request, maximum duration, or a closed input
//!   channel end the loop, after which every task and subscription is
//!   released and a [`SessionSummary`] is produced
//!
//! Session time is measured from the moment the loop starts, using the
//! tokio clock so that paused-time tests drive it deterministically.

use std::sync::Arc;

use omniscience_types::{EngagementAction, EngagementState, RawSignal, RevelationId, SessionId};
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};
use tracing::{info, warn};

use crate::control::{SessionControl, SessionEndReason};
use crate::session::{Session, SessionEvent, SessionPhase, SessionSummary};

/// Errors that can occur when running a session.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The session was already torn down and cannot run again.
    #[error("session {id} has already been torn down")]
    TornDown {
        /// The session that was passed in.
        id: SessionId,
    },
}

/// Something the page hands to a running session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionInput {
    /// A raw input signal.
    Signal(RawSignal),
    /// An action from an outside collaborator.
    Action(EngagementAction),
    /// The call to action was pressed.
    Invoke,
    /// The visitor closed one revelation popup.
    DismissRevelation(RevelationId),
    /// The visitor closed the full revelation.
    DismissFullRevelation,
}

/// Result of a session run.
#[derive(Debug)]
pub struct SessionResult {
    /// Why the loop ended.
    pub end_reason: SessionEndReason,
    /// Report taken at teardown.
    pub summary: SessionSummary,
}

/// Callback invoked whenever an entry point produced events.
///
/// Renderers hook in here. The callback receives the session time, the
/// events, and the engagement snapshot after they happened.
pub trait SessionCallback: Send {
    /// Called after an entry point produced at least one event.
    fn on_events(&mut self, now_ms: u64, events: &[SessionEvent], state: &EngagementState);
}

/// A no-op callback for testing.
pub struct NoOpCallback;

impl SessionCallback for NoOpCallback {
    fn on_events(&mut self, _now_ms: u64, _events: &[SessionEvent], _state: &EngagementState) {}
}

/// Run the session until a stop, the duration limit, or input closure.
///
/// The session is started if it has not been, and torn down before this
/// returns.
///
/// # Errors
///
/// Returns [`RunnerError::TornDown`] if the session was already torn down.
pub async fn run_session(
    session: &mut Session,
    inputs: &mut mpsc::Receiver<SessionInput>,
    control: &Arc<SessionControl>,
    callback: &mut dyn SessionCallback,
) -> Result<SessionResult, RunnerError> {
    if session.phase() == SessionPhase::TornDown {
        return Err(RunnerError::TornDown { id: session.id() });
    }

    let origin = Instant::now();
    let clock = SessionClock { origin };

    info!(
        session_id = %session.id(),
        max_duration_ms = control.max_duration_ms(),
        "Session loop starting"
    );

    let started = session.start(clock.now_ms());
    notify(callback, session, &started);

    let end_reason = loop {
        if control.is_stop_requested() {
            info!("Session stop requested");
            break SessionEndReason::Stopped;
        }

        if control.is_paused() {
            info!("Session paused, waiting for resume...");
            control.wait_if_paused().await;
            info!("Session resumed");
            continue;
        }

        let now = clock.now_ms();
        if control.duration_reached(now) {
            info!(
                session_ms = now,
                max_duration_ms = control.max_duration_ms(),
                "Session duration reached"
            );
            break SessionEndReason::DurationReached;
        }

        let wake_ms = match (session.next_due_ms(), control.max_duration_ms()) {
            (Some(due), Some(limit)) => Some(due.min(limit)),
            (due, limit) => due.or(limit),
        };
        let wake = async {
            match wake_ms {
                Some(ms) => tokio::time::sleep_until(clock.instant(ms)).await,
                None => std::future::pending::<()>().await,
            }
        };

        let events = tokio::select! {
            biased;
            () = control.stopped() => continue,
            () = control.paused() => continue,
            input = inputs.recv() => match input {
                Some(input) => apply_input(session, clock.now_ms(), input),
                None => {
                    info!("Session input closed");
                    break SessionEndReason::InputClosed;
                }
            },
            () = wake => session.run_due(clock.now_ms()),
        };

        notify(callback, session, &events);
    };

    let summary = session.teardown(clock.now_ms());
    if summary.counters.signals_received == 0 {
        warn!(session_id = %summary.session_id, "Session ended without any signal");
    }
    info!(
        reason = ?end_reason,
        session_ms = summary.session_ms,
        omniscience = summary.final_state.omniscience,
        awakening = summary.final_state.awakening,
        "Session loop ended"
    );

    Ok(SessionResult {
        end_reason,
        summary,
    })
}

fn apply_input(session: &mut Session, now_ms: u64, input: SessionInput) -> Vec<SessionEvent> {
    match input {
        SessionInput::Signal(signal) => session.handle_signal(now_ms, &signal),
        SessionInput::Action(action) => session.submit_action(now_ms, action),
        SessionInput::Invoke => session.invoke(now_ms),
        SessionInput::DismissRevelation(id) => session.dismiss_revelation(id),
        SessionInput::DismissFullRevelation => session.dismiss_full_revelation(),
    }
}

fn notify(callback: &mut dyn SessionCallback, session: &Session, events: &[SessionEvent]) {
    if !events.is_empty() {
        callback.on_events(session.now_ms(), events, &session.snapshot());
    }
}

/// Maps between tokio instants and session milliseconds.
#[derive(Debug, Clone, Copy)]
struct SessionClock {
    origin: Instant,
}

impl SessionClock {
    fn now_ms(self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    fn instant(self, ms: u64) -> Instant {
        self.origin
            .checked_add(Duration::from_millis(ms))
            .unwrap_or(self.origin)
    }
}
