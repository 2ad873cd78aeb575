//! Session callback that reports events through `tracing`.
//!
//! The host has no page to draw on, so every renderer-facing event is
//! written to the log instead. Milestones go out at `info`, the steady
//! stream of tracked signals and level warnings at `debug`.

use omniscience_core::runner::SessionCallback;
use omniscience_core::session::SessionEvent;
use omniscience_types::EngagementState;
use tracing::{debug, info};

/// Callback that logs every session event.
#[derive(Debug, Default)]
pub struct LogCallback {
    batches: u64,
    revelations: u64,
}

impl LogCallback {
    /// Create a callback that has seen nothing yet.
    pub const fn new() -> Self {
        Self {
            batches: 0,
            revelations: 0,
        }
    }

    /// Event batches received.
    pub const fn batches(&self) -> u64 {
        self.batches
    }

    /// Revelation popups seen.
    pub const fn revelations(&self) -> u64 {
        self.revelations
    }
}

impl SessionCallback for LogCallback {
    fn on_events(&mut self, now_ms: u64, events: &[SessionEvent], state: &EngagementState) {
        self.batches = self.batches.saturating_add(1);

        for event in events {
            match event {
                SessionEvent::CollectorActivated => {
                    info!(now_ms, omniscience = state.omniscience, "The page is listening");
                }
                SessionEvent::Tracked(tracked) => {
                    debug!(
                        now_ms,
                        kind = tracked.kind.label(),
                        x = tracked.x,
                        y = tracked.y,
                        "Interaction tracked"
                    );
                }
                SessionEvent::Resonated { kind } => {
                    debug!(now_ms, kind = kind.label(), "Resonance");
                }
                SessionEvent::RevelationShown(revelation) => {
                    self.revelations = self.revelations.saturating_add(1);
                    info!(
                        now_ms,
                        key = %revelation.key,
                        intensity = ?revelation.intensity,
                        text = %revelation.text,
                        "Revelation"
                    );
                }
                SessionEvent::RevelationCleared { id } => {
                    debug!(now_ms, revelation_id = %id, "Revelation cleared");
                }
                SessionEvent::FullRevelation => {
                    info!(
                        now_ms,
                        interactions = state.interactions,
                        madness = state.madness,
                        "FULL REVELATION"
                    );
                }
                SessionEvent::FullRevelationDismissed => {
                    info!(now_ms, "Full revelation dismissed");
                }
                SessionEvent::Level { signal } => {
                    debug!(now_ms, signal = signal.name(), "Level warning");
                }
                SessionEvent::GlitchStarted(burst) => {
                    info!(
                        now_ms,
                        glitch_id = %burst.id,
                        fragments = burst.fragments.len(),
                        ends_at_ms = burst.ends_at_ms,
                        "Reality glitch"
                    );
                }
                SessionEvent::GlitchEnded { id } => {
                    debug!(now_ms, glitch_id = %id, "Reality glitch ended");
                }
                SessionEvent::WatchersChanged { eyes } => {
                    debug!(now_ms, eyes = eyes.len(), "Watchers moved");
                }
                SessionEvent::StateReset => {
                    info!(now_ms, "Engagement state reset");
                }
            }
        }
    }
}
