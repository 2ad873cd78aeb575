//! The engagement state store: single owner and sole writer of the
//! session's [`EngagementState`].
//!
//! Every mutation goes through [`EngagementStore::apply`], which runs the
//! pure [`transition`] function and then broadcasts the new snapshot to all
//! observers. The store never decides *whether* an increment should happen
//! (that belongs to the collector and schedulers) and never fails: out of
//! range amounts are clamped, not rejected.
//!
//! # Transition rules
//!
//! | action | effect |
//! |---|---|
//! | `IncreaseOmniscience(a)` | `omniscience = min(100, omniscience + a)` |
//! | `IncreaseDistortion(a)` | `distortion = min(100, distortion + a)` |
//! | `RegisterInteraction` | `interactions += 1`, awaken once `interactions > 10` |
//! | `ForceAwaken` | awaken, `omniscience = min(100, omniscience + 25)` |
//! | `IncreaseMadness(a)` | `madness = min(100, madness + a)` |
//! | `Reset` | zeroed initial state |

use omniscience_types::{EngagementAction, EngagementState, LEVEL_CEILING};
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Interaction count that must be exceeded for the awakening to latch.
pub const AWAKENING_TRIGGER: u64 = 10;

/// Omniscience granted by a forced awakening.
pub const FORCE_AWAKEN_BONUS: f64 = 25.0;

/// Default amount for [`EngagementStore::increment_omniscience`].
pub const DEFAULT_OMNISCIENCE_STEP: f64 = 1.0;

/// Default amount for [`EngagementStore::distort_reality`].
pub const DEFAULT_DISTORTION_STEP: f64 = 5.0;

/// Default amount for [`EngagementStore::increase_madness`].
pub const DEFAULT_MADNESS_STEP: f64 = 2.0;

/// Capacity of the snapshot broadcast channel.
///
/// An observer that falls behind by more than this many snapshots receives
/// [`broadcast::error::RecvError::Lagged`] and skips to the newest one.
const SNAPSHOT_CAPACITY: usize = 64;

/// Compute the state that follows `state` under `action`.
///
/// Pure: the result depends only on the arguments. Bounded fields saturate
/// at 100 and never drop below 0; negative and NaN amounts count as zero.
pub fn transition(state: &EngagementState, action: EngagementAction) -> EngagementState {
    let mut next = *state;
    match action {
        EngagementAction::IncreaseOmniscience(amount) => {
            next.omniscience = saturating_level(state.omniscience, amount);
        }
        EngagementAction::IncreaseDistortion(amount) => {
            next.distortion = saturating_level(state.distortion, amount);
        }
        EngagementAction::RegisterInteraction => {
            next.interactions = state.interactions.saturating_add(1);
            next.awakening = state.awakening || next.interactions > AWAKENING_TRIGGER;
        }
        EngagementAction::ForceAwaken => {
            next.awakening = true;
            next.omniscience = saturating_level(state.omniscience, FORCE_AWAKEN_BONUS);
        }
        EngagementAction::IncreaseMadness(amount) => {
            next.madness = saturating_level(state.madness, amount);
        }
        EngagementAction::Reset => return EngagementState::INITIAL,
    }
    next
}

/// Add a non-negative amount to a bounded level, saturating at the ceiling.
fn saturating_level(current: f64, amount: f64) -> f64 {
    let amount = if amount > 0.0 { amount } else { 0.0 };
    let current = if current.is_finite() {
        current.clamp(0.0, LEVEL_CEILING)
    } else {
        0.0
    };
    (current + amount).min(LEVEL_CEILING)
}

/// Owner of the session's engagement state.
///
/// Observers subscribe with [`subscribe`](Self::subscribe) and receive a
/// copy of the state after every transition. Dropping the receiver is the
/// unsubscription; the store keeps no other reference to its observers.
#[derive(Debug)]
pub struct EngagementStore {
    state: EngagementState,
    tx: broadcast::Sender<EngagementState>,
    transitions: u64,
}

impl EngagementStore {
    /// Create a store holding the zeroed initial state.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(SNAPSHOT_CAPACITY);
        Self {
            state: EngagementState::INITIAL,
            tx,
            transitions: 0,
        }
    }

    /// Apply one action, notify observers, and return the new state.
    pub fn apply(&mut self, action: EngagementAction) -> EngagementState {
        let previous = self.state;
        let next = transition(&previous, action);

        if next.awakening && !previous.awakening {
            info!(
                interactions = next.interactions,
                omniscience = next.omniscience,
                cause = action.name(),
                "Awakening latched"
            );
        }
        if matches!(action, EngagementAction::Reset) {
            info!(transitions = self.transitions, "Engagement state reset");
        }

        self.state = next;
        self.transitions = self.transitions.saturating_add(1);

        let receivers = self.tx.send(next).unwrap_or(0);
        debug!(
            action = action.name(),
            omniscience = next.omniscience,
            distortion = next.distortion,
            madness = next.madness,
            interactions = next.interactions,
            receivers,
            "Transition applied"
        );
        next
    }

    /// Register an observer. Every subsequent transition is delivered to
    /// the returned receiver until it is dropped.
    pub fn subscribe(&self) -> broadcast::Receiver<EngagementState> {
        self.tx.subscribe()
    }

    /// Number of live observers.
    pub fn observer_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Read-only copy of the current state.
    pub const fn snapshot(&self) -> EngagementState {
        self.state
    }

    /// Number of transitions applied since the store was created.
    pub const fn transitions(&self) -> u64 {
        self.transitions
    }

    /// Raise omniscience by `amount`, or by 1 when `None`.
    pub fn increment_omniscience(&mut self, amount: Option<f64>) -> EngagementState {
        self.apply(EngagementAction::IncreaseOmniscience(
            amount.unwrap_or(DEFAULT_OMNISCIENCE_STEP),
        ))
    }

    /// Raise distortion by `intensity`, or by 5 when `None`.
    pub fn distort_reality(&mut self, intensity: Option<f64>) -> EngagementState {
        self.apply(EngagementAction::IncreaseDistortion(
            intensity.unwrap_or(DEFAULT_DISTORTION_STEP),
        ))
    }

    /// Raise madness by `amount`, or by 2 when `None`.
    pub fn increase_madness(&mut self, amount: Option<f64>) -> EngagementState {
        self.apply(EngagementAction::IncreaseMadness(
            amount.unwrap_or(DEFAULT_MADNESS_STEP),
        ))
    }

    /// Count one interaction.
    pub fn track_interaction(&mut self) -> EngagementState {
        self.apply(EngagementAction::RegisterInteraction)
    }

    /// Force the awakening.
    pub fn trigger_awakening(&mut self) -> EngagementState {
        self.apply(EngagementAction::ForceAwaken)
    }
}

impl Default for EngagementStore {
    fn default() -> Self {
        Self::new()
    }
}
