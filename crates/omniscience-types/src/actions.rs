//! Tagged actions accepted by the state store's transition entry point.
//!
//! Renderers and engine components never write engagement fields directly;
//! they submit one of these actions and the store computes the next state.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A transition request for the engagement state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(tag = "type", content = "amount", rename_all = "snake_case")]
pub enum EngagementAction {
    /// Add to omniscience, saturating at 100.
    IncreaseOmniscience(f64),
    /// Add to distortion, saturating at 100.
    IncreaseDistortion(f64),
    /// Count one interaction; awakens the session past the trigger count.
    RegisterInteraction,
    /// Awaken unconditionally and grant a fixed omniscience bonus.
    ForceAwaken,
    /// Add to madness, saturating at 100.
    IncreaseMadness(f64),
    /// Restore the zeroed initial state.
    Reset,
}

impl EngagementAction {
    /// Stable name of the action, used in logs.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::IncreaseOmniscience(_) => "increase_omniscience",
            Self::IncreaseDistortion(_) => "increase_distortion",
            Self::RegisterInteraction => "register_interaction",
            Self::ForceAwaken => "force_awaken",
            Self::IncreaseMadness(_) => "increase_madness",
            Self::Reset => "reset",
        }
    }
}
