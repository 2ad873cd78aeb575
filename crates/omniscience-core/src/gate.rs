//! Threshold gate: edge-triggered and level-triggered state signals.
//!
//! The gate is evaluated against every new engagement snapshot.
//!
//! - **Edge** signals fire once, when their condition first holds. The
//!   full revelation is latched by the gate's own `fired` flag, which is
//!   independent of the engagement state and is cleared only by a reset.
//! - **Level** signals are re-emitted on every evaluation for as long as
//!   their condition holds, and simply stop once it no longer does.

use omniscience_types::{EdgeSignal, EngagementState, LEVEL_CEILING, LevelSignal};
use tracing::info;

use crate::config::GateConfig;

/// Signals produced by one evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GateReport {
    /// Edge signals that fired on this evaluation.
    pub edges: Vec<EdgeSignal>,
    /// Level signals currently active.
    pub levels: Vec<LevelSignal>,
}

impl GateReport {
    /// Whether nothing is signalled.
    pub fn is_quiet(&self) -> bool {
        self.edges.is_empty() && self.levels.is_empty()
    }
}

/// Detects threshold crossings of the engagement state.
#[derive(Debug, Clone)]
pub struct ThresholdGate {
    config: GateConfig,
    revelation_fired: bool,
    revelation_visible: bool,
}

impl ThresholdGate {
    /// Create an armed gate.
    pub const fn new(config: GateConfig) -> Self {
        Self {
            config,
            revelation_fired: false,
            revelation_visible: false,
        }
    }

    /// Evaluate the gate against a snapshot.
    pub fn evaluate(&mut self, state: &EngagementState) -> GateReport {
        let mut report = GateReport::default();

        if !self.revelation_fired && state.omniscience >= self.config.revelation_at {
            self.revelation_fired = true;
            self.revelation_visible = true;
            report.edges.push(EdgeSignal::FullRevelation);
            info!(
                omniscience = state.omniscience,
                madness = state.madness,
                "Full revelation reached"
            );
        }

        if state.awakening && state.madness >= self.config.madness_warning_at {
            report.levels.push(LevelSignal::MadnessWarning {
                coherence: LEVEL_CEILING - state.madness,
            });
        }
        if state.distortion >= self.config.distortion_warning_at {
            report.levels.push(LevelSignal::DistortionWarning);
        }

        report
    }

    /// Hide the full revelation. It stays latched and does not fire again.
    /// Returns whether it was visible.
    pub const fn dismiss_revelation(&mut self) -> bool {
        let was_visible = self.revelation_visible;
        self.revelation_visible = false;
        was_visible
    }

    /// Whether the full revelation is on screen.
    pub const fn is_revelation_visible(&self) -> bool {
        self.revelation_visible
    }

    /// Whether the full revelation has fired since the last reset.
    pub const fn has_fired(&self) -> bool {
        self.revelation_fired
    }

    /// Re-arm the full revelation.
    pub const fn reset(&mut self) {
        self.revelation_fired = false;
        self.revelation_visible = false;
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    fn gate() -> ThresholdGate {
        ThresholdGate::new(GateConfig::default())
    }

    fn omniscient() -> EngagementState {
        EngagementState {
            omniscience: 100.0,
            ..EngagementState::INITIAL
        }
    }

    #[test]
    fn initial_state_is_quiet() {
        let mut g = gate();
        assert!(g.evaluate(&EngagementState::INITIAL).is_quiet());
    }

    #[test]
    fn full_revelation_fires_once() {
        let mut g = gate();
        let report = g.evaluate(&omniscient());
        assert_eq!(report.edges, vec![EdgeSignal::FullRevelation]);
        assert!(g.is_revelation_visible());

        for _ in 0..10 {
            assert!(g.evaluate(&omniscient()).edges.is_empty());
        }
    }

    #[test]
    fn dismissal_does_not_rearm() {
        let mut g = gate();
        g.evaluate(&omniscient());
        assert!(g.dismiss_revelation());
        assert!(!g.dismiss_revelation());

        // Dipping and returning to the ceiling does not re-fire.
        g.evaluate(&EngagementState {
            omniscience: 50.0,
            ..EngagementState::INITIAL
        });
        assert!(g.evaluate(&omniscient()).edges.is_empty());
        assert!(g.has_fired());
        assert!(!g.is_revelation_visible());
    }

    #[test]
    fn reset_rearms() {
        let mut g = gate();
        g.evaluate(&omniscient());
        g.reset();
        assert!(!g.has_fired());
        assert_eq!(g.evaluate(&omniscient()).edges.len(), 1);
    }

    #[test]
    fn madness_warning_requires_awakening() {
        let mut g = gate();
        let mut state = EngagementState {
            madness: 85.0,
            ..EngagementState::INITIAL
        };
        assert!(g.evaluate(&state).levels.is_empty());

        state.awakening = true;
        let report = g.evaluate(&state);
        assert_eq!(
            report.levels,
            vec![LevelSignal::MadnessWarning { coherence: 15.0 }]
        );
    }

    #[test]
    fn level_signals_repeat_while_condition_holds() {
        let mut g = gate();
        let state = EngagementState {
            distortion: 70.0,
            ..EngagementState::INITIAL
        };
        for _ in 0..3 {
            assert_eq!(g.evaluate(&state).levels, vec![LevelSignal::DistortionWarning]);
        }
        let calmer = EngagementState {
            distortion: 69.9,
            ..EngagementState::INITIAL
        };
        assert!(g.evaluate(&calmer).levels.is_empty());
    }
}
