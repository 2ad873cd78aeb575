//! Enumeration types for the Omniscience engagement engine.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Raw signal classes
// ---------------------------------------------------------------------------

/// A class of raw input signal emitted by the hosting page.
///
/// Pointer movement and scroll arrive in bursts and are sampled by the
/// collector. Click, key press and focus are naturally rare and are always
/// forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum SignalKind {
    /// Pointer moved over the page.
    PointerMove,
    /// Click or tap.
    Click,
    /// Page scrolled.
    Scroll,
    /// Key pressed.
    KeyPress,
    /// Window gained focus.
    Focus,
}

impl SignalKind {
    /// Every signal class, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::PointerMove,
        Self::Click,
        Self::Scroll,
        Self::KeyPress,
        Self::Focus,
    ];

    /// Whether raw occurrences of this class are subject to probabilistic
    /// sampling before being forwarded.
    pub const fn is_sampled(self) -> bool {
        matches!(self, Self::PointerMove | Self::Scroll)
    }

    /// Upper-case label used by the live event feed.
    pub const fn label(self) -> &'static str {
        match self {
            Self::PointerMove => "HOVER",
            Self::Click => "CLICK",
            Self::Scroll => "SCROLL",
            Self::KeyPress => "KEYSTROKE",
            Self::Focus => "FOCUS",
        }
    }
}

// ---------------------------------------------------------------------------
// Revelation intensity
// ---------------------------------------------------------------------------

/// Intensity tier of a revelation popup.
///
/// Ordered from mildest to most severe; the tier decides how long the
/// popup stays on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Intensity {
    /// Faint unease.
    Low,
    /// Noticeable anomaly.
    Medium,
    /// Overt intrusion.
    High,
    /// Full-blown horror, rendered with a flicker overlay.
    Extreme,
}

// ---------------------------------------------------------------------------
// Threshold gate signals
// ---------------------------------------------------------------------------

/// A signal that fires exactly once when its condition first becomes true.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum EdgeSignal {
    /// Omniscience reached its ceiling. Shown as a modal the visitor may
    /// dismiss; it does not re-fire until the session is reset.
    FullRevelation,
}

/// A signal that is re-emitted on every evaluation while its condition
/// holds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum LevelSignal {
    /// Madness is critical after awakening.
    MadnessWarning {
        /// Remaining reality coherence, `100 - madness`.
        coherence: f64,
    },
    /// Reality distortion is high enough to tint the whole page.
    DistortionWarning,
}

impl LevelSignal {
    /// Stable name of the signal, independent of its payload.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::MadnessWarning { .. } => "madness_warning",
            Self::DistortionWarning => "distortion_warning",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_pointer_and_scroll_are_sampled() {
        let sampled: Vec<SignalKind> = SignalKind::ALL
            .into_iter()
            .filter(|k| k.is_sampled())
            .collect();
        assert_eq!(sampled, vec![SignalKind::PointerMove, SignalKind::Scroll]);
    }

    #[test]
    fn intensity_orders_by_severity() {
        assert!(Intensity::Low < Intensity::Medium);
        assert!(Intensity::High < Intensity::Extreme);
    }

    #[test]
    fn level_signal_names() {
        let warning = LevelSignal::MadnessWarning { coherence: 12.0 };
        assert_eq!(warning.name(), "madness_warning");
        assert_eq!(LevelSignal::DistortionWarning.name(), "distortion_warning");
    }
}
