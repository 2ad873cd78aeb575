//! Core structs shared between the engine and its renderers.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{Intensity, SignalKind};
use crate::ids::{GlitchId, RevelationId, TrackedEventId};

/// Upper bound of every bounded engagement metric.
pub const LEVEL_CEILING: f64 = 100.0;

// ---------------------------------------------------------------------------
// Engagement state
// ---------------------------------------------------------------------------

/// The engagement record of one page session.
///
/// Owned exclusively by the state store. Everything else receives copies
/// of it as read-only snapshots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EngagementState {
    /// Accumulated awareness (0--100).
    pub omniscience: f64,
    /// Visual and narrative instability (0--100).
    pub distortion: f64,
    /// Lifetime count of registered interactions.
    pub interactions: u64,
    /// One-way latch set by sustained engagement or a forced awakening.
    pub awakening: bool,
    /// Secondary instability, mostly fed after awakening (0--100).
    pub madness: f64,
}

impl EngagementState {
    /// The zeroed state every session starts from.
    pub const INITIAL: Self = Self {
        omniscience: 0.0,
        distortion: 0.0,
        interactions: 0,
        awakening: false,
        madness: 0.0,
    };

    /// Whether every bounded metric lies within `[0, 100]`.
    pub fn is_within_bounds(&self) -> bool {
        let range = 0.0..=LEVEL_CEILING;
        range.contains(&self.omniscience)
            && range.contains(&self.distortion)
            && range.contains(&self.madness)
    }

    /// Whether omniscience has reached its ceiling.
    pub fn is_omniscient(&self) -> bool {
        self.omniscience >= LEVEL_CEILING
    }
}

// ---------------------------------------------------------------------------
// Raw input
// ---------------------------------------------------------------------------

/// A raw input signal as delivered by the hosting page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RawSignal {
    /// Which class of input this is.
    pub kind: SignalKind,
    /// Pointer coordinates in CSS pixels, when the signal has any.
    pub pointer: Option<(f64, f64)>,
    /// Scroll depth in percent of the scrollable height, for scroll signals.
    pub scroll_depth: Option<f64>,
}

impl RawSignal {
    /// A pointer movement to `(x, y)`.
    pub const fn pointer_move(x: f64, y: f64) -> Self {
        Self {
            kind: SignalKind::PointerMove,
            pointer: Some((x, y)),
            scroll_depth: None,
        }
    }

    /// A click at `(x, y)`.
    pub const fn click(x: f64, y: f64) -> Self {
        Self {
            kind: SignalKind::Click,
            pointer: Some((x, y)),
            scroll_depth: None,
        }
    }

    /// A scroll that reached `depth` percent of the page.
    pub const fn scroll(depth: f64) -> Self {
        Self {
            kind: SignalKind::Scroll,
            pointer: None,
            scroll_depth: Some(depth),
        }
    }

    /// A key press.
    pub const fn key_press() -> Self {
        Self {
            kind: SignalKind::KeyPress,
            pointer: None,
            scroll_depth: None,
        }
    }

    /// The window gaining focus.
    pub const fn focus() -> Self {
        Self {
            kind: SignalKind::Focus,
            pointer: None,
            scroll_depth: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Collector output
// ---------------------------------------------------------------------------

/// One forwarded interaction in the collector's rolling log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TrackedEvent {
    /// Unique entry identifier.
    pub id: TrackedEventId,
    /// Signal class that was forwarded.
    pub kind: SignalKind,
    /// Session time the signal was forwarded, in milliseconds.
    pub at_ms: u64,
    /// Pointer x in CSS pixels (0 when the signal has no position).
    pub x: f64,
    /// Pointer y in CSS pixels (0 when the signal has no position).
    pub y: f64,
}

/// Running statistics of the visitor's session, shown by the tracker panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SessionStats {
    /// Whole seconds spent on the page.
    pub time_on_site_secs: u64,
    /// Signals forwarded by the collector.
    pub interactions: u64,
    /// Deepest scroll position reached, in percent.
    pub scroll_depth: f64,
    /// Pointer movements that survived sampling.
    pub mouse_movements: u64,
}

// ---------------------------------------------------------------------------
// Escalation output
// ---------------------------------------------------------------------------

/// Position of an overlay element in viewport percentages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ScreenPosition {
    /// Horizontal position, percent of viewport width.
    pub x: f64,
    /// Vertical position, percent of viewport height.
    pub y: f64,
}

/// A live revelation popup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Revelation {
    /// Unique popup identifier.
    pub id: RevelationId,
    /// Catalog key of the message shown.
    pub key: String,
    /// Message text.
    pub text: String,
    /// Intensity tier of the message.
    pub intensity: Intensity,
    /// Where the popup is centered.
    pub position: ScreenPosition,
    /// Session time the popup appeared, in milliseconds.
    pub shown_at_ms: u64,
    /// How long the popup stays visible, in milliseconds.
    pub lifetime_ms: u64,
}

impl Revelation {
    /// Whether the popup's lifetime has elapsed at `now_ms`.
    pub const fn is_expired(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.shown_at_ms) >= self.lifetime_ms
    }
}

// ---------------------------------------------------------------------------
// Glitch and watcher output
// ---------------------------------------------------------------------------

/// One colored bar of a reality glitch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GlitchFragment {
    /// Left edge, percent of viewport width.
    pub x: f64,
    /// Top edge, percent of viewport height.
    pub y: f64,
    /// Width in percent of viewport width.
    pub width: f64,
    /// Height in percent of viewport height.
    pub height: f64,
    /// CSS color of the bar.
    pub color: String,
    /// Flicker duration in milliseconds.
    pub duration_ms: u64,
}

/// A burst of glitch fragments shown together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GlitchBurst {
    /// Unique burst identifier.
    pub id: GlitchId,
    /// Session time the burst started, in milliseconds.
    pub started_at_ms: u64,
    /// Session time the burst ends, in milliseconds.
    pub ends_at_ms: u64,
    /// The fragments drawn during the burst.
    pub fragments: Vec<GlitchFragment>,
}

/// A watching eye drawn by the omniscient overlay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WatcherEye {
    /// Slot index of the eye (0-based).
    pub index: u32,
    /// Where the eye is placed.
    pub position: ScreenPosition,
    /// Diameter in pixels.
    pub size: f64,
    /// Delay before the first blink, in seconds.
    pub blink_delay_secs: f64,
}
