//! Reality glitches: short bursts of colored bars that raise distortion.
//!
//! Glitches run while distortion exceeds a threshold or the visitor is
//! awakened. Each check draws once against the trigger chance; a hit
//! applies a distortion increase through the store and produces a burst
//! that ends after a fixed duration. Glitches are the engine's own source
//! of distortion growth; outside collaborators can still raise it with
//! `IncreaseDistortion` through `Session::submit_action`, which may in
//! turn arm the glitch checks.

use omniscience_types::{EngagementAction, EngagementState, GlitchBurst, GlitchFragment, GlitchId};
use tracing::debug;

use crate::config::GlitchConfig;
use crate::random::RandomSource;
use crate::store::EngagementStore;

/// Colors a fragment may take.
pub const PALETTE: [&str; 5] = ["#ff0000", "#00ff00", "#0000ff", "#ff00ff", "#ffff00"];

/// Schedules glitch checks and holds the burst on screen.
#[derive(Debug, Clone)]
pub struct GlitchScheduler {
    config: GlitchConfig,
    burst: Option<GlitchBurst>,
    glitches: u64,
}

impl GlitchScheduler {
    /// Create an idle glitch scheduler.
    pub const fn new(config: GlitchConfig) -> Self {
        Self {
            config,
            burst: None,
            glitches: 0,
        }
    }

    /// Whether glitch checks should run for this state.
    pub fn is_enabled(&self, state: &EngagementState) -> bool {
        state.awakening || state.distortion > self.config.enable_above_distortion
    }

    /// Delay until the next check: `base_delay_ms + U[0, delay_jitter_ms)`.
    pub fn next_check_delay_ms(&self, rng: &mut dyn RandomSource) -> u64 {
        self.config
            .base_delay_ms
            .saturating_add(draw_ms(rng, 0.0, self.config.delay_jitter_ms))
    }

    /// Run one glitch check at session time `now_ms`.
    ///
    /// Returns the new burst when the check triggers. A check on a disabled
    /// state draws nothing.
    pub fn check(
        &mut self,
        now_ms: u64,
        store: &mut EngagementStore,
        rng: &mut dyn RandomSource,
    ) -> Option<GlitchBurst> {
        if !self.is_enabled(&store.snapshot()) || !rng.chance(self.config.trigger_chance) {
            return None;
        }

        let state = store.apply(EngagementAction::IncreaseDistortion(
            self.config.distortion_gain,
        ));

        let spread = self
            .config
            .max_fragments
            .saturating_sub(self.config.min_fragments)
            .saturating_add(1);
        let extra = rng
            .pick_index(usize::try_from(spread).unwrap_or(1))
            .and_then(|index| u32::try_from(index).ok())
            .unwrap_or(0);
        let count = self.config.min_fragments.saturating_add(extra);

        let fragments = (0..count).map(|_| fragment(rng)).collect::<Vec<_>>();
        let burst = GlitchBurst {
            id: GlitchId::new(),
            started_at_ms: now_ms,
            ends_at_ms: now_ms.saturating_add(self.config.burst_ms),
            fragments,
        };
        self.burst = Some(burst.clone());
        self.glitches = self.glitches.saturating_add(1);

        debug!(
            fragments = burst.fragments.len(),
            distortion = state.distortion,
            "Reality glitch"
        );
        Some(burst)
    }

    /// End the burst on screen if it is over at `now_ms`.
    pub fn end_burst(&mut self, now_ms: u64) -> Option<GlitchBurst> {
        if self.burst.as_ref()?.ends_at_ms > now_ms {
            return None;
        }
        self.burst.take()
    }

    /// The burst on screen, if any.
    pub const fn active_burst(&self) -> Option<&GlitchBurst> {
        self.burst.as_ref()
    }

    /// Total glitches since creation or the last reset.
    pub const fn glitches(&self) -> u64 {
        self.glitches
    }

    /// Drop the burst on screen and the glitch count.
    pub fn reset(&mut self) {
        self.burst = None;
        self.glitches = 0;
    }
}

fn fragment(rng: &mut dyn RandomSource) -> GlitchFragment {
    let x = rng.uniform(0.0, 100.0);
    let y = rng.uniform(0.0, 100.0);
    let width = rng.uniform(10.0, 60.0);
    let height = rng.uniform(2.0, 10.0);
    let color = rng
        .pick_index(PALETTE.len())
        .and_then(|index| PALETTE.get(index))
        .copied()
        .unwrap_or("#ff0000");
    let duration_ms = 100_u64.saturating_add(draw_ms(rng, 0.0, 400));
    GlitchFragment {
        x,
        y,
        width,
        height,
        color: color.to_owned(),
        duration_ms,
    }
}

/// Draw a whole number of milliseconds in `[low, low + span)`.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn draw_ms(rng: &mut dyn RandomSource, low: f64, span: u64) -> u64 {
    rng.uniform(low, low + span as f64).floor() as u64
}
