//! Escalation scheduler: recurring, probabilistic revelation popups.
//!
//! On every escalation tick the scheduler reads the current omniscience and
//! decides whether to surface a catalog message. Both the debounce interval
//! and the trigger threshold fall as omniscience rises, so popups become
//! more frequent the more the visitor engages.
//!
//! # Tick procedure
//!
//! 1. At or above the suppression level every live popup is cleared and
//!    nothing is drawn.
//! 2. Draw a jitter in `[0, max_jitter_ms)` and a trigger value.
//! 3. Emit only if the trigger value exceeds
//!    `base_trigger_threshold - omniscience / threshold_divisor` **and**
//!    more than `interval + jitter` has passed since the previous emission.
//! 4. Pick uniformly among the unlocked catalog entries, then draw the
//!    popup position inside the configured margins.
//!
//! Popups expire individually after their tier lifetime and are also
//! removed by a periodic safety sweep once they reach the ceiling age.

use omniscience_types::{EngagementState, Intensity, Revelation, RevelationId, ScreenPosition};
use tracing::debug;

use crate::catalog::{self, CatalogEntry};
use crate::config::EscalationConfig;
use crate::random::RandomSource;

/// Result of one escalation tick.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Omniscience is at the suppression level; these popups were cleared.
    Suppressed {
        /// Popups removed by the suppression.
        cleared: Vec<Revelation>,
    },
    /// The trigger draw did not exceed the threshold.
    NotTriggered,
    /// Triggered, but too soon after the previous emission.
    Debounced,
    /// Triggered, but no catalog entry is unlocked yet.
    NothingUnlocked,
    /// A new popup was emitted.
    Emitted(Revelation),
}

/// Drives revelation popups and tracks the live set.
#[derive(Debug, Clone)]
pub struct EscalationScheduler {
    config: EscalationConfig,
    active: Vec<Revelation>,
    last_emission_ms: Option<u64>,
    emitted: u64,
}

impl EscalationScheduler {
    /// Create a scheduler with no live popups.
    pub const fn new(config: EscalationConfig) -> Self {
        Self {
            config,
            active: Vec::new(),
            last_emission_ms: None,
            emitted: 0,
        }
    }

    /// Debounce interval before jitter:
    /// `max(min_interval_ms, base_interval_ms - omniscience * interval_step_ms)`.
    pub fn base_interval_ms(&self, omniscience: f64) -> f64 {
        let shrunk = omniscience
            .mul_add(-self.config.interval_step_ms, ms(self.config.base_interval_ms));
        shrunk.max(ms(self.config.min_interval_ms))
    }

    /// Value a trigger draw must exceed at the given omniscience.
    pub fn trigger_threshold(&self, omniscience: f64) -> f64 {
        self.config.base_trigger_threshold - omniscience / self.config.threshold_divisor
    }

    /// Run one escalation tick at session time `now_ms`.
    pub fn tick(
        &mut self,
        now_ms: u64,
        state: &EngagementState,
        rng: &mut dyn RandomSource,
    ) -> TickOutcome {
        let omniscience = state.omniscience;
        if omniscience >= self.config.suppress_at {
            return TickOutcome::Suppressed {
                cleared: self.clear_all(),
            };
        }

        let jitter = rng.uniform(0.0, ms(self.config.max_jitter_ms));
        let draw = rng.next_unit();
        if draw <= self.trigger_threshold(omniscience) {
            return TickOutcome::NotTriggered;
        }

        if let Some(last) = self.last_emission_ms {
            let elapsed = ms(now_ms.saturating_sub(last));
            if elapsed <= self.base_interval_ms(omniscience) + jitter {
                return TickOutcome::Debounced;
            }
        }

        let unlocked = catalog::unlocked(omniscience);
        let Some(entry) = rng
            .pick_index(unlocked.len())
            .and_then(|index| unlocked.get(index))
        else {
            return TickOutcome::NothingUnlocked;
        };

        let revelation = self.build(entry, now_ms, rng);
        self.active.push(revelation.clone());
        self.last_emission_ms = Some(now_ms);
        self.emitted = self.emitted.saturating_add(1);

        debug!(
            key = entry.key,
            intensity = ?entry.intensity,
            omniscience,
            live = self.active.len(),
            "Revelation emitted"
        );
        TickOutcome::Emitted(revelation)
    }

    /// Remove every popup whose lifetime has elapsed at `now_ms`.
    pub fn expire(&mut self, now_ms: u64) -> Vec<Revelation> {
        self.remove_where(|revelation| revelation.is_expired(now_ms))
    }

    /// Remove every popup at least `safety_ceiling_ms` old.
    pub fn sweep(&mut self, now_ms: u64) -> Vec<Revelation> {
        let ceiling = self.config.safety_ceiling_ms;
        self.remove_where(|revelation| now_ms.saturating_sub(revelation.shown_at_ms) >= ceiling)
    }

    /// Remove one popup before it expires.
    pub fn dismiss(&mut self, id: RevelationId) -> Option<Revelation> {
        let index = self.active.iter().position(|revelation| revelation.id == id)?;
        Some(self.active.remove(index))
    }

    /// Remove every live popup.
    pub fn clear_all(&mut self) -> Vec<Revelation> {
        std::mem::take(&mut self.active)
    }

    /// Session time at which the earliest live popup expires.
    pub fn next_expiry(&self) -> Option<u64> {
        self.active
            .iter()
            .map(|revelation| revelation.shown_at_ms.saturating_add(revelation.lifetime_ms))
            .min()
    }

    /// Popups currently on screen, in emission order.
    pub fn active(&self) -> &[Revelation] {
        &self.active
    }

    /// Total popups emitted since creation or the last reset.
    pub const fn emitted(&self) -> u64 {
        self.emitted
    }

    /// Drop all popups and forget the previous emission.
    pub fn reset(&mut self) {
        self.active.clear();
        self.last_emission_ms = None;
        self.emitted = 0;
    }

    /// On-screen lifetime for a tier.
    pub const fn lifetime_ms(&self, intensity: Intensity) -> u64 {
        match intensity {
            Intensity::Low => self.config.lifetime_low_ms,
            Intensity::Medium => self.config.lifetime_medium_ms,
            Intensity::High => self.config.lifetime_high_ms,
            Intensity::Extreme => self.config.lifetime_extreme_ms,
        }
    }

    fn build(
        &self,
        entry: &CatalogEntry,
        now_ms: u64,
        rng: &mut dyn RandomSource,
    ) -> Revelation {
        let x = rng.uniform(self.config.x_min_pct, self.config.x_max_pct);
        let y = rng.uniform(self.config.y_min_pct, self.config.y_max_pct);
        Revelation {
            id: RevelationId::new(),
            key: entry.key.to_owned(),
            text: entry.text.to_owned(),
            intensity: entry.intensity,
            position: ScreenPosition { x, y },
            shown_at_ms: now_ms,
            lifetime_ms: self.lifetime_ms(entry.intensity),
        }
    }

    fn remove_where(&mut self, predicate: impl Fn(&Revelation) -> bool) -> Vec<Revelation> {
        let (removed, kept): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.active).into_iter().partition(predicate);
        self.active = kept;
        removed
    }
}

#[allow(clippy::cast_precision_loss)]
const fn ms(value: u64) -> f64 {
    value as f64
}

#[cfg(test)]
#[allow(clippy::float_cmp, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::random::{ScriptedRandom, SeededRandom};

    fn at(omniscience: f64) -> EngagementState {
        EngagementState {
            omniscience,
            ..EngagementState::INITIAL
        }
    }

    fn scheduler() -> EscalationScheduler {
        EscalationScheduler::new(EscalationConfig::default())
    }

    #[test]
    fn interval_shrinks_to_floor() {
        let s = scheduler();
        assert_eq!(s.base_interval_ms(0.0), 10_000.0);
        assert_eq!(s.base_interval_ms(50.0), 6_000.0);
        assert_eq!(s.base_interval_ms(87.5), 3_000.0);
        assert_eq!(s.base_interval_ms(99.0), 3_000.0);
    }

    #[test]
    fn threshold_falls_with_omniscience() {
        let s = scheduler();
        assert!((s.trigger_threshold(0.0) - 0.7).abs() < 1e-12);
        assert!((s.trigger_threshold(80.0) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn first_trigger_emits_unlocked_entry() {
        let mut s = scheduler();
        // jitter, trigger, pick, x, y
        let mut rng = ScriptedRandom::new(vec![0.0, 0.9, 0.0, 0.5, 0.5]);
        let outcome = s.tick(1_000, &at(35.0), &mut rng);

        let TickOutcome::Emitted(revelation) = outcome else {
            panic!("expected emission, got {outcome:?}");
        };
        assert_eq!(revelation.key, "watching1");
        assert_eq!(revelation.intensity, Intensity::Low);
        assert_eq!(revelation.lifetime_ms, 2_000);
        assert_eq!(revelation.position, ScreenPosition { x: 50.0, y: 45.0 });
        assert_eq!(s.active().len(), 1);
        assert_eq!(rng.draws(), 5);
    }

    #[test]
    fn draw_equal_to_threshold_does_not_trigger() {
        let mut s = scheduler();
        let mut rng = ScriptedRandom::new(vec![0.0, 0.7]);
        assert_eq!(s.tick(0, &at(0.0), &mut rng), TickOutcome::NotTriggered);
    }

    #[test]
    fn debounce_holds_until_interval_passes() {
        let mut s = scheduler();
        let mut rng = ScriptedRandom::new(vec![0.0, 0.99, 0.0, 0.5, 0.5]);
        assert!(matches!(
            s.tick(0, &at(50.0), &mut rng),
            TickOutcome::Emitted(_)
        ));

        // Interval at 50 is 6000 ms with zero jitter.
        let mut rng = ScriptedRandom::new(vec![0.0, 0.99]);
        assert_eq!(s.tick(6_000, &at(50.0), &mut rng), TickOutcome::Debounced);

        let mut rng = ScriptedRandom::new(vec![0.0, 0.99, 0.0, 0.5, 0.5]);
        assert!(matches!(
            s.tick(6_001, &at(50.0), &mut rng),
            TickOutcome::Emitted(_)
        ));
        assert_eq!(s.active().len(), 2);
    }

    #[test]
    fn jitter_extends_debounce() {
        let mut s = scheduler();
        let mut rng = ScriptedRandom::new(vec![0.0, 0.99, 0.0, 0.5, 0.5]);
        s.tick(0, &at(50.0), &mut rng);

        // Jitter draw 0.5 adds 1000 ms.
        let mut rng = ScriptedRandom::new(vec![0.5, 0.99]);
        assert_eq!(s.tick(6_500, &at(50.0), &mut rng), TickOutcome::Debounced);
    }

    #[test]
    fn nothing_unlocked_below_thirty() {
        let mut s = scheduler();
        let mut rng = ScriptedRandom::new(vec![0.0, 0.99]);
        assert_eq!(s.tick(0, &at(25.0), &mut rng), TickOutcome::NothingUnlocked);
        assert!(s.active().is_empty());
        assert_eq!(s.emitted(), 0);
    }

    #[test]
    fn suppressed_at_full_omniscience() {
        let mut s = scheduler();
        let mut rng = ScriptedRandom::new(vec![0.0, 0.99, 0.0, 0.5, 0.5]);
        s.tick(0, &at(90.0), &mut rng);
        assert_eq!(s.active().len(), 1);

        let mut rng = ScriptedRandom::constant(0.99);
        let outcome = s.tick(10_000, &at(100.0), &mut rng);
        let TickOutcome::Suppressed { cleared } = outcome else {
            panic!("expected suppression, got {outcome:?}");
        };
        assert_eq!(cleared.len(), 1);
        assert!(s.active().is_empty());
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn lifetimes_follow_intensity() {
        let s = scheduler();
        assert_eq!(s.lifetime_ms(Intensity::Low), 2_000);
        assert_eq!(s.lifetime_ms(Intensity::Medium), 2_500);
        assert_eq!(s.lifetime_ms(Intensity::High), 3_000);
        assert_eq!(s.lifetime_ms(Intensity::Extreme), 4_000);
    }

    #[test]
    fn popups_expire_individually() {
        let mut s = scheduler();
        // Low entry at 0, extreme entry at 20_000.
        let mut rng = ScriptedRandom::new(vec![0.0, 0.99, 0.0, 0.5, 0.5]);
        s.tick(0, &at(35.0), &mut rng);
        let mut rng = ScriptedRandom::new(vec![0.0, 0.99, 0.99, 0.5, 0.5]);
        s.tick(20_000, &at(99.0), &mut rng);
        assert_eq!(s.active().len(), 2);
        assert_eq!(s.next_expiry(), Some(2_000));

        let expired = s.expire(21_999);
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].key, "watching1");
        assert_eq!(s.next_expiry(), Some(24_000));
        assert_eq!(s.expire(24_000).len(), 1);
        assert!(s.active().is_empty());
    }

    #[test]
    fn sweep_removes_popups_at_ceiling() {
        let mut s = scheduler();
        let mut rng = ScriptedRandom::new(vec![0.0, 0.99, 0.0, 0.5, 0.5]);
        s.tick(1_000, &at(35.0), &mut rng);
        assert!(s.sweep(6_999).is_empty());
        assert_eq!(s.sweep(7_000).len(), 1);
    }

    #[test]
    fn dismiss_removes_one_popup() {
        let mut s = scheduler();
        let mut rng = ScriptedRandom::new(vec![0.0, 0.99, 0.0, 0.5, 0.5]);
        let TickOutcome::Emitted(revelation) = s.tick(0, &at(35.0), &mut rng) else {
            panic!("expected emission");
        };
        assert!(s.dismiss(revelation.id).is_some());
        assert!(s.dismiss(revelation.id).is_none());
        assert!(s.active().is_empty());
    }

    #[test]
    fn reset_forgets_last_emission() {
        let mut s = scheduler();
        let mut rng = ScriptedRandom::new(vec![0.0, 0.99, 0.0, 0.5, 0.5]);
        s.tick(0, &at(50.0), &mut rng);
        s.reset();
        assert!(s.active().is_empty());
        let mut rng = ScriptedRandom::new(vec![0.0, 0.99, 0.0, 0.5, 0.5]);
        assert!(matches!(s.tick(1, &at(50.0), &mut rng), TickOutcome::Emitted(_)));
    }

    fn emissions_over(omniscience: f64, seed: u64) -> u64 {
        let mut s = scheduler();
        let mut rng = SeededRandom::new(seed);
        let state = at(omniscience);
        for second in 0..3_600_u64 {
            let now = second * 1_000;
            s.tick(now, &state, &mut rng);
            s.expire(now);
        }
        s.emitted()
    }

    #[test]
    fn higher_omniscience_emits_more_often() {
        for seed in [1, 2, 3] {
            let low = emissions_over(20.0, seed);
            let mid = emissions_over(40.0, seed);
            let high = emissions_over(80.0, seed);
            assert_eq!(low, 0);
            assert!(high >= mid, "seed {seed}: 80 -> {high}, 40 -> {mid}");
            assert!(high >= low);
        }
    }
}
