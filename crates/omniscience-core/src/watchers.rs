//! The omniscient overlay: watching eyes and the awakened resonance.
//!
//! [`WatcherOverlay`] places eyes on the page once omniscience exceeds a
//! threshold, one more eye per `omniscience_per_eye` points up to a cap.
//! The eyes are re-placed every time the omniscience level changes.
//!
//! [`Resonance`] is a second signal listener that exists only while the
//! visitor is awakened. It holds its own subscriptions (pointer movement,
//! click, scroll) and feeds small omniscience and madness gains straight
//! into the store, independent of the collector's sampling.

use std::collections::BTreeSet;

use omniscience_types::{
    EngagementAction, EngagementState, RawSignal, ScreenPosition, SignalKind, WatcherEye,
};
use tracing::debug;

use crate::config::WatcherConfig;
use crate::random::RandomSource;
use crate::signals::{Listener, SignalRouter};
use crate::store::EngagementStore;

/// Watching eyes drawn over the page.
#[derive(Debug, Clone)]
pub struct WatcherOverlay {
    config: WatcherConfig,
    eyes: Vec<WatcherEye>,
    placed_for: Option<u64>,
}

impl WatcherOverlay {
    /// Create an overlay with no eyes.
    pub const fn new(config: WatcherConfig) -> Self {
        Self {
            config,
            eyes: Vec::new(),
            placed_for: None,
        }
    }

    /// Number of eyes shown at the given omniscience.
    pub fn eye_count(&self, omniscience: f64) -> u32 {
        if omniscience <= self.config.appear_above {
            return 0;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let count = (omniscience / self.config.omniscience_per_eye).floor() as u32;
        count.min(self.config.max_eyes)
    }

    /// Re-place the eyes for a new omniscience level.
    ///
    /// Returns `true` when the set of eyes changed. An unchanged level
    /// keeps the current eyes and draws nothing.
    pub fn sync(&mut self, omniscience: f64, rng: &mut dyn RandomSource) -> bool {
        let count = self.eye_count(omniscience);
        if count == 0 {
            self.placed_for = None;
            if self.eyes.is_empty() {
                return false;
            }
            self.eyes.clear();
            return true;
        }

        let level = omniscience.to_bits();
        if self.placed_for == Some(level) {
            return false;
        }
        self.placed_for = Some(level);
        self.eyes = (0..count)
            .map(|index| WatcherEye {
                index,
                position: ScreenPosition {
                    x: rng.uniform(0.0, 100.0),
                    y: rng.uniform(0.0, 100.0),
                },
                size: rng.uniform(20.0, 50.0),
                blink_delay_secs: rng.uniform(0.0, 5.0),
            })
            .collect();
        true
    }

    /// Eyes currently shown.
    pub fn eyes(&self) -> &[WatcherEye] {
        &self.eyes
    }

    /// Remove every eye.
    pub fn reset(&mut self) {
        self.eyes.clear();
        self.placed_for = None;
    }
}

/// Awakened listener feeding omniscience straight from raw signals.
#[derive(Debug, Clone)]
pub struct Resonance {
    config: WatcherConfig,
}

impl Resonance {
    /// Create a resonance listener.
    pub const fn new(config: WatcherConfig) -> Self {
        Self { config }
    }

    /// Signal classes the resonance listens to for this state.
    pub fn wanted(state: &EngagementState) -> BTreeSet<SignalKind> {
        if state.awakening {
            [SignalKind::PointerMove, SignalKind::Click, SignalKind::Scroll]
                .into_iter()
                .collect()
        } else {
            BTreeSet::new()
        }
    }

    /// Subscribe while awakened, unsubscribe otherwise.
    pub fn sync(state: &EngagementState, router: &mut SignalRouter) {
        router.reconcile(Listener::Resonance, &Self::wanted(state));
    }

    /// React to one routed signal. Returns whether the signal resonated.
    pub fn handle(
        &self,
        signal: &RawSignal,
        store: &mut EngagementStore,
        rng: &mut dyn RandomSource,
    ) -> bool {
        let resonated = match signal.kind {
            SignalKind::PointerMove => {
                if rng.chance(self.config.resonance_pointer_chance) {
                    store.apply(EngagementAction::IncreaseOmniscience(
                        self.config.resonance_pointer_omniscience,
                    ));
                    store.apply(EngagementAction::IncreaseMadness(
                        self.config.resonance_pointer_madness,
                    ));
                    true
                } else {
                    false
                }
            }
            SignalKind::Click => {
                store.apply(EngagementAction::IncreaseOmniscience(
                    self.config.resonance_click_omniscience,
                ));
                true
            }
            SignalKind::Scroll => {
                if store.snapshot().omniscience > self.config.resonance_scroll_above
                    && rng.chance(self.config.resonance_scroll_chance)
                {
                    store.apply(EngagementAction::IncreaseOmniscience(
                        self.config.resonance_scroll_omniscience,
                    ));
                    true
                } else {
                    false
                }
            }
            SignalKind::KeyPress | SignalKind::Focus => false,
        };
        if resonated {
            debug!(kind = signal.kind.label(), "Signal resonated");
        }
        resonated
    }

    /// Release the resonance's subscriptions.
    pub fn teardown(router: &mut SignalRouter) -> usize {
        router.release(Listener::Resonance)
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::random::ScriptedRandom;

    fn overlay() -> WatcherOverlay {
        WatcherOverlay::new(WatcherConfig::default())
    }

    fn resonance() -> Resonance {
        Resonance::new(WatcherConfig::default())
    }

    #[test]
    fn eye_count_follows_omniscience() {
        let o = overlay();
        assert_eq!(o.eye_count(30.0), 0);
        assert_eq!(o.eye_count(31.0), 1);
        assert_eq!(o.eye_count(40.0), 2);
        assert_eq!(o.eye_count(99.0), 4);
        assert_eq!(o.eye_count(100.0), 5);
    }

    #[test]
    fn eyes_regenerate_on_level_change_only() {
        let mut o = overlay();
        let mut rng = ScriptedRandom::constant(0.5);
        assert!(o.sync(45.0, &mut rng));
        assert_eq!(o.eyes().len(), 2);
        assert_eq!(o.eyes()[1].index, 1);
        assert_eq!(o.eyes()[0].size, 35.0);

        let draws = rng.draws();
        assert!(!o.sync(45.0, &mut rng));
        assert_eq!(rng.draws(), draws);

        assert!(o.sync(45.5, &mut rng));
        assert!(o.sync(10.0, &mut rng));
        assert!(o.eyes().is_empty());
        assert!(!o.sync(10.0, &mut rng));
    }

    #[test]
    fn resonance_subscribes_only_while_awakened() {
        let mut router = SignalRouter::new();
        Resonance::sync(&EngagementState::INITIAL, &mut router);
        assert!(router.is_idle());

        let awakened = EngagementState {
            awakening: true,
            ..EngagementState::INITIAL
        };
        Resonance::sync(&awakened, &mut router);
        assert!(router.is_subscribed(Listener::Resonance, SignalKind::Click));
        assert!(!router.is_subscribed(Listener::Resonance, SignalKind::KeyPress));

        Resonance::sync(&EngagementState::INITIAL, &mut router);
        assert!(router.is_idle());
    }

    #[test]
    fn click_always_resonates() {
        let mut store = EngagementStore::new();
        let mut rng = ScriptedRandom::constant(0.99);
        assert!(resonance().handle(&RawSignal::click(0.0, 0.0), &mut store, &mut rng));
        assert_eq!(store.snapshot().omniscience, 2.0);
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn pointer_resonance_adds_madness() {
        let mut store = EngagementStore::new();
        let r = resonance();
        let mut rng = ScriptedRandom::new(vec![0.05, 0.04]);
        let signal = RawSignal::pointer_move(0.0, 0.0);
        assert!(!r.handle(&signal, &mut store, &mut rng));
        assert!(r.handle(&signal, &mut store, &mut rng));
        let state = store.snapshot();
        assert_eq!(state.omniscience, 1.0);
        assert_eq!(state.madness, 0.5);
    }

    #[test]
    fn scroll_resonates_only_above_fifty() {
        let mut store = EngagementStore::new();
        let r = resonance();
        let mut rng = ScriptedRandom::constant(0.0);
        assert!(!r.handle(&RawSignal::scroll(10.0), &mut store, &mut rng));
        assert_eq!(rng.draws(), 0);

        store.apply(EngagementAction::IncreaseOmniscience(51.0));
        assert!(r.handle(&RawSignal::scroll(10.0), &mut store, &mut rng));
        assert_eq!(store.snapshot().omniscience, 52.0);
    }

    #[test]
    fn teardown_releases() {
        let mut router = SignalRouter::new();
        let awakened = EngagementState {
            awakening: true,
            ..EngagementState::INITIAL
        };
        Resonance::sync(&awakened, &mut router);
        assert_eq!(Resonance::teardown(&mut router), 3);
        assert!(router.is_idle());
    }
}
