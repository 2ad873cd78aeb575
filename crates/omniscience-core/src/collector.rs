//! Interaction collector: turns raw page signals into store transitions.
//!
//! The collector is dormant until omniscience first exceeds its activation
//! threshold. While dormant it holds no signal subscriptions at all. Once
//! active it subscribes to every [`SignalKind`] through the
//! [`SignalRouter`] and, for each routed signal:
//!
//! 1. Records scroll depth in the session statistics (every scroll, sampled
//!    or not).
//! 2. Drops sampled classes (pointer movement, scroll) unless a single
//!    draw falls below the class's sampling rate.
//! 3. Applies exactly one `RegisterInteraction`.
//! 4. If the visitor was already awakened before the signal, also applies
//!    a small omniscience gain and, on a second draw, a madness gain.
//! 5. Appends the event to a bounded rolling log.
//!
//! The log is pruned by age on its own periodic sweep, independent of new
//! signals.

use std::collections::{BTreeSet, VecDeque};

use omniscience_types::{
    EngagementAction, EngagementState, RawSignal, SessionStats, SignalKind, TrackedEvent,
    TrackedEventId,
};
use tracing::{debug, info};

use crate::config::CollectorConfig;
use crate::random::RandomSource;
use crate::signals::{Listener, SignalRouter};
use crate::store::EngagementStore;

/// Samples raw signals into interaction transitions and keeps the rolling
/// event log and session statistics.
#[derive(Debug, Clone)]
pub struct InteractionCollector {
    config: CollectorConfig,
    active: bool,
    log: VecDeque<TrackedEvent>,
    stats: SessionStats,
}

impl InteractionCollector {
    /// Create a dormant collector.
    pub fn new(config: CollectorConfig) -> Self {
        let capacity = config.max_log_len;
        Self {
            config,
            active: false,
            log: VecDeque::with_capacity(capacity),
            stats: SessionStats::default(),
        }
    }

    /// Whether the collector is listening.
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Activate the collector once omniscience exceeds the threshold.
    ///
    /// Activation is latched: a dormant collector subscribes to every
    /// signal class and stays subscribed until it is torn down or reset.
    /// Returns `true` only on the call that activates it.
    pub fn sync_activation(&mut self, state: &EngagementState, router: &mut SignalRouter) -> bool {
        if self.active || state.omniscience <= self.config.activation_threshold {
            return false;
        }
        self.active = true;
        let wanted: BTreeSet<SignalKind> = SignalKind::ALL.into_iter().collect();
        router.reconcile(Listener::Collector, &wanted);
        info!(
            omniscience = state.omniscience,
            threshold = self.config.activation_threshold,
            "Interaction collector activated"
        );
        true
    }

    /// Process one routed signal at session time `now_ms`.
    ///
    /// Returns the logged event when the signal was forwarded, or `None`
    /// when it was sampled away or the collector is dormant.
    pub fn handle(
        &mut self,
        now_ms: u64,
        signal: &RawSignal,
        store: &mut EngagementStore,
        rng: &mut dyn RandomSource,
    ) -> Option<TrackedEvent> {
        if !self.active {
            return None;
        }

        if let Some(depth) = signal.scroll_depth {
            self.record_scroll_depth(depth);
        }

        if signal.kind.is_sampled() && !rng.chance(self.sample_rate(signal.kind)) {
            return None;
        }

        if signal.kind == SignalKind::PointerMove {
            self.stats.mouse_movements = self.stats.mouse_movements.saturating_add(1);
        }

        let awakened = store.snapshot().awakening;
        store.apply(EngagementAction::RegisterInteraction);
        self.stats.interactions = self.stats.interactions.saturating_add(1);

        if awakened {
            store.apply(EngagementAction::IncreaseOmniscience(
                self.config.awakened_omniscience_gain,
            ));
            if rng.chance(self.config.awakened_madness_chance) {
                store.apply(EngagementAction::IncreaseMadness(
                    self.config.awakened_madness_gain,
                ));
            }
        }

        let (x, y) = signal.pointer.unwrap_or((0.0, 0.0));
        let event = TrackedEvent {
            id: TrackedEventId::new(),
            kind: signal.kind,
            at_ms: now_ms,
            x,
            y,
        };
        self.log.push_back(event.clone());
        while self.log.len() > self.config.max_log_len {
            self.log.pop_front();
        }

        debug!(
            kind = signal.kind.label(),
            at_ms = now_ms,
            awakened,
            logged = self.log.len(),
            "Signal forwarded"
        );
        Some(event)
    }

    /// Purge log entries at least `max_event_age_ms` old. Returns how many
    /// were removed.
    pub fn sweep_log(&mut self, now_ms: u64) -> usize {
        let before = self.log.len();
        let max_age = self.config.max_event_age_ms;
        self.log
            .retain(|event| now_ms.saturating_sub(event.at_ms) < max_age);
        before.saturating_sub(self.log.len())
    }

    /// Advance the time-on-site statistic to session time `now_ms`.
    pub const fn tick_session_clock(&mut self, now_ms: u64) {
        self.stats.time_on_site_secs = now_ms / 1_000;
    }

    /// The rolling event log, oldest first.
    pub const fn recent_events(&self) -> &VecDeque<TrackedEvent> {
        &self.log
    }

    /// Current session statistics.
    pub const fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Release every subscription and go dormant. The log is dropped.
    pub fn teardown(&mut self, router: &mut SignalRouter) {
        let released = router.release(Listener::Collector);
        if self.active {
            info!(released, "Interaction collector torn down");
        }
        self.active = false;
        self.log.clear();
    }

    /// Return to the dormant state after a store reset.
    ///
    /// Statistics describe the visit rather than the engagement state, so
    /// they survive the reset.
    pub fn reset(&mut self, router: &mut SignalRouter) {
        router.release(Listener::Collector);
        self.active = false;
        self.log.clear();
    }

    const fn sample_rate(&self, kind: SignalKind) -> f64 {
        match kind {
            SignalKind::PointerMove => self.config.pointer_sample_rate,
            SignalKind::Scroll => self.config.scroll_sample_rate,
            SignalKind::Click | SignalKind::KeyPress | SignalKind::Focus => 1.0,
        }
    }

    fn record_scroll_depth(&mut self, depth: f64) {
        if depth.is_nan() {
            return;
        }
        let depth = depth.clamp(0.0, 100.0).round();
        self.stats.scroll_depth = self.stats.scroll_depth.max(depth);
    }
}
