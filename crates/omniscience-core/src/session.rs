//! One page session: the engine components wired together.
//!
//! A [`Session`] owns the store, the signal router, every engine
//! component, the random source, and the named task schedule. All entry
//! points are synchronous and take the current session time in
//! milliseconds; the async runner in [`crate::runner`] only decides *when*
//! to call them.
//!
//! After every entry point the session re-reads the engagement snapshot
//! and lets each component react to it: the collector may activate, the
//! resonance re-subscribes, eyes are re-placed, glitch checks start or
//! stop, popups are suppressed at full omniscience, and the threshold gate
//! is evaluated. What happened is returned as a list of [`SessionEvent`]s.

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Utc};
use omniscience_types::{
    EdgeSignal, EngagementAction, EngagementState, GlitchBurst, GlitchId, LevelSignal, RawSignal,
    Revelation, RevelationId, SessionId, SessionStats, SignalKind, TrackedEvent, WatcherEye,
};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::collector::InteractionCollector;
use crate::config::EngineConfig;
use crate::gate::ThresholdGate;
use crate::glitch::GlitchScheduler;
use crate::random::RandomSource;
use crate::scheduler::{EscalationScheduler, TickOutcome};
use crate::signals::{Listener, SignalRouter};
use crate::store::EngagementStore;
use crate::tasks::{TaskKind, TaskSchedule};
use crate::watchers::{Resonance, WatcherOverlay};

/// Something observable that happened during a session entry point.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// The collector crossed its activation threshold and started
    /// listening.
    CollectorActivated,
    /// The collector forwarded a signal.
    Tracked(TrackedEvent),
    /// The awakened resonance reacted to a signal.
    Resonated {
        /// Class of the resonating signal.
        kind: SignalKind,
    },
    /// A revelation popup appeared.
    RevelationShown(Revelation),
    /// A revelation popup was removed.
    RevelationCleared {
        /// The removed popup.
        id: RevelationId,
    },
    /// The one-shot full revelation fired.
    FullRevelation,
    /// The visitor closed the full revelation.
    FullRevelationDismissed,
    /// A level-triggered warning is active.
    Level {
        /// The active warning.
        signal: LevelSignal,
    },
    /// A reality glitch burst started.
    GlitchStarted(GlitchBurst),
    /// A reality glitch burst ended.
    GlitchEnded {
        /// The finished burst.
        id: GlitchId,
    },
    /// The watching eyes were re-placed or removed.
    WatchersChanged {
        /// Eyes now shown.
        eyes: Vec<WatcherEye>,
    },
    /// The engagement state was reset.
    StateReset,
}

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Built but not started; no timers exist yet.
    Created,
    /// Timers scheduled and signals accepted.
    Running,
    /// Every timer and subscription released.
    TornDown,
}

/// Counters kept across the whole session, resets included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionCounters {
    /// Raw signals delivered to the session.
    pub signals_received: u64,
    /// Signals the collector forwarded.
    pub signals_forwarded: u64,
    /// Signals the resonance reacted to.
    pub resonances: u64,
    /// Revelation popups emitted.
    pub revelations_emitted: u64,
    /// Full revelations fired.
    pub full_revelations: u64,
    /// Reality glitches.
    pub glitches: u64,
    /// Invocations of the call to action.
    pub invocations: u64,
    /// Store resets.
    pub resets: u64,
}

/// End-of-session report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    /// The session.
    pub session_id: SessionId,
    /// Wall-clock start.
    pub started_at: DateTime<Utc>,
    /// Wall-clock time the summary was taken.
    pub ended_at: DateTime<Utc>,
    /// Session time when the summary was taken, in milliseconds.
    pub session_ms: u64,
    /// Final engagement state.
    pub final_state: EngagementState,
    /// Visitor statistics.
    pub stats: SessionStats,
    /// Session-wide counters.
    pub counters: SessionCounters,
    /// Store transitions applied.
    pub transitions: u64,
}

/// A page session.
pub struct Session {
    id: SessionId,
    config: EngineConfig,
    rng: Box<dyn RandomSource + Send>,
    store: EngagementStore,
    router: SignalRouter,
    collector: InteractionCollector,
    resonance: Resonance,
    watchers: WatcherOverlay,
    scheduler: EscalationScheduler,
    gate: ThresholdGate,
    glitch: GlitchScheduler,
    tasks: TaskSchedule,
    phase: SessionPhase,
    now_ms: u64,
    started_at: DateTime<Utc>,
    counters: SessionCounters,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("phase", &self.phase)
            .field("now_ms", &self.now_ms)
            .field("state", &self.store.snapshot())
            .field("tasks", &self.tasks)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Build a session from configuration and a random source.
    pub fn new(config: EngineConfig, rng: Box<dyn RandomSource + Send>) -> Self {
        Self {
            id: SessionId::new(),
            collector: InteractionCollector::new(config.collector.clone()),
            resonance: Resonance::new(config.watchers.clone()),
            watchers: WatcherOverlay::new(config.watchers.clone()),
            scheduler: EscalationScheduler::new(config.escalation.clone()),
            gate: ThresholdGate::new(config.gate.clone()),
            glitch: GlitchScheduler::new(config.glitch.clone()),
            config,
            rng,
            store: EngagementStore::new(),
            router: SignalRouter::new(),
            tasks: TaskSchedule::new(),
            phase: SessionPhase::Created,
            now_ms: 0,
            started_at: Utc::now(),
            counters: SessionCounters::default(),
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Schedule the recurring tasks and start accepting signals.
    ///
    /// Has no effect unless the session is freshly created.
    pub fn start(&mut self, now_ms: u64) -> Vec<SessionEvent> {
        if self.phase != SessionPhase::Created {
            return Vec::new();
        }
        self.phase = SessionPhase::Running;
        self.now_ms = now_ms;

        self.tasks.schedule_every(
            TaskKind::SessionClock,
            now_ms,
            self.config.session.clock_period_ms,
        );
        self.tasks.schedule_every(
            TaskKind::EscalationTick,
            now_ms,
            self.config.escalation.tick_ms,
        );
        self.tasks.schedule_every(
            TaskKind::RevelationSweep,
            now_ms,
            self.config.escalation.sweep_period_ms,
        );
        self.tasks.schedule_every(
            TaskKind::EventLogSweep,
            now_ms,
            self.config.collector.sweep_period_ms,
        );

        info!(
            session_id = %self.id,
            tasks = self.tasks.len(),
            "Session started"
        );

        let mut events = Vec::new();
        self.react(&mut events);
        events
    }

    /// Cancel every task, release every subscription, and report.
    ///
    /// Idempotent: tearing down twice releases nothing the second time.
    pub fn teardown(&mut self, now_ms: u64) -> SessionSummary {
        if self.phase != SessionPhase::TornDown {
            self.advance(now_ms);
            let cancelled = self.tasks.cancel_all();
            self.collector.teardown(&mut self.router);
            Resonance::teardown(&mut self.router);
            let leftover = self.router.release_all();
            self.phase = SessionPhase::TornDown;
            info!(
                session_id = %self.id,
                cancelled,
                leftover,
                session_ms = self.now_ms,
                "Session torn down"
            );
        }
        self.summary()
    }

    // -----------------------------------------------------------------------
    // Entry points
    // -----------------------------------------------------------------------

    /// Deliver one raw signal from the page.
    ///
    /// The signal goes to every listener subscribed to its class; a
    /// signal nobody subscribes to is dropped here.
    pub fn handle_signal(&mut self, now_ms: u64, signal: &RawSignal) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if self.phase != SessionPhase::Running {
            return events;
        }
        self.advance(now_ms);
        self.counters.signals_received = self.counters.signals_received.saturating_add(1);

        for listener in self.router.listeners_for(signal.kind) {
            match listener {
                Listener::Collector => {
                    if let Some(event) = self.collector.handle(
                        self.now_ms,
                        signal,
                        &mut self.store,
                        self.rng.as_mut(),
                    ) {
                        self.counters.signals_forwarded =
                            self.counters.signals_forwarded.saturating_add(1);
                        events.push(SessionEvent::Tracked(event));
                    }
                }
                Listener::Resonance => {
                    if self
                        .resonance
                        .handle(signal, &mut self.store, self.rng.as_mut())
                    {
                        self.counters.resonances = self.counters.resonances.saturating_add(1);
                        events.push(SessionEvent::Resonated { kind: signal.kind });
                    }
                }
            }
        }

        self.react(&mut events);
        events
    }

    /// Submit an action on behalf of an outside collaborator.
    ///
    /// A `Reset` also returns every component to its initial state.
    pub fn submit_action(&mut self, now_ms: u64, action: EngagementAction) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if self.phase != SessionPhase::Running {
            return events;
        }
        self.advance(now_ms);
        self.store.apply(action);
        if action == EngagementAction::Reset {
            self.reset_components(&mut events);
        }
        self.react(&mut events);
        events
    }

    /// The call to action: one interaction and a chance to awaken.
    pub fn invoke(&mut self, now_ms: u64) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if self.phase != SessionPhase::Running {
            return events;
        }
        self.advance(now_ms);
        self.counters.invocations = self.counters.invocations.saturating_add(1);
        self.store.apply(EngagementAction::RegisterInteraction);
        if self.rng.chance(self.config.session.invoke_awaken_chance) {
            self.store.apply(EngagementAction::ForceAwaken);
        }
        self.react(&mut events);
        events
    }

    /// Return the store and every component to the initial state.
    pub fn reset(&mut self, now_ms: u64) -> Vec<SessionEvent> {
        self.submit_action(now_ms, EngagementAction::Reset)
    }

    /// Run every task due at `now_ms`.
    pub fn run_due(&mut self, now_ms: u64) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if self.phase != SessionPhase::Running {
            return events;
        }
        self.advance(now_ms);
        let now = self.now_ms;

        for kind in self.tasks.take_due(now) {
            debug!(task = kind.name(), now_ms = now, "Task due");
            match kind {
                TaskKind::SessionClock => self.collector.tick_session_clock(now),
                TaskKind::EscalationTick => {
                    let state = self.store.snapshot();
                    match self.scheduler.tick(now, &state, self.rng.as_mut()) {
                        TickOutcome::Emitted(revelation) => {
                            self.counters.revelations_emitted =
                                self.counters.revelations_emitted.saturating_add(1);
                            events.push(SessionEvent::RevelationShown(revelation));
                        }
                        TickOutcome::Suppressed { cleared } => {
                            push_cleared(&mut events, cleared);
                        }
                        TickOutcome::NotTriggered
                        | TickOutcome::Debounced
                        | TickOutcome::NothingUnlocked => {}
                    }
                }
                TaskKind::RevelationExpiry => {
                    let expired = self.scheduler.expire(now);
                    push_cleared(&mut events, expired);
                }
                TaskKind::RevelationSweep => {
                    let swept = self.scheduler.sweep(now);
                    push_cleared(&mut events, swept);
                }
                TaskKind::EventLogSweep => {
                    self.collector.sweep_log(now);
                }
                TaskKind::GlitchCheck => {
                    if let Some(burst) =
                        self.glitch
                            .check(now, &mut self.store, self.rng.as_mut())
                    {
                        self.counters.glitches = self.counters.glitches.saturating_add(1);
                        self.tasks.schedule_once(TaskKind::GlitchEnd, burst.ends_at_ms);
                        events.push(SessionEvent::GlitchStarted(burst));
                    }
                    if self.glitch.is_enabled(&self.store.snapshot()) {
                        let delay = self.glitch.next_check_delay_ms(self.rng.as_mut());
                        self.tasks
                            .schedule_once(TaskKind::GlitchCheck, now.saturating_add(delay));
                    }
                }
                TaskKind::GlitchEnd => {
                    if let Some(burst) = self.glitch.end_burst(now) {
                        events.push(SessionEvent::GlitchEnded { id: burst.id });
                    }
                }
            }
        }

        self.react(&mut events);
        events
    }

    /// Close one revelation popup before it expires.
    pub fn dismiss_revelation(&mut self, id: RevelationId) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if let Some(revelation) = self.scheduler.dismiss(id) {
            events.push(SessionEvent::RevelationCleared { id: revelation.id });
            self.sync_expiry();
        }
        events
    }

    /// Close the full revelation. It stays latched until a reset.
    pub fn dismiss_full_revelation(&mut self) -> Vec<SessionEvent> {
        if self.gate.dismiss_revelation() {
            info!(session_id = %self.id, "Full revelation dismissed");
            vec![SessionEvent::FullRevelationDismissed]
        } else {
            Vec::new()
        }
    }

    // -----------------------------------------------------------------------
    // Read access
    // -----------------------------------------------------------------------

    /// The session identifier.
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Current lifecycle phase.
    pub const fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Latest session time seen, in milliseconds.
    pub const fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Read-only copy of the engagement state.
    pub const fn snapshot(&self) -> EngagementState {
        self.store.snapshot()
    }

    /// Register a state observer.
    pub fn subscribe(&self) -> broadcast::Receiver<EngagementState> {
        self.store.subscribe()
    }

    /// Visitor statistics.
    pub const fn stats(&self) -> SessionStats {
        self.collector.stats()
    }

    /// Session-wide counters.
    pub const fn counters(&self) -> SessionCounters {
        self.counters
    }

    /// The collector's rolling event log.
    pub const fn recent_events(&self) -> &VecDeque<TrackedEvent> {
        self.collector.recent_events()
    }

    /// Revelation popups on screen.
    pub fn active_revelations(&self) -> &[Revelation] {
        self.scheduler.active()
    }

    /// Watching eyes on screen.
    pub fn watchers(&self) -> &[WatcherEye] {
        self.watchers.eyes()
    }

    /// Glitch burst on screen.
    pub const fn active_glitch(&self) -> Option<&GlitchBurst> {
        self.glitch.active_burst()
    }

    /// Whether the full revelation is on screen.
    pub const fn is_full_revelation_visible(&self) -> bool {
        self.gate.is_revelation_visible()
    }

    /// Live signal subscriptions.
    pub const fn router(&self) -> &SignalRouter {
        &self.router
    }

    /// Live timers.
    pub const fn tasks(&self) -> &TaskSchedule {
        &self.tasks
    }

    /// When the next task is due.
    pub fn next_due_ms(&self) -> Option<u64> {
        self.tasks.next_due()
    }

    /// Report on the session so far.
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.id,
            started_at: self.started_at,
            ended_at: Utc::now(),
            session_ms: self.now_ms,
            final_state: self.store.snapshot(),
            stats: self.collector.stats(),
            counters: self.counters,
            transitions: self.store.transitions(),
        }
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// Session time never moves backwards.
    fn advance(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }

    fn react(&mut self, events: &mut Vec<SessionEvent>) {
        let state = self.store.snapshot();

        if self.collector.sync_activation(&state, &mut self.router) {
            events.push(SessionEvent::CollectorActivated);
        }
        Resonance::sync(&state, &mut self.router);

        if self.watchers.sync(state.omniscience, self.rng.as_mut()) {
            events.push(SessionEvent::WatchersChanged {
                eyes: self.watchers.eyes().to_vec(),
            });
        }

        if self.glitch.is_enabled(&state) {
            if !self.tasks.is_scheduled(TaskKind::GlitchCheck) {
                let delay = self.glitch.next_check_delay_ms(self.rng.as_mut());
                self.tasks
                    .schedule_once(TaskKind::GlitchCheck, self.now_ms.saturating_add(delay));
            }
        } else {
            self.tasks.cancel(TaskKind::GlitchCheck);
        }

        if state.omniscience >= self.config.escalation.suppress_at {
            let cleared = self.scheduler.clear_all();
            push_cleared(events, cleared);
        }

        let report = self.gate.evaluate(&state);
        for edge in report.edges {
            match edge {
                EdgeSignal::FullRevelation => {
                    self.counters.full_revelations =
                        self.counters.full_revelations.saturating_add(1);
                    events.push(SessionEvent::FullRevelation);
                }
            }
        }
        events.extend(
            report
                .levels
                .into_iter()
                .map(|signal| SessionEvent::Level { signal }),
        );

        self.sync_expiry();
    }

    fn reset_components(&mut self, events: &mut Vec<SessionEvent>) {
        self.counters.resets = self.counters.resets.saturating_add(1);
        self.collector.reset(&mut self.router);

        let cleared = self.scheduler.clear_all();
        push_cleared(events, cleared);
        self.scheduler.reset();

        if let Some(burst) = self.glitch.active_burst() {
            events.push(SessionEvent::GlitchEnded { id: burst.id });
        }
        self.glitch.reset();
        self.tasks.cancel(TaskKind::GlitchEnd);

        if self.gate.is_revelation_visible() {
            events.push(SessionEvent::FullRevelationDismissed);
        }
        self.gate.reset();

        events.push(SessionEvent::StateReset);
        info!(session_id = %self.id, resets = self.counters.resets, "Session reset");
    }

    fn sync_expiry(&mut self) {
        match self.scheduler.next_expiry() {
            Some(due) => self.tasks.schedule_once(TaskKind::RevelationExpiry, due),
            None => {
                self.tasks.cancel(TaskKind::RevelationExpiry);
            }
        }
    }
}

fn push_cleared(events: &mut Vec<SessionEvent>, cleared: Vec<Revelation>) {
    events.extend(
        cleared
            .into_iter()
            .map(|revelation| SessionEvent::RevelationCleared { id: revelation.id }),
    );
}

#[cfg(test)]
#[allow(clippy::float_cmp, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::random::ScriptedRandom;

    fn session(script: Vec<f64>) -> Session {
        Session::new(
            EngineConfig::default(),
            Box::new(ScriptedRandom::new(script)),
        )
    }

    fn started(script: Vec<f64>) -> Session {
        let mut s = session(script);
        s.start(0);
        s
    }

    fn has(events: &[SessionEvent], wanted: &SessionEvent) -> bool {
        events.iter().any(|event| event == wanted)
    }

    #[test]
    fn start_schedules_named_tasks() {
        let s = started(vec![0.5]);
        assert_eq!(s.phase(), SessionPhase::Running);
        for kind in [
            TaskKind::SessionClock,
            TaskKind::EscalationTick,
            TaskKind::RevelationSweep,
            TaskKind::EventLogSweep,
        ] {
            assert!(s.tasks().is_scheduled(kind), "{kind:?}");
        }
        assert!(!s.tasks().is_scheduled(TaskKind::GlitchCheck));
        assert_eq!(s.next_due_ms(), Some(1_000));
        assert!(s.router().is_idle());
    }

    #[test]
    fn signals_before_start_are_ignored() {
        let mut s = session(vec![0.0]);
        assert!(s.handle_signal(0, &RawSignal::click(0.0, 0.0)).is_empty());
        assert!(s.invoke(0).is_empty());
        assert_eq!(s.snapshot(), EngagementState::INITIAL);
    }

    #[test]
    fn collaborator_distortion_arms_glitch_checks() {
        let mut s = started(vec![0.5]);
        let events = s.submit_action(10, EngagementAction::IncreaseDistortion(35.0));

        assert!(events.is_empty());
        assert_eq!(s.snapshot().distortion, 35.0);
        assert!(!s.snapshot().awakening);
        assert!(s.tasks().is_scheduled(TaskKind::GlitchCheck));
        assert_eq!(s.counters().glitches, 0);
    }

    #[test]
    fn dormant_collector_drops_signals() {
        let mut s = started(vec![0.0]);
        let events = s.handle_signal(10, &RawSignal::click(1.0, 1.0));
        assert!(events.is_empty());
        assert_eq!(s.snapshot().interactions, 0);
        assert_eq!(s.counters().signals_received, 1);
    }

    #[test]
    fn invoke_can_awaken_and_activate_everything() {
        // Awaken draw 0.1 < 0.3; remaining draws place eyes and glitch delay.
        let mut s = started(vec![0.1, 0.5]);
        let events = s.invoke(100);

        let state = s.snapshot();
        assert!(state.awakening);
        assert_eq!(state.omniscience, 25.0);
        assert_eq!(state.interactions, 1);
        assert!(has(&events, &SessionEvent::CollectorActivated));
        assert_eq!(s.router().subscription_count(), 8);
        assert!(s.tasks().is_scheduled(TaskKind::GlitchCheck));
        assert!(s.watchers().is_empty());
    }

    #[test]
    fn invoke_without_awakening() {
        let mut s = started(vec![0.3]);
        s.invoke(0);
        let state = s.snapshot();
        assert!(!state.awakening);
        assert_eq!(state.interactions, 1);
        assert!(s.router().is_idle());
    }

    #[test]
    fn routed_click_reaches_collector_and_resonance() {
        let mut s = started(vec![0.1, 0.5]);
        s.invoke(0);
        let events = s.handle_signal(10, &RawSignal::click(4.0, 2.0));

        assert!(events.iter().any(|e| matches!(e, SessionEvent::Tracked(_))));
        assert!(has(
            &events,
            &SessionEvent::Resonated {
                kind: SignalKind::Click
            }
        ));
        // 25 from awakening, 0.5 from the collector, 2 from resonance.
        assert_eq!(s.snapshot().omniscience, 27.5);
        assert_eq!(s.counters().signals_forwarded, 1);
    }

    #[test]
    fn full_revelation_fires_once_and_suppresses_popups() {
        let mut s = started(vec![0.9]);
        let events = s.submit_action(0, EngagementAction::IncreaseOmniscience(100.0));
        assert!(has(&events, &SessionEvent::FullRevelation));
        assert!(s.is_full_revelation_visible());

        let again = s.submit_action(5, EngagementAction::IncreaseOmniscience(10.0));
        assert!(!has(&again, &SessionEvent::FullRevelation));

        assert_eq!(
            s.dismiss_full_revelation(),
            vec![SessionEvent::FullRevelationDismissed]
        );
        assert!(s.dismiss_full_revelation().is_empty());
        assert_eq!(s.counters().full_revelations, 1);
    }

    #[test]
    fn level_signals_repeat_on_every_reaction() {
        let mut s = started(vec![0.9]);
        s.submit_action(0, EngagementAction::IncreaseDistortion(75.0));
        let events = s.run_due(1_000);
        assert!(has(
            &events,
            &SessionEvent::Level {
                signal: LevelSignal::DistortionWarning
            }
        ));
        let events = s.run_due(2_000);
        assert!(has(
            &events,
            &SessionEvent::Level {
                signal: LevelSignal::DistortionWarning
            }
        ));
    }

    #[test]
    fn reset_restores_everything_but_statistics() {
        let mut s = started(vec![0.1, 0.5]);
        s.invoke(0);
        s.handle_signal(10, &RawSignal::click(0.0, 0.0));
        s.submit_action(20, EngagementAction::IncreaseOmniscience(100.0));
        s.run_due(3_000);

        let events = s.reset(3_500);
        assert!(has(&events, &SessionEvent::StateReset));
        assert_eq!(s.snapshot(), EngagementState::INITIAL);
        assert!(s.router().is_idle());
        assert!(!s.tasks().is_scheduled(TaskKind::GlitchCheck));
        assert!(s.watchers().is_empty());
        assert!(!s.is_full_revelation_visible());
        assert_eq!(s.stats().interactions, 1);
        assert_eq!(s.stats().time_on_site_secs, 3);

        // The full revelation is armed again.
        let events = s.submit_action(4_000, EngagementAction::IncreaseOmniscience(100.0));
        assert!(has(&events, &SessionEvent::FullRevelation));
        assert_eq!(s.counters().full_revelations, 2);
    }

    #[test]
    fn escalation_emits_and_expires_popups() {
        let mut s = started(vec![0.99]);
        s.submit_action(0, EngagementAction::IncreaseOmniscience(35.0));

        let events = s.run_due(1_000);
        let shown = events
            .iter()
            .find_map(|e| match e {
                SessionEvent::RevelationShown(r) => Some(r.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(shown.key, "watching1");
        assert_eq!(s.active_revelations().len(), 1);
        assert_eq!(s.tasks().due_at(TaskKind::RevelationExpiry), Some(3_000));

        let events = s.run_due(3_000);
        assert!(has(&events, &SessionEvent::RevelationCleared { id: shown.id }));
        assert!(s.active_revelations().is_empty());
        assert!(!s.tasks().is_scheduled(TaskKind::RevelationExpiry));
    }

    #[test]
    fn dismissing_a_popup_removes_it() {
        let mut s = started(vec![0.99]);
        s.submit_action(0, EngagementAction::IncreaseOmniscience(35.0));
        let events = s.run_due(1_000);
        let id = events
            .iter()
            .find_map(|e| match e {
                SessionEvent::RevelationShown(r) => Some(r.id),
                _ => None,
            })
            .unwrap();
        assert_eq!(
            s.dismiss_revelation(id),
            vec![SessionEvent::RevelationCleared { id }]
        );
        assert!(s.dismiss_revelation(id).is_empty());
    }

    #[test]
    fn teardown_releases_everything() {
        let mut s = started(vec![0.1, 0.5]);
        s.invoke(0);
        assert!(!s.router().is_idle());

        let summary = s.teardown(9_000);
        assert_eq!(s.phase(), SessionPhase::TornDown);
        assert!(s.tasks().is_empty());
        assert!(s.router().is_idle());
        assert_eq!(summary.session_ms, 9_000);
        assert_eq!(summary.counters.invocations, 1);
        assert!(summary.final_state.awakening);

        // Nothing runs after teardown.
        assert!(s.handle_signal(9_500, &RawSignal::click(0.0, 0.0)).is_empty());
        assert!(s.run_due(20_000).is_empty());
        assert_eq!(s.teardown(30_000).session_ms, 9_000);
    }

    #[test]
    fn session_events_serialize_with_tag() {
        let json = serde_json::to_string(&SessionEvent::Level {
            signal: LevelSignal::DistortionWarning,
        })
        .unwrap();
        assert_eq!(json, r#"{"event":"level","signal":"DistortionWarning"}"#);
        let json = serde_json::to_string(&SessionEvent::StateReset).unwrap();
        assert_eq!(json, r#"{"event":"state_reset"}"#);
    }
}
