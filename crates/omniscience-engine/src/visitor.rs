//! Simulated visitor feeding the session loop.
//!
//! Stands in for a real page: the pointer wanders in a random walk across
//! the viewport, the page is scrolled now and then, and the visitor
//! occasionally clicks, types, refocuses the tab, or presses the call to
//! action. Every step is sent as a [`SessionInput`] on the runner channel.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, info};

use omniscience_core::runner::SessionInput;
use omniscience_types::RawSignal;

use crate::error::EngineError;

// -----------------------------------------------------------------------
// Configuration
// -----------------------------------------------------------------------

/// Configuration for the simulated visitor, loaded from the `visitor`
/// section of `omniscience-config.yaml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VisitorConfig {
    /// Seed for the visitor's own walk. `None` seeds from the OS.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Milliseconds between two visitor steps.
    #[serde(default = "default_step_interval_ms")]
    pub step_interval_ms: u64,

    /// How long the visit lasts before the session is ended.
    /// `None` runs until interrupted.
    #[serde(default = "default_visit_duration_secs")]
    pub visit_duration_secs: Option<u64>,

    /// Viewport width in pixels.
    #[serde(default = "default_viewport_width")]
    pub viewport_width: f64,

    /// Viewport height in pixels.
    #[serde(default = "default_viewport_height")]
    pub viewport_height: f64,

    /// Largest pointer displacement per step, in pixels.
    #[serde(default = "default_max_pointer_step")]
    pub max_pointer_step: f64,

    /// Per-step probability of a click.
    #[serde(default = "default_click_chance")]
    pub click_chance: f64,

    /// Per-step probability of a scroll.
    #[serde(default = "default_scroll_chance")]
    pub scroll_chance: f64,

    /// Per-step probability of a key press.
    #[serde(default = "default_key_chance")]
    pub key_chance: f64,

    /// Per-step probability of the tab regaining focus.
    #[serde(default = "default_focus_chance")]
    pub focus_chance: f64,

    /// Per-step probability of pressing the call to action.
    #[serde(default = "default_invoke_chance")]
    pub invoke_chance: f64,
}

impl VisitorConfig {
    /// Check the step interval, the viewport, and that the per-step
    /// probabilities sum to at most one.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.step_interval_ms == 0 {
            return Err(EngineError::Visitor {
                message: String::from("visitor.step_interval_ms must be positive"),
            });
        }
        if !(self.viewport_width > 0.0 && self.viewport_height > 0.0) {
            return Err(EngineError::Visitor {
                message: String::from("visitor viewport must have a positive size"),
            });
        }
        let chances = [
            self.click_chance,
            self.scroll_chance,
            self.key_chance,
            self.focus_chance,
            self.invoke_chance,
        ];
        if chances.iter().any(|p| !(0.0..=1.0).contains(p)) {
            return Err(EngineError::Visitor {
                message: String::from("visitor chances must lie in [0, 1]"),
            });
        }
        if chances.iter().sum::<f64>() > 1.0 {
            return Err(EngineError::Visitor {
                message: String::from("visitor chances must sum to at most 1"),
            });
        }
        Ok(())
    }

    /// The visit duration in milliseconds.
    pub const fn visit_duration_ms(&self) -> Option<u64> {
        match self.visit_duration_secs {
            Some(secs) => Some(secs.saturating_mul(1_000)),
            None => None,
        }
    }
}

impl Default for VisitorConfig {
    fn default() -> Self {
        Self {
            seed: None,
            step_interval_ms: default_step_interval_ms(),
            visit_duration_secs: default_visit_duration_secs(),
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            max_pointer_step: default_max_pointer_step(),
            click_chance: default_click_chance(),
            scroll_chance: default_scroll_chance(),
            key_chance: default_key_chance(),
            focus_chance: default_focus_chance(),
            invoke_chance: default_invoke_chance(),
        }
    }
}

const fn default_step_interval_ms() -> u64 {
    50
}

#[allow(clippy::unnecessary_wraps)]
const fn default_visit_duration_secs() -> Option<u64> {
    Some(180)
}

const fn default_viewport_width() -> f64 {
    1280.0
}

const fn default_viewport_height() -> f64 {
    800.0
}

const fn default_max_pointer_step() -> f64 {
    40.0
}

const fn default_click_chance() -> f64 {
    0.04
}

const fn default_scroll_chance() -> f64 {
    0.1
}

const fn default_key_chance() -> f64 {
    0.02
}

const fn default_focus_chance() -> f64 {
    0.005
}

const fn default_invoke_chance() -> f64 {
    0.01
}

// -----------------------------------------------------------------------
// Walk
// -----------------------------------------------------------------------

/// A visitor wandering over the page.
#[derive(Debug, Clone)]
pub struct Visitor {
    config: VisitorConfig,
    rng: StdRng,
    pointer: (f64, f64),
    scroll_depth: f64,
}

impl Visitor {
    /// Create a visitor with the pointer in the middle of the viewport.
    pub fn new(config: VisitorConfig) -> Self {
        let rng = config
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        let pointer = (config.viewport_width / 2.0, config.viewport_height / 2.0);
        Self {
            config,
            rng,
            pointer,
            scroll_depth: 0.0,
        }
    }

    /// Take one step and return what the page would report.
    ///
    /// A single draw picks click, scroll, key press, focus, or invocation
    /// by their configured chances; anything else is a pointer move.
    pub fn next_input(&mut self) -> SessionInput {
        let roll: f64 = self.rng.random();
        let c = &self.config;
        let mut edge = c.click_chance;
        if roll < edge {
            let (x, y) = self.pointer;
            return SessionInput::Signal(RawSignal::click(x, y));
        }
        edge += c.scroll_chance;
        if roll < edge {
            return SessionInput::Signal(RawSignal::scroll(self.scroll()));
        }
        edge += c.key_chance;
        if roll < edge {
            return SessionInput::Signal(RawSignal::key_press());
        }
        edge += c.focus_chance;
        if roll < edge {
            return SessionInput::Signal(RawSignal::focus());
        }
        edge += c.invoke_chance;
        if roll < edge {
            return SessionInput::Invoke;
        }
        let (x, y) = self.wander();
        SessionInput::Signal(RawSignal::pointer_move(x, y))
    }

    /// Current pointer position.
    pub const fn pointer(&self) -> (f64, f64) {
        self.pointer
    }

    /// Current scroll depth in percent.
    pub const fn scroll_depth(&self) -> f64 {
        self.scroll_depth
    }

    fn wander(&mut self) -> (f64, f64) {
        let step = self.config.max_pointer_step.max(0.0);
        let dx = self.rng.random_range(-1.0_f64..=1.0) * step;
        let dy = self.rng.random_range(-1.0_f64..=1.0) * step;
        let (x, y) = self.pointer;
        self.pointer = (
            (x + dx).clamp(0.0, self.config.viewport_width),
            (y + dy).clamp(0.0, self.config.viewport_height),
        );
        self.pointer
    }

    /// Scroll a little, mostly downwards.
    fn scroll(&mut self) -> f64 {
        let delta = self.rng.random_range(-5.0_f64..=15.0);
        self.scroll_depth = (self.scroll_depth + delta).clamp(0.0, 100.0);
        self.scroll_depth
    }
}

/// Feed the session one visitor step per interval until the runner goes
/// away. Returns the number of inputs sent.
pub async fn run_visitor(mut visitor: Visitor, tx: mpsc::Sender<SessionInput>) -> u64 {
    let period = std::time::Duration::from_millis(visitor.config.step_interval_ms.max(1));
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // The first tick completes immediately.
    interval.tick().await;

    let mut sent: u64 = 0;
    loop {
        interval.tick().await;
        let input = visitor.next_input();
        if tx.send(input).await.is_err() {
            break;
        }
        sent = sent.saturating_add(1);
        if input == SessionInput::Invoke {
            debug!(sent, "Visitor pressed the call to action");
        }
    }
    let (x, y) = visitor.pointer();
    info!(sent, x, y, scroll_depth = visitor.scroll_depth(), "Visitor left");
    sent
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn seeded() -> VisitorConfig {
        VisitorConfig {
            seed: Some(11),
            ..VisitorConfig::default()
        }
    }

    #[test]
    fn defaults_are_valid() {
        assert!(VisitorConfig::default().validate().is_ok());
        assert_eq!(VisitorConfig::default().visit_duration_ms(), Some(180_000));
    }

    #[test]
    fn chances_must_fit_one_draw() {
        let config = VisitorConfig {
            click_chance: 0.6,
            scroll_chance: 0.6,
            ..VisitorConfig::default()
        };
        assert!(config.validate().is_err());

        let config = VisitorConfig {
            key_chance: -0.1,
            ..VisitorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_interval_is_rejected() {
        let config = VisitorConfig {
            step_interval_ms: 0,
            ..VisitorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_partial_yaml() {
        let config: VisitorConfig =
            serde_yml::from_str("seed: 3\nvisit_duration_secs: ~\nclick_chance: 0.5\n").unwrap();
        assert_eq!(config.seed, Some(3));
        assert_eq!(config.visit_duration_ms(), None);
        assert_eq!(config.step_interval_ms, 50);
    }

    #[test]
    fn walk_stays_inside_viewport_and_page() {
        let mut visitor = Visitor::new(seeded());
        for _ in 0..5_000 {
            if let SessionInput::Signal(signal) = visitor.next_input() {
                if let Some((x, y)) = signal.pointer {
                    assert!((0.0..=1280.0).contains(&x));
                    assert!((0.0..=800.0).contains(&y));
                }
                if let Some(depth) = signal.scroll_depth {
                    assert!((0.0..=100.0).contains(&depth));
                }
            }
        }
        let (x, y) = visitor.pointer();
        assert!((0.0..=1280.0).contains(&x) && (0.0..=800.0).contains(&y));
        assert!((0.0..=100.0).contains(&visitor.scroll_depth()));
    }

    #[test]
    fn certain_click_always_clicks() {
        let mut visitor = Visitor::new(VisitorConfig {
            click_chance: 1.0,
            scroll_chance: 0.0,
            key_chance: 0.0,
            focus_chance: 0.0,
            invoke_chance: 0.0,
            ..seeded()
        });
        for _ in 0..100 {
            assert!(matches!(
                visitor.next_input(),
                SessionInput::Signal(RawSignal {
                    kind: omniscience_types::SignalKind::Click,
                    ..
                })
            ));
        }
    }

    #[test]
    fn same_seed_walks_the_same_path() {
        let mut a = Visitor::new(seeded());
        let mut b = Visitor::new(seeded());
        for _ in 0..200 {
            assert_eq!(a.next_input(), b.next_input());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn visitor_stops_when_runner_goes_away() {
        let (tx, mut rx) = mpsc::channel(4);
        let handle = tokio::spawn(run_visitor(Visitor::new(seeded()), tx));

        for _ in 0..3 {
            assert!(rx.recv().await.is_some());
        }
        drop(rx);

        let sent = handle.await.unwrap();
        assert!(sent >= 3);
    }
}
