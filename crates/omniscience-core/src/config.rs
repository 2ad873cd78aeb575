//! Configuration loading and typed config structures for the engagement engine.
//!
//! The canonical configuration lives in `omniscience-config.yaml` next to the
//! host binary. This module defines strongly-typed structs that mirror the
//! YAML structure, and provides a loader that reads and validates the file.
//!
//! Every tunable of the engine is here, including the sampling
//! probabilities of the collector. None of them are load-bearing: any
//! value passing [`EngineConfig::validate`] yields a working engine.

use std::path::Path;

use serde::Deserialize;

/// Environment variable that overrides [`SessionConfig::seed`].
pub const SEED_ENV_VAR: &str = "OMNISCIENCE_SEED";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed correctly but is outside its meaningful range.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level engine configuration.
///
/// Mirrors the structure of `omniscience-config.yaml`. All fields have
/// defaults matching the behavior of the live site.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EngineConfig {
    /// Session-wide settings (seed, clock, invocation).
    #[serde(default)]
    pub session: SessionConfig,

    /// Interaction collector tuning.
    #[serde(default)]
    pub collector: CollectorConfig,

    /// Escalation scheduler tuning.
    #[serde(default)]
    pub escalation: EscalationConfig,

    /// Threshold gate levels.
    #[serde(default)]
    pub gate: GateConfig,

    /// Reality glitch tuning.
    #[serde(default)]
    pub glitch: GlitchConfig,

    /// Watcher overlay and awakened resonance tuning.
    #[serde(default)]
    pub watchers: WatcherConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `OMNISCIENCE_SEED` overrides `session.seed` when set to an integer.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.session.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Check that every probability lies in `[0, 1]`, every range is
    /// well-formed, and the escalation curve has a usable divisor and step.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let probabilities = [
            ("session.invoke_awaken_chance", self.session.invoke_awaken_chance),
            ("collector.pointer_sample_rate", self.collector.pointer_sample_rate),
            ("collector.scroll_sample_rate", self.collector.scroll_sample_rate),
            (
                "collector.awakened_madness_chance",
                self.collector.awakened_madness_chance,
            ),
            ("glitch.trigger_chance", self.glitch.trigger_chance),
            (
                "watchers.resonance_pointer_chance",
                self.watchers.resonance_pointer_chance,
            ),
            (
                "watchers.resonance_scroll_chance",
                self.watchers.resonance_scroll_chance,
            ),
        ];
        for (field, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid {
                    reason: format!("{field} must be a probability in [0, 1], got {value}"),
                });
            }
        }

        let periods = [
            ("session.clock_period_ms", self.session.clock_period_ms),
            ("collector.sweep_period_ms", self.collector.sweep_period_ms),
            ("escalation.tick_ms", self.escalation.tick_ms),
            ("escalation.sweep_period_ms", self.escalation.sweep_period_ms),
        ];
        for (field, value) in periods {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    reason: format!("{field} must be at least 1"),
                });
            }
        }

        if self.collector.max_log_len == 0 {
            return Err(ConfigError::Invalid {
                reason: "collector.max_log_len must be at least 1".to_owned(),
            });
        }
        if self.escalation.min_interval_ms > self.escalation.base_interval_ms {
            return Err(ConfigError::Invalid {
                reason: "escalation.min_interval_ms exceeds escalation.base_interval_ms"
                    .to_owned(),
            });
        }
        if self.escalation.x_min_pct > self.escalation.x_max_pct
            || self.escalation.y_min_pct > self.escalation.y_max_pct
        {
            return Err(ConfigError::Invalid {
                reason: "escalation placement range is inverted".to_owned(),
            });
        }
        if self.glitch.min_fragments > self.glitch.max_fragments {
            return Err(ConfigError::Invalid {
                reason: "glitch.min_fragments exceeds glitch.max_fragments".to_owned(),
            });
        }
        let divisor = self.escalation.threshold_divisor;
        if !divisor.is_finite() || divisor <= 0.0 {
            return Err(ConfigError::Invalid {
                reason: format!("escalation.threshold_divisor must be positive, got {divisor}"),
            });
        }
        let step = self.escalation.interval_step_ms;
        if !step.is_finite() || step < 0.0 {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "escalation.interval_step_ms must be finite and non-negative, got {step}"
                ),
            });
        }
        if self.watchers.omniscience_per_eye <= 0.0 {
            return Err(ConfigError::Invalid {
                reason: "watchers.omniscience_per_eye must be positive".to_owned(),
            });
        }
        Ok(())
    }
}

/// Session-wide settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SessionConfig {
    /// Seed for the session's random source. `None` seeds from the OS.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Period of the session-time task in milliseconds.
    #[serde(default = "default_clock_period_ms")]
    pub clock_period_ms: u64,

    /// Probability that an invocation also forces the awakening.
    #[serde(default = "default_invoke_awaken_chance")]
    pub invoke_awaken_chance: f64,
}

impl SessionConfig {
    /// Override the seed from `OMNISCIENCE_SEED` when it holds an integer.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(SEED_ENV_VAR)
            && let Ok(seed) = val.trim().parse::<u64>()
        {
            self.seed = Some(seed);
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed: None,
            clock_period_ms: default_clock_period_ms(),
            invoke_awaken_chance: default_invoke_awaken_chance(),
        }
    }
}

/// Interaction collector tuning.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CollectorConfig {
    /// Omniscience the collector must exceed before it starts listening.
    #[serde(default = "default_activation_threshold")]
    pub activation_threshold: f64,

    /// Probability that a raw pointer movement is forwarded.
    #[serde(default = "default_pointer_sample_rate")]
    pub pointer_sample_rate: f64,

    /// Probability that a raw scroll is forwarded.
    #[serde(default = "default_scroll_sample_rate")]
    pub scroll_sample_rate: f64,

    /// Omniscience granted per forwarded signal once awakened.
    #[serde(default = "default_awakened_omniscience_gain")]
    pub awakened_omniscience_gain: f64,

    /// Probability of a madness increment per forwarded signal once awakened.
    #[serde(default = "default_awakened_madness_chance")]
    pub awakened_madness_chance: f64,

    /// Madness granted when the awakened madness roll succeeds.
    #[serde(default = "default_awakened_madness_gain")]
    pub awakened_madness_gain: f64,

    /// Number of forwarded events kept in the rolling log.
    #[serde(default = "default_max_log_len")]
    pub max_log_len: usize,

    /// Age after which a log entry is purged, in milliseconds.
    #[serde(default = "default_max_event_age_ms")]
    pub max_event_age_ms: u64,

    /// Period of the log sweep in milliseconds.
    #[serde(default = "default_sweep_period_ms")]
    pub sweep_period_ms: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            activation_threshold: default_activation_threshold(),
            pointer_sample_rate: default_pointer_sample_rate(),
            scroll_sample_rate: default_scroll_sample_rate(),
            awakened_omniscience_gain: default_awakened_omniscience_gain(),
            awakened_madness_chance: default_awakened_madness_chance(),
            awakened_madness_gain: default_awakened_madness_gain(),
            max_log_len: default_max_log_len(),
            max_event_age_ms: default_max_event_age_ms(),
            sweep_period_ms: default_sweep_period_ms(),
        }
    }
}

/// Escalation scheduler tuning.
///
/// The emission interval is
/// `max(min_interval_ms, base_interval_ms - omniscience * interval_step_ms)`
/// plus a jitter drawn from `[0, max_jitter_ms)`. A tick emits only when
/// its draw exceeds `base_trigger_threshold - omniscience / threshold_divisor`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EscalationConfig {
    /// Period of the escalation tick in milliseconds.
    #[serde(default = "default_escalation_tick_ms")]
    pub tick_ms: u64,

    /// Emission interval at zero omniscience, in milliseconds.
    #[serde(default = "default_base_interval_ms")]
    pub base_interval_ms: u64,

    /// Floor of the emission interval, in milliseconds.
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,

    /// Milliseconds removed from the interval per omniscience point.
    #[serde(default = "default_interval_step_ms")]
    pub interval_step_ms: f64,

    /// Upper bound of the random jitter added to the interval.
    #[serde(default = "default_max_jitter_ms")]
    pub max_jitter_ms: u64,

    /// Trigger threshold at zero omniscience.
    #[serde(default = "default_base_trigger_threshold")]
    pub base_trigger_threshold: f64,

    /// Omniscience divisor lowering the trigger threshold.
    #[serde(default = "default_threshold_divisor")]
    pub threshold_divisor: f64,

    /// Omniscience at which recurring emissions stop entirely.
    #[serde(default = "default_suppress_at")]
    pub suppress_at: f64,

    /// On-screen lifetime of low-intensity popups.
    #[serde(default = "default_lifetime_low_ms")]
    pub lifetime_low_ms: u64,

    /// On-screen lifetime of medium-intensity popups.
    #[serde(default = "default_lifetime_medium_ms")]
    pub lifetime_medium_ms: u64,

    /// On-screen lifetime of high-intensity popups.
    #[serde(default = "default_lifetime_high_ms")]
    pub lifetime_high_ms: u64,

    /// On-screen lifetime of extreme-intensity popups.
    #[serde(default = "default_lifetime_extreme_ms")]
    pub lifetime_extreme_ms: u64,

    /// Age after which the sweep removes any popup, in milliseconds.
    #[serde(default = "default_safety_ceiling_ms")]
    pub safety_ceiling_ms: u64,

    /// Period of the popup sweep in milliseconds.
    #[serde(default = "default_sweep_period_ms")]
    pub sweep_period_ms: u64,

    /// Leftmost popup center, percent of viewport width.
    #[serde(default = "default_x_min_pct")]
    pub x_min_pct: f64,

    /// Rightmost popup center, percent of viewport width.
    #[serde(default = "default_x_max_pct")]
    pub x_max_pct: f64,

    /// Topmost popup center, percent of viewport height.
    #[serde(default = "default_y_min_pct")]
    pub y_min_pct: f64,

    /// Lowest popup center, percent of viewport height.
    #[serde(default = "default_y_max_pct")]
    pub y_max_pct: f64,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_escalation_tick_ms(),
            base_interval_ms: default_base_interval_ms(),
            min_interval_ms: default_min_interval_ms(),
            interval_step_ms: default_interval_step_ms(),
            max_jitter_ms: default_max_jitter_ms(),
            base_trigger_threshold: default_base_trigger_threshold(),
            threshold_divisor: default_threshold_divisor(),
            suppress_at: default_suppress_at(),
            lifetime_low_ms: default_lifetime_low_ms(),
            lifetime_medium_ms: default_lifetime_medium_ms(),
            lifetime_high_ms: default_lifetime_high_ms(),
            lifetime_extreme_ms: default_lifetime_extreme_ms(),
            safety_ceiling_ms: default_safety_ceiling_ms(),
            sweep_period_ms: default_sweep_period_ms(),
            x_min_pct: default_x_min_pct(),
            x_max_pct: default_x_max_pct(),
            y_min_pct: default_y_min_pct(),
            y_max_pct: default_y_max_pct(),
        }
    }
}

/// Threshold gate levels.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GateConfig {
    /// Omniscience that fires the one-shot full revelation.
    #[serde(default = "default_revelation_at")]
    pub revelation_at: f64,

    /// Madness (with awakening) that raises the madness warning.
    #[serde(default = "default_madness_warning_at")]
    pub madness_warning_at: f64,

    /// Distortion that raises the distortion warning.
    #[serde(default = "default_distortion_warning_at")]
    pub distortion_warning_at: f64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            revelation_at: default_revelation_at(),
            madness_warning_at: default_madness_warning_at(),
            distortion_warning_at: default_distortion_warning_at(),
        }
    }
}

/// Reality glitch tuning.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GlitchConfig {
    /// Glitches run while distortion exceeds this, or once awakened.
    #[serde(default = "default_glitch_enable_above")]
    pub enable_above_distortion: f64,

    /// Minimum delay between glitch checks, in milliseconds.
    #[serde(default = "default_glitch_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Upper bound of the random extra delay between checks.
    #[serde(default = "default_glitch_delay_jitter_ms")]
    pub delay_jitter_ms: u64,

    /// Probability that a check produces a glitch.
    #[serde(default = "default_glitch_trigger_chance")]
    pub trigger_chance: f64,

    /// Distortion added by each glitch.
    #[serde(default = "default_glitch_distortion_gain")]
    pub distortion_gain: f64,

    /// How long a glitch burst stays on screen, in milliseconds.
    #[serde(default = "default_glitch_burst_ms")]
    pub burst_ms: u64,

    /// Fewest fragments in a burst.
    #[serde(default = "default_glitch_min_fragments")]
    pub min_fragments: u32,

    /// Most fragments in a burst.
    #[serde(default = "default_glitch_max_fragments")]
    pub max_fragments: u32,
}

impl Default for GlitchConfig {
    fn default() -> Self {
        Self {
            enable_above_distortion: default_glitch_enable_above(),
            base_delay_ms: default_glitch_base_delay_ms(),
            delay_jitter_ms: default_glitch_delay_jitter_ms(),
            trigger_chance: default_glitch_trigger_chance(),
            distortion_gain: default_glitch_distortion_gain(),
            burst_ms: default_glitch_burst_ms(),
            min_fragments: default_glitch_min_fragments(),
            max_fragments: default_glitch_max_fragments(),
        }
    }
}

/// Watcher overlay and awakened resonance tuning.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WatcherConfig {
    /// Eyes appear once omniscience exceeds this.
    #[serde(default = "default_watchers_appear_above")]
    pub appear_above: f64,

    /// Omniscience per additional eye.
    #[serde(default = "default_omniscience_per_eye")]
    pub omniscience_per_eye: f64,

    /// Cap on the number of eyes.
    #[serde(default = "default_max_eyes")]
    pub max_eyes: u32,

    /// Probability that a pointer movement resonates once awakened.
    #[serde(default = "default_resonance_pointer_chance")]
    pub resonance_pointer_chance: f64,

    /// Omniscience granted by a resonating pointer movement.
    #[serde(default = "default_resonance_pointer_omniscience")]
    pub resonance_pointer_omniscience: f64,

    /// Madness granted by a resonating pointer movement.
    #[serde(default = "default_resonance_pointer_madness")]
    pub resonance_pointer_madness: f64,

    /// Omniscience granted by every click once awakened.
    #[serde(default = "default_resonance_click_omniscience")]
    pub resonance_click_omniscience: f64,

    /// Scrolls only resonate above this omniscience.
    #[serde(default = "default_resonance_scroll_above")]
    pub resonance_scroll_above: f64,

    /// Probability that a qualifying scroll resonates.
    #[serde(default = "default_resonance_scroll_chance")]
    pub resonance_scroll_chance: f64,

    /// Omniscience granted by a resonating scroll.
    #[serde(default = "default_resonance_scroll_omniscience")]
    pub resonance_scroll_omniscience: f64,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            appear_above: default_watchers_appear_above(),
            omniscience_per_eye: default_omniscience_per_eye(),
            max_eyes: default_max_eyes(),
            resonance_pointer_chance: default_resonance_pointer_chance(),
            resonance_pointer_omniscience: default_resonance_pointer_omniscience(),
            resonance_pointer_madness: default_resonance_pointer_madness(),
            resonance_click_omniscience: default_resonance_click_omniscience(),
            resonance_scroll_above: default_resonance_scroll_above(),
            resonance_scroll_chance: default_resonance_scroll_chance(),
            resonance_scroll_omniscience: default_resonance_scroll_omniscience(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions for serde
// ---------------------------------------------------------------------------

const fn default_clock_period_ms() -> u64 {
    1_000
}

const fn default_invoke_awaken_chance() -> f64 {
    0.3
}

const fn default_activation_threshold() -> f64 {
    20.0
}

const fn default_pointer_sample_rate() -> f64 {
    0.02
}

const fn default_scroll_sample_rate() -> f64 {
    0.1
}

const fn default_awakened_omniscience_gain() -> f64 {
    0.5
}

const fn default_awakened_madness_chance() -> f64 {
    0.2
}

const fn default_awakened_madness_gain() -> f64 {
    1.0
}

const fn default_max_log_len() -> usize {
    20
}

const fn default_max_event_age_ms() -> u64 {
    6_000
}

const fn default_sweep_period_ms() -> u64 {
    1_000
}

const fn default_escalation_tick_ms() -> u64 {
    1_000
}

const fn default_base_interval_ms() -> u64 {
    10_000
}

const fn default_min_interval_ms() -> u64 {
    3_000
}

const fn default_interval_step_ms() -> f64 {
    80.0
}

const fn default_max_jitter_ms() -> u64 {
    2_000
}

const fn default_base_trigger_threshold() -> f64 {
    0.7
}

const fn default_threshold_divisor() -> f64 {
    200.0
}

const fn default_suppress_at() -> f64 {
    100.0
}

const fn default_lifetime_low_ms() -> u64 {
    2_000
}

const fn default_lifetime_medium_ms() -> u64 {
    2_500
}

const fn default_lifetime_high_ms() -> u64 {
    3_000
}

const fn default_lifetime_extreme_ms() -> u64 {
    4_000
}

const fn default_safety_ceiling_ms() -> u64 {
    6_000
}

const fn default_x_min_pct() -> f64 {
    10.0
}

const fn default_x_max_pct() -> f64 {
    90.0
}

const fn default_y_min_pct() -> f64 {
    10.0
}

const fn default_y_max_pct() -> f64 {
    80.0
}

const fn default_revelation_at() -> f64 {
    100.0
}

const fn default_madness_warning_at() -> f64 {
    80.0
}

const fn default_distortion_warning_at() -> f64 {
    70.0
}

const fn default_glitch_enable_above() -> f64 {
    30.0
}

const fn default_glitch_base_delay_ms() -> u64 {
    2_000
}

const fn default_glitch_delay_jitter_ms() -> u64 {
    3_000
}

const fn default_glitch_trigger_chance() -> f64 {
    0.3
}

const fn default_glitch_distortion_gain() -> f64 {
    5.0
}

const fn default_glitch_burst_ms() -> u64 {
    500
}

const fn default_glitch_min_fragments() -> u32 {
    3
}

const fn default_glitch_max_fragments() -> u32 {
    7
}

const fn default_watchers_appear_above() -> f64 {
    30.0
}

const fn default_omniscience_per_eye() -> f64 {
    20.0
}

const fn default_max_eyes() -> u32 {
    5
}

const fn default_resonance_pointer_chance() -> f64 {
    0.05
}

const fn default_resonance_pointer_omniscience() -> f64 {
    1.0
}

const fn default_resonance_pointer_madness() -> f64 {
    0.5
}

const fn default_resonance_click_omniscience() -> f64 {
    2.0
}

const fn default_resonance_scroll_above() -> f64 {
    50.0
}

const fn default_resonance_scroll_chance() -> f64 {
    0.1
}

const fn default_resonance_scroll_omniscience() -> f64 {
    1.0
}

fn default_log_level() -> String {
    String::from("info")
}
