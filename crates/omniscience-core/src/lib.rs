//! State store, signal collection, and escalation for the Omniscience
//! engagement engine.
//!
//! This crate owns everything that turns a visitor's raw input into the
//! page's escalating reactions: the single engagement state, the sampled
//! interaction log, the revelation popups, and the threshold signals that
//! drive the page's atmosphere.
//!
//! # Modules
//!
//! - [`store`] -- The engagement state and its pure transition function,
//!   with broadcast observers.
//! - [`signals`] -- Declarative signal subscriptions, reconciled against
//!   what each listener wants.
//! - [`collector`] -- Interaction collector: sampling, tracked-event log,
//!   and session statistics.
//! - [`catalog`] -- The ordered revelation messages and their unlock levels.
//! - [`scheduler`] -- Escalation scheduler emitting revelation popups.
//! - [`gate`] -- Threshold gate turning the state into edge and level
//!   signals.
//! - [`glitch`] -- Reality glitch bursts.
//! - [`watchers`] -- Watching eyes and the awakened resonance.
//! - [`tasks`] -- Named, independently cancellable timers.
//! - [`session`] -- One visitor's session wiring every component together.
//! - [`control`] -- Pause, resume, and stop flags shared with the host.
//! - [`runner`] -- The async loop driving a session from a channel.
//! - [`config`] -- Configuration loading from `omniscience-config.yaml`.
//! - [`random`] -- The injectable random source.

pub mod catalog;
pub mod collector;
pub mod config;
pub mod control;
pub mod gate;
pub mod glitch;
pub mod random;
pub mod runner;
pub mod scheduler;
pub mod session;
pub mod signals;
pub mod store;
pub mod tasks;
pub mod watchers;
