//! Shared type definitions for the Omniscience engagement engine.
//!
//! This crate is the single source of truth for every type that crosses
//! between the engine and the page's renderers. Types flow downstream to
//! `TypeScript` via `ts-rs` so the front end consumes the same shapes.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for sessions and emitted effects
//! - [`enums`] -- Signal classes, intensity tiers, and gate signals
//! - [`structs`] -- Engagement state, raw signals, and effect payloads
//! - [`actions`] -- Tagged transitions accepted by the state store

pub mod actions;
pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use actions::EngagementAction;
pub use enums::{EdgeSignal, Intensity, LevelSignal, SignalKind};
pub use ids::{GlitchId, RevelationId, SessionId, TrackedEventId};
pub use structs::{
    EngagementState, GlitchBurst, GlitchFragment, LEVEL_CEILING, RawSignal, Revelation,
    ScreenPosition, SessionStats, TrackedEvent, WatcherEye,
};
