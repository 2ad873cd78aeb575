//! Error types for the engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during startup and the session run.

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: omniscience_core::config::ConfigError,
    },

    /// The session loop failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: omniscience_core::runner::RunnerError,
    },

    /// The simulated visitor could not be configured or stopped badly.
    #[error("visitor error: {message}")]
    Visitor {
        /// Description of the visitor failure.
        message: String,
    },

    /// The session summary could not be serialized.
    #[error("summary error: {source}")]
    Summary {
        /// The underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}
