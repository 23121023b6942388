//! Error types for the engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during engine startup and simulation execution.

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
        source: realm_core::ConfigError,
    },

    /// Content files could not be loaded.
    #[error("content error: {source}")]
    Content {
        /// The underlying content error.
        #[from]
        source: realm_core::ContentError,
    },

    /// Area construction failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: realm_world::WorldError,
    },

    /// The world could not be assembled.
    #[error("realm error: {source}")]
    Realm {
        /// The underlying realm error.
        #[from]
        source: realm_core::RealmError,
    },

    /// Simulation runner failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: realm_core::RunnerError,
    },
}
