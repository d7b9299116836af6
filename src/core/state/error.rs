//! Errors raised while building contexts and starting load tasks.

use thiserror::Error;

/// Problems found by the startup validation pass over a state table.
///
/// These are programming errors: they are reported before any tick runs
/// rather than at transition time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("No states registered. Add at least one state before .build()")]
    NoStates,

    #[error("State {key} registered more than once")]
    DuplicateState { key: String },

    #[error("Initial state {key} is not registered")]
    UnregisteredInitial { key: String },

    #[error("Default state {key} is not registered")]
    UnregisteredDefault { key: String },

    #[error("State {from} declares a transition to unregistered state {to}")]
    UnregisteredTarget { from: String, to: String },

    #[error("History capacity must be at least 1")]
    ZeroHistoryCapacity,

    #[error("Settle pass limit must be at least 1")]
    ZeroSettlePasses,
}

/// Failure to start a cooperative load task.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The worker thread could not be spawned.
    #[error("Failed to spawn load worker: {0}")]
    Spawn(#[from] std::io::Error),

    /// The collaborator refused to start the work.
    #[error("Load rejected: {0}")]
    Rejected(String),
}
