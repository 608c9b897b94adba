//! Error types
//!
//! Nothing here is fatal to the process: the worst outcome is a run that
//! fails to start and can be retried.

use thiserror::Error;

/// Errors surfaced by the core and its collaborators.
#[derive(Error, Debug)]
pub enum Error {
    /// A collaborator (audio, renderer) failed to set up; the run does not start.
    #[error("initialization failed: {0}")]
    Initialization(String),

    /// Unknown target name handed to the meta state machine.
    #[error("invalid state transition to '{0}'")]
    InvalidTransition(String),

    /// Stored data could not be parsed. Always recovered locally.
    #[error("corrupt persisted state: {0}")]
    CorruptState(#[from] serde_json::Error),

    /// A transition listener failed or panicked.
    #[error("transition listener failed: {0}")]
    Listener(String),

    /// Storage back-end I/O failure.
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// A tuning document failed validation.
    #[error("invalid tuning: {0}")]
    Tuning(String),
}

/// Result type for crate operations.
pub type Result<T> = std::result::Result<T, Error>;
