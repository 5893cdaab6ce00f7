//! Error types for posture-core

use thiserror::Error;

/// Top-level error type for posture-core
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PostureError {
    #[error("Fatal error: {0}")]
    Fatal(#[from] FatalError),

    #[error("Not initialized: {0}")]
    NotInitialized(#[from] NotInitializedError),

    #[error("Probe error: {0}")]
    Probe(#[from] ProbeError),
}

/// A single platform probe failed
///
/// Probe failures degrade confidence in one signal; they never abort a
/// check cycle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("probe failed: {message}")]
pub struct ProbeError {
    pub message: String,
}

impl ProbeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors that leave the engine unusable until `reinitialize()`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FatalError {
    /// The signal provider capability is missing on this platform
    #[error("provider unavailable")]
    ProviderUnavailable,
}

/// `recheck()` was called before a successful `initialize()`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("security engine not initialized (state: {state})")]
pub struct NotInitializedError {
    pub state: String,
}

impl NotInitializedError {
    pub fn new(state: impl Into<String>) -> Self {
        Self {
            state: state.into(),
        }
    }
}
