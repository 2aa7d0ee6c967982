//! Error types for the cascade coordinator

use thiserror::Error;

use crate::lifecycle::{LifecycleState, Transition};

/// Errors reported by a lifecycle engine when asked to transition
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransitionError {
    /// The transition is not valid from the engine's current state; nothing changed
    #[error("transition {transition} is not valid from state {from}")]
    Rejected { from: LifecycleState, transition: Transition },

    /// The transition started but its callback failed; the engine took its error path
    #[error("transition {transition} failed: {reason}")]
    Failed { transition: Transition, reason: String },
}

/// Errors from coordinator operations
#[derive(Debug, Error)]
pub enum CascadeError {
    #[error("Coordinator channel closed")]
    ChannelClosed,

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("Discovery error: {0}")]
    Discovery(String),

    #[error("Config error: {0}")]
    Config(String),
}

/// Result alias used by coordinator handles
pub type CascadeResult<T> = Result<T, CascadeError>;
