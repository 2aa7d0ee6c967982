//! Message types for the Coordinator

use serde::Serialize;
use tokio::sync::oneshot;

use crate::error::TransitionError;
use crate::lifecycle::{LifecycleState, Transition};
use crate::registry::ActivatorSnapshot;

/// Requests sent from handles to the Coordinator task
#[derive(Debug)]
pub enum CoordRequest {
    /// Start activating `target`
    AddActivation { target: String },

    /// Stop activating `target`
    RemoveActivation { target: String },

    /// Stop activating every outstanding target
    ClearActivations { reply_tx: oneshot::Sender<usize> },

    /// Operator-requested transition of this node
    Transition {
        transition: Transition,
        reply_tx: oneshot::Sender<Result<LifecycleState, TransitionError>>,
    },

    /// Current lifecycle state of this node
    GetState { reply_tx: oneshot::Sender<LifecycleState> },

    /// Tracked activators and their last known states
    GetActivators {
        reply_tx: oneshot::Sender<ActivatorSnapshot>,
    },

    /// Targets this node currently activates
    GetOutgoing { reply_tx: oneshot::Sender<Vec<String>> },

    /// Get current metrics
    GetMetrics {
        reply_tx: oneshot::Sender<CoordinatorMetrics>,
    },

    /// Shutdown the coordinator
    Shutdown,
}

/// Coordinator metrics for observability
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CoordinatorMetrics {
    pub tracked_activators: usize,
    pub outgoing_activations: usize,
    pub activation_messages: u64,
    pub state_messages: u64,
    pub transitions_requested: u64,
    pub transitions_rejected: u64,
    pub transitions_failed: u64,
    pub reconcile_ticks: u64,
    pub stale_activators_dropped: u64,
    pub discovery_failures: u64,
    pub lagged_messages: u64,
}
