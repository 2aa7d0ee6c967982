//! CoordinatorHandle - client interface for the embedding node

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use super::messages::{CoordRequest, CoordinatorMetrics};
use crate::error::{CascadeError, CascadeResult};
use crate::lifecycle::{LifecycleState, Transition};
use crate::registry::ActivatorSnapshot;

/// Handle for a node to drive its coordinator
///
/// This handle is cloneable. Activation changes are fire-and-forget; queries
/// wait for the coordinator's reply.
#[derive(Clone)]
pub struct CoordinatorHandle {
    /// Sender to the Coordinator task
    tx: mpsc::Sender<CoordRequest>,

    /// Identity of the node this handle belongs to
    node: String,
}

impl CoordinatorHandle {
    pub(crate) fn new(tx: mpsc::Sender<CoordRequest>, node: String) -> Self {
        debug!(%node, "CoordinatorHandle::new: called");
        Self { tx, node }
    }

    /// Get this handle's node identity
    pub fn node(&self) -> &str {
        &self.node
    }

    /// Start activating `target`
    pub async fn add_activation(&self, target: &str) -> CascadeResult<()> {
        debug!(node = %self.node, %target, "CoordinatorHandle::add_activation: called");
        self.send(CoordRequest::AddActivation {
            target: target.to_string(),
        })
        .await
    }

    /// Stop activating `target`
    pub async fn remove_activation(&self, target: &str) -> CascadeResult<()> {
        debug!(node = %self.node, %target, "CoordinatorHandle::remove_activation: called");
        self.send(CoordRequest::RemoveActivation {
            target: target.to_string(),
        })
        .await
    }

    /// Stop activating every outstanding target; returns how many were removed
    pub async fn clear_activations(&self) -> CascadeResult<usize> {
        debug!(node = %self.node, "CoordinatorHandle::clear_activations: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(CoordRequest::ClearActivations { reply_tx }).await?;
        reply_rx.await.map_err(|_| CascadeError::ChannelClosed)
    }

    /// Ask this node's lifecycle engine for a transition (operator path)
    pub async fn request_transition(&self, transition: Transition) -> CascadeResult<LifecycleState> {
        debug!(node = %self.node, %transition, "CoordinatorHandle::request_transition: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(CoordRequest::Transition { transition, reply_tx }).await?;
        Ok(reply_rx.await.map_err(|_| CascadeError::ChannelClosed)??)
    }

    /// Current lifecycle state of this node
    pub async fn current_state(&self) -> CascadeResult<LifecycleState> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(CoordRequest::GetState { reply_tx }).await?;
        reply_rx.await.map_err(|_| CascadeError::ChannelClosed)
    }

    /// Tracked activators with their last known states
    pub async fn activators(&self) -> CascadeResult<ActivatorSnapshot> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(CoordRequest::GetActivators { reply_tx }).await?;
        reply_rx.await.map_err(|_| CascadeError::ChannelClosed)
    }

    /// Targets this node currently activates
    pub async fn outgoing(&self) -> CascadeResult<Vec<String>> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(CoordRequest::GetOutgoing { reply_tx }).await?;
        reply_rx.await.map_err(|_| CascadeError::ChannelClosed)
    }

    /// Get current coordinator metrics
    pub async fn metrics(&self) -> CascadeResult<CoordinatorMetrics> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(CoordRequest::GetMetrics { reply_tx }).await?;
        reply_rx.await.map_err(|_| CascadeError::ChannelClosed)
    }

    /// Request shutdown of the Coordinator
    pub async fn shutdown(&self) -> CascadeResult<()> {
        debug!(node = %self.node, "CoordinatorHandle::shutdown: called");
        self.send(CoordRequest::Shutdown).await
    }

    async fn send(&self, req: CoordRequest) -> CascadeResult<()> {
        self.tx.send(req).await.map_err(|_| CascadeError::ChannelClosed)
    }
}
