//! BroadcastGateway - publishes cascade messages on behalf of one node

use tracing::debug;

use super::messages::{ActivationMessage, StateMessage};
use super::transport::CascadeBus;
use crate::lifecycle::LifecycleState;

/// Publisher bound to a node identity
///
/// Every message leaves with `activator` / `node` set to this identity.
/// Publishing is fire-and-forget.
#[derive(Clone)]
pub struct BroadcastGateway {
    bus: CascadeBus,
    node: String,
}

impl BroadcastGateway {
    pub(crate) fn new(bus: CascadeBus, node: String) -> Self {
        debug!(%node, "BroadcastGateway::new: called");
        Self { bus, node }
    }

    /// Identity this gateway publishes as
    pub fn node(&self) -> &str {
        &self.node
    }

    /// Announce that this node activates `target`
    pub fn announce_add(&self, target: &str) {
        debug!(node = %self.node, %target, "BroadcastGateway::announce_add: called");
        self.bus
            .publish_activation(ActivationMessage::add(target, self.node.clone()));
    }

    /// Announce that this node no longer activates `target`
    pub fn announce_remove(&self, target: &str) {
        debug!(node = %self.node, %target, "BroadcastGateway::announce_remove: called");
        self.bus
            .publish_activation(ActivationMessage::remove(target, self.node.clone()));
    }

    /// Announce this node's current state
    pub fn announce_state(&self, state: LifecycleState) {
        self.bus.publish_state(StateMessage::new(self.node.clone(), state));
    }
}
