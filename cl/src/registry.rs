//! ActivationRegistry - per-node activation bookkeeping
//!
//! Tracks the activators of this node with their last reported state, and the
//! targets this node activates. Every operation is idempotent: duplicate or
//! out-of-order messages never fail.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::lifecycle::LifecycleState;

/// Read-only view of activator states
pub type ActivatorSnapshot = HashMap<String, LifecycleState>;

/// Activation edges seen from one node
#[derive(Debug, Clone)]
pub struct ActivationRegistry {
    node: String,
    /// activator -> last known state (one record per incoming edge)
    activators: HashMap<String, LifecycleState>,
    /// targets this node has sent ADD for and not yet REMOVE
    outgoing: BTreeSet<String>,
}

impl ActivationRegistry {
    pub fn new(node: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            activators: HashMap::new(),
            outgoing: BTreeSet::new(),
        }
    }

    /// Identity of the owning node
    pub fn node(&self) -> &str {
        &self.node
    }

    /// Track `activator`; returns true when it was not tracked before
    pub fn record_activation(&mut self, activator: &str) -> bool {
        if activator == self.node {
            debug!(%activator, "ActivationRegistry::record_activation: ignoring self");
            return false;
        }
        if self.activators.contains_key(activator) {
            debug!(%activator, "ActivationRegistry::record_activation: already tracked");
            return false;
        }
        debug!(node = %self.node, %activator, "ActivationRegistry::record_activation: tracking");
        self.activators.insert(activator.to_string(), LifecycleState::Unknown);
        true
    }

    /// Drop `activator` and its record, returning the last state it reported
    ///
    /// `None` means the activator was not tracked; nothing changes.
    pub fn remove_activation(&mut self, activator: &str) -> Option<LifecycleState> {
        let prior = self.activators.remove(activator);
        debug!(node = %self.node, %activator, ?prior, "ActivationRegistry::remove_activation: called");
        prior
    }

    /// Store a new state for a tracked activator; returns true when it changed
    pub fn update_activator_state(&mut self, activator: &str, state: LifecycleState) -> bool {
        match self.activators.get_mut(activator) {
            Some(current) if *current != state => {
                debug!(%activator, from = %current, to = %state, "ActivationRegistry::update_activator_state: changed");
                *current = state;
                true
            }
            _ => false,
        }
    }

    pub fn is_tracked(&self, activator: &str) -> bool {
        self.activators.contains_key(activator)
    }

    pub fn snapshot(&self) -> ActivatorSnapshot {
        self.activators.clone()
    }

    /// Owned list of tracked activators, safe to hold while removing entries
    pub fn activator_identities(&self) -> Vec<String> {
        let mut names: Vec<String> = self.activators.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn activator_count(&self) -> usize {
        self.activators.len()
    }

    /// Remember that this node activates `target`; self-targets are ignored
    pub fn record_outgoing(&mut self, target: &str) -> bool {
        if target == self.node {
            return false;
        }
        self.outgoing.insert(target.to_string())
    }

    pub fn remove_outgoing(&mut self, target: &str) -> bool {
        self.outgoing.remove(target)
    }

    pub fn outgoing_targets(&self) -> Vec<String> {
        self.outgoing.iter().cloned().collect()
    }
}
