//! Liveness reconciliation
//!
//! Broadcast messages can be lost and peers can crash without sending
//! REMOVE. Each tick the coordinator compares its tracked activators with
//! the live node set and drops the ones that are gone.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::discovery::{NodeDiscovery, qualify};
use crate::error::CascadeResult;
use crate::registry::ActivationRegistry;

/// Finds activators whose process is no longer alive
#[derive(Clone)]
pub struct LivenessReconciler {
    namespace: String,
    discovery: Arc<dyn NodeDiscovery>,
}

impl LivenessReconciler {
    pub fn new(namespace: impl Into<String>, discovery: Arc<dyn NodeDiscovery>) -> Self {
        Self {
            namespace: namespace.into(),
            discovery,
        }
    }

    /// Query discovery and return the tracked activators that are not alive
    pub async fn find_stale(&self, registry: &ActivationRegistry) -> CascadeResult<Vec<String>> {
        let live = self.discovery.live_node_identities().await?;
        debug!(live = live.len(), tracked = registry.activator_count(), "LivenessReconciler::find_stale: called");
        Ok(stale_activators(registry, &live, &self.namespace))
    }
}

/// Tracked activators absent from `live`, each visited exactly once
///
/// Returns an owned list so callers can remove entries from the registry
/// while walking it.
pub fn stale_activators(registry: &ActivationRegistry, live: &HashSet<String>, namespace: &str) -> Vec<String> {
    registry
        .activator_identities()
        .into_iter()
        .filter(|activator| !live.contains(&qualify(namespace, activator)))
        .collect()
}
