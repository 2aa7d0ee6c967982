//! Node discovery boundary
//!
//! The liveness reconciler asks a [`NodeDiscovery`] for the fully-qualified
//! names of every node currently alive. [`LiveNodes`] is an in-process
//! registry used by the simulator and tests.

use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use tracing::debug;

use crate::error::CascadeResult;

/// Source of the set of live node identities
#[async_trait]
pub trait NodeDiscovery: Send + Sync {
    /// Fully-qualified names of every node currently alive
    async fn live_node_identities(&self) -> CascadeResult<HashSet<String>>;
}

/// Qualify `name` with `namespace` the way discovery reports it
///
/// `("/", "camera")` -> `/camera`, `("/robot", "camera")` -> `/robot/camera`.
pub fn qualify(namespace: &str, name: &str) -> String {
    let namespace = namespace.trim_end_matches('/');
    if namespace.is_empty() {
        format!("/{}", name)
    } else if namespace.starts_with('/') {
        format!("{}/{}", namespace, name)
    } else {
        format!("/{}/{}", namespace, name)
    }
}

/// Shared in-process set of live nodes; cheap to clone
#[derive(Debug, Clone, Default)]
pub struct LiveNodes {
    nodes: Arc<RwLock<HashSet<String>>>,
}

impl LiveNodes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a fully-qualified node as alive
    pub fn register(&self, qualified_name: impl Into<String>) {
        let name = qualified_name.into();
        debug!(%name, "LiveNodes::register: called");
        self.nodes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name);
    }

    /// Mark a node as gone; returns whether it was alive
    pub fn deregister(&self, qualified_name: &str) -> bool {
        debug!(%qualified_name, "LiveNodes::deregister: called");
        self.nodes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(qualified_name)
    }

    pub fn contains(&self, qualified_name: &str) -> bool {
        self.nodes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(qualified_name)
    }
}

#[async_trait]
impl NodeDiscovery for LiveNodes {
    async fn live_node_identities(&self) -> CascadeResult<HashSet<String>> {
        Ok(self.nodes.read().unwrap_or_else(PoisonError::into_inner).clone())
    }
}
