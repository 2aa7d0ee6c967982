//! In-process simulation of a node graph
//!
//! Spawns one coordinator per configured node on a shared [`CascadeBus`],
//! each backed by a [`LocalLifecycle`] engine and registered in a shared
//! [`LiveNodes`] set. Used by the `cl` binary and by integration tests.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::bus::CascadeBus;
use crate::config::Config;
use crate::coordinator::{Coordinator, CoordinatorHandle};
use crate::discovery::{LiveNodes, qualify};
use crate::error::CascadeResult;
use crate::lifecycle::{LifecycleState, LocalLifecycle, Transition};

struct SimNode {
    handle: CoordinatorHandle,
    task: JoinHandle<()>,
    qualified: String,
}

/// A running graph of coordinators
pub struct Simulation {
    config: Config,
    bus: CascadeBus,
    live: LiveNodes,
    nodes: BTreeMap<String, SimNode>,
}

impl Simulation {
    /// Validate the graph and spawn a coordinator task per node
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(config: Config) -> CascadeResult<Self> {
        config.validate()?;
        let bus = CascadeBus::new(&config.bus);
        let live = LiveNodes::new();
        let mut nodes = BTreeMap::new();

        for spec in &config.graph.nodes {
            let qualified = qualify(&config.coordinator.namespace, &spec.name);
            live.register(qualified.clone());

            let coordinator = Coordinator::new(
                spec.name.clone(),
                config.coordinator.clone(),
                LocalLifecycle::new(),
                &bus,
                Arc::new(live.clone()),
            );
            let handle = coordinator.handle();
            let task = tokio::spawn(coordinator.run());
            debug!(node = %spec.name, %qualified, "Simulation::spawn: node started");
            nodes.insert(spec.name.clone(), SimNode { handle, task, qualified });
        }

        info!(nodes = nodes.len(), edges = config.graph.edge_count(), "Simulation spawned");
        Ok(Self {
            config,
            bus,
            live,
            nodes,
        })
    }

    pub fn bus(&self) -> &CascadeBus {
        &self.bus
    }

    pub fn handle(&self, node: &str) -> Option<&CoordinatorHandle> {
        self.nodes.get(node).map(|n| &n.handle)
    }

    /// Announce every configured activation edge
    pub async fn wire(&self) -> CascadeResult<()> {
        for spec in &self.config.graph.nodes {
            if let Some(node) = self.nodes.get(&spec.name) {
                for target in &spec.activates {
                    node.handle.add_activation(target).await?;
                }
            }
        }
        Ok(())
    }

    /// Configure and activate the root nodes, as an operator would
    pub async fn start_roots(&self) -> CascadeResult<()> {
        for root in self.config.graph.roots() {
            if let Some(node) = self.nodes.get(root) {
                info!(node = %root, "Starting root node");
                node.handle.request_transition(Transition::Configure).await?;
                node.handle.request_transition(Transition::Activate).await?;
            }
        }
        Ok(())
    }

    /// Kill a node without letting it send REMOVE; returns false if unknown
    pub fn crash(&mut self, node: &str) -> bool {
        match self.nodes.remove(node) {
            Some(sim_node) => {
                warn!(%node, "Crashing node");
                sim_node.task.abort();
                self.live.deregister(&sim_node.qualified);
                true
            }
            None => false,
        }
    }

    /// Current state of every running node
    pub async fn states(&self) -> BTreeMap<String, LifecycleState> {
        let mut states = BTreeMap::new();
        for (name, node) in &self.nodes {
            match node.handle.current_state().await {
                Ok(state) => {
                    states.insert(name.clone(), state);
                }
                Err(e) => warn!(node = %name, error = %e, "Could not query node state"),
            }
        }
        states
    }

    /// Stop every coordinator and wait for the tasks to finish
    pub async fn shutdown(self) {
        for (name, node) in self.nodes {
            if node.handle.shutdown().await.is_err() {
                debug!(node = %name, "Simulation::shutdown: coordinator already stopped");
            }
            if let Err(e) = node.task.await {
                warn!(node = %name, error = %e, "Coordinator task ended abnormally");
            }
        }
    }
}
