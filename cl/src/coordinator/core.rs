//! Main Coordinator task implementation

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::config::CoordinatorConfig;
use super::handle::CoordinatorHandle;
use super::messages::{CoordRequest, CoordinatorMetrics};
use super::reconciler::LivenessReconciler;
use crate::bus::{ActivationMessage, ActivationSubscription, BroadcastGateway, CascadeBus, Operation, StateMessage};
use crate::decision::{after_removal, decide};
use crate::discovery::NodeDiscovery;
use crate::error::TransitionError;
use crate::lifecycle::{LifecycleEngine, LifecycleState, StateAnnouncer, StateMachineAdapter, Transition};
use crate::registry::ActivationRegistry;

/// Upper bound on back-to-back transitions from one decision pass
const MAX_CASCADE_STEPS: usize = 4;

/// Cascade coordinator for one node
///
/// Owns the node's registry and state machine adapter. Inbound messages,
/// handle requests and reconciliation ticks are processed one at a time by
/// [`run`](Self::run), so every registry mutation and the decision it
/// triggers happen atomically. Hosts with their own dispatch loop can call
/// the `handle_*` methods and [`reconcile`](Self::reconcile) directly instead.
pub struct Coordinator {
    config: CoordinatorConfig,
    registry: ActivationRegistry,
    adapter: StateMachineAdapter,
    gateway: BroadcastGateway,
    reconciler: LivenessReconciler,
    activations: ActivationSubscription,
    states: broadcast::Receiver<StateMessage>,
    tx: mpsc::Sender<CoordRequest>,
    rx: mpsc::Receiver<CoordRequest>,
    metrics: CoordinatorMetrics,
}

impl Coordinator {
    /// Create a coordinator for `node` and subscribe it to both topics
    pub fn new(
        node: impl Into<String>,
        config: CoordinatorConfig,
        engine: impl LifecycleEngine,
        bus: &CascadeBus,
        discovery: Arc<dyn NodeDiscovery>,
    ) -> Self {
        let node = node.into();
        debug!(%node, ?config, "Coordinator::new: called");
        let (tx, rx) = mpsc::channel(config.command_buffer.max(1));
        let gateway = bus.gateway_for(node.clone());
        let adapter = StateMachineAdapter::new(engine, StateAnnouncer::new(gateway.clone()));
        let reconciler = LivenessReconciler::new(config.namespace.clone(), discovery);

        Self {
            registry: ActivationRegistry::new(node),
            adapter,
            gateway,
            reconciler,
            activations: bus.subscribe_activations(),
            states: bus.subscribe_states(),
            tx,
            rx,
            metrics: CoordinatorMetrics::default(),
            config,
        }
    }

    /// Identity of this node
    pub fn node(&self) -> &str {
        self.registry.node()
    }

    /// Create a handle for talking to this coordinator once it runs
    pub fn handle(&self) -> CoordinatorHandle {
        CoordinatorHandle::new(self.tx.clone(), self.node().to_string())
    }

    pub fn current_state(&self) -> LifecycleState {
        self.adapter.current_state()
    }

    pub fn registry(&self) -> &ActivationRegistry {
        &self.registry
    }

    pub fn metrics(&self) -> CoordinatorMetrics {
        CoordinatorMetrics {
            tracked_activators: self.registry.activator_count(),
            outgoing_activations: self.registry.outgoing_targets().len(),
            ..self.metrics.clone()
        }
    }

    /// Run the Coordinator task
    ///
    /// This consumes the Coordinator and runs until shutdown is requested.
    pub async fn run(mut self) {
        let mut interval = tokio::time::interval(self.config.reconcile_period());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(node = %self.node(), state = %self.current_state(), "Coordinator started");

        loop {
            tokio::select! {
                req = self.rx.recv() => match req {
                    Some(CoordRequest::Shutdown) | None => {
                        info!(node = %self.node(), "Coordinator shutting down");
                        break;
                    }
                    Some(req) => self.handle_request(req),
                },
                msg = self.activations.recv() => match msg {
                    Ok(msg) => self.handle_activation(&msg),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(node = %self.node(), skipped, "Activation subscriber lagged");
                        self.metrics.lagged_messages += skipped;
                    }
                    Err(RecvError::Closed) => {
                        warn!(node = %self.node(), "Activation topic closed");
                        break;
                    }
                },
                msg = self.states.recv() => match msg {
                    Ok(msg) => self.handle_state(&msg),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(node = %self.node(), skipped, "State subscriber lagged");
                        self.metrics.lagged_messages += skipped;
                    }
                    Err(RecvError::Closed) => {
                        warn!(node = %self.node(), "State topic closed");
                        break;
                    }
                },
                _ = interval.tick() => self.reconcile().await,
            }
        }

        info!(node = %self.node(), "Coordinator stopped");
    }

    /// Apply one request from a handle
    pub fn handle_request(&mut self, req: CoordRequest) {
        match req {
            CoordRequest::AddActivation { target } => self.add_activation(&target),

            CoordRequest::RemoveActivation { target } => self.remove_activation(&target),

            CoordRequest::ClearActivations { reply_tx } => {
                let targets = self.registry.outgoing_targets();
                debug!(node = %self.node(), count = targets.len(), "Clearing activations");
                for target in &targets {
                    self.remove_activation(target);
                }
                let _ = reply_tx.send(targets.len());
            }

            CoordRequest::Transition { transition, reply_tx } => {
                info!(node = %self.node(), %transition, "Operator transition requested");
                let _ = reply_tx.send(self.transition(transition));
            }

            CoordRequest::GetState { reply_tx } => {
                let _ = reply_tx.send(self.current_state());
            }

            CoordRequest::GetActivators { reply_tx } => {
                let _ = reply_tx.send(self.registry.snapshot());
            }

            CoordRequest::GetOutgoing { reply_tx } => {
                let _ = reply_tx.send(self.registry.outgoing_targets());
            }

            CoordRequest::GetMetrics { reply_tx } => {
                let _ = reply_tx.send(self.metrics());
            }

            CoordRequest::Shutdown => {
                debug!("Coordinator::handle_request: shutdown is handled by run");
            }
        }
    }

    /// Apply an inbound relationship message
    pub fn handle_activation(&mut self, msg: &ActivationMessage) {
        self.metrics.activation_messages += 1;
        if msg.target != self.node() {
            return;
        }

        match msg.operation {
            Operation::Add => {
                if self.registry.record_activation(&msg.activator) {
                    info!(node = %self.node(), activator = %msg.activator, "Activator added");
                }
            }
            Operation::Remove => {
                if !self.registry.is_tracked(&msg.activator) {
                    debug!(activator = %msg.activator, "Coordinator::handle_activation: REMOVE for untracked activator");
                    return;
                }
                info!(node = %self.node(), activator = %msg.activator, "Activator removed");
                self.drop_activator(&msg.activator);
            }
        }
    }

    /// Apply an inbound state announcement
    pub fn handle_state(&mut self, msg: &StateMessage) {
        self.metrics.state_messages += 1;
        if msg.node == self.node() {
            return;
        }

        if self.registry.update_activator_state(&msg.node, msg.state) {
            debug!(node = %self.node(), activator = %msg.node, state = %msg.state, "Activator state changed");
            self.cascade();
        }
    }

    /// One liveness reconciliation pass
    ///
    /// Drops activators that discovery no longer reports, re-announces this
    /// node's state, and re-runs the decision rules.
    pub async fn reconcile(&mut self) {
        self.metrics.reconcile_ticks += 1;

        match self.reconciler.find_stale(&self.registry).await {
            Ok(stale) => {
                for activator in stale {
                    warn!(node = %self.node(), %activator, "Activator no longer alive, dropping");
                    self.metrics.stale_activators_dropped += 1;
                    self.drop_activator(&activator);
                }
            }
            Err(e) => {
                warn!(node = %self.node(), error = %e, "Discovery failed, skipping liveness check");
                self.metrics.discovery_failures += 1;
            }
        }

        self.gateway.announce_state(self.current_state());
        self.cascade();
    }

    fn add_activation(&mut self, target: &str) {
        if target == self.node() {
            debug!(%target, "Coordinator::add_activation: ignoring self");
            return;
        }
        self.registry.record_outgoing(target);
        self.gateway.announce_add(target);
    }

    fn remove_activation(&mut self, target: &str) {
        if target == self.node() {
            debug!(%target, "Coordinator::remove_activation: ignoring self");
            return;
        }
        self.registry.remove_outgoing(target);
        self.gateway.announce_remove(target);
    }

    /// Remove a tracked activator and react to the loss
    fn drop_activator(&mut self, activator: &str) {
        let prior = self.registry.remove_activation(activator);
        if let Some(transition) = after_removal(prior, &self.registry.snapshot()) {
            info!(node = %self.node(), %activator, "Last active activator gone");
            let _ = self.transition(transition);
        }
        self.cascade();
    }

    /// Run the decision rules until they stop asking for transitions
    fn cascade(&mut self) {
        for _ in 0..MAX_CASCADE_STEPS {
            let Some(transition) = decide(self.current_state(), &self.registry.snapshot()) else {
                return;
            };
            if self.transition(transition).is_err() {
                return;
            }
        }
    }

    fn transition(&mut self, transition: Transition) -> Result<LifecycleState, TransitionError> {
        self.metrics.transitions_requested += 1;
        let result = self.adapter.request(transition);
        match &result {
            Ok(_) => {}
            Err(TransitionError::Rejected { .. }) => self.metrics.transitions_rejected += 1,
            Err(TransitionError::Failed { .. }) => self.metrics.transitions_failed += 1,
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::LiveNodes;
    use crate::lifecycle::LocalLifecycle;
    use tokio::sync::broadcast::error::TryRecvError;

    fn coordinator(bus: &CascadeBus, live: &LiveNodes, node: &str, state: LifecycleState) -> Coordinator {
        live.register(format!("/{}", node));
        Coordinator::new(
            node,
            CoordinatorConfig::default(),
            LocalLifecycle::with_state(state),
            bus,
            Arc::new(live.clone()),
        )
    }

    fn drain(rx: &mut broadcast::Receiver<StateMessage>) -> Vec<StateMessage> {
        let mut out = Vec::new();
        loop {
            match rx.try_recv() {
                Ok(msg) => out.push(msg),
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return out,
                Err(TryRecvError::Lagged(_)) => continue,
            }
        }
    }

    #[test]
    fn test_add_then_active_configures_and_activates() {
        let bus = CascadeBus::default();
        let live = LiveNodes::new();
        let mut a = coordinator(&bus, &live, "a", LifecycleState::Unconfigured);
        let mut rx = bus.subscribe_states();

        a.handle_activation(&ActivationMessage::add("a", "b"));
        assert_eq!(a.current_state(), LifecycleState::Unconfigured);

        a.handle_state(&StateMessage::new("b", LifecycleState::Active));
        assert_eq!(a.current_state(), LifecycleState::Active);

        let announced: Vec<LifecycleState> = drain(&mut rx).into_iter().map(|m| m.state).collect();
        assert_eq!(announced, vec![LifecycleState::Inactive, LifecycleState::Active]);
    }

    #[test]
    fn test_remove_last_active_deactivates_without_inactive() {
        let bus = CascadeBus::default();
        let live = LiveNodes::new();
        let mut a = coordinator(&bus, &live, "a", LifecycleState::Inactive);

        a.handle_activation(&ActivationMessage::add("a", "b"));
        a.handle_state(&StateMessage::new("b", LifecycleState::Active));
        assert_eq!(a.current_state(), LifecycleState::Active);

        a.handle_activation(&ActivationMessage::remove("a", "b"));
        assert_eq!(a.current_state(), LifecycleState::Inactive);
        assert!(a.registry().snapshot().is_empty());
    }

    #[test]
    fn test_inactive_then_remove_deactivates() {
        let bus = CascadeBus::default();
        let live = LiveNodes::new();
        let mut a = coordinator(&bus, &live, "a", LifecycleState::Inactive);

        a.handle_activation(&ActivationMessage::add("a", "b"));
        a.handle_activation(&ActivationMessage::add("a", "c"));
        a.handle_state(&StateMessage::new("b", LifecycleState::Active));
        a.handle_state(&StateMessage::new("c", LifecycleState::Active));
        assert_eq!(a.current_state(), LifecycleState::Active);

        a.handle_state(&StateMessage::new("b", LifecycleState::Inactive));
        assert_eq!(a.current_state(), LifecycleState::Active);

        a.handle_activation(&ActivationMessage::remove("a", "c"));
        assert_eq!(a.current_state(), LifecycleState::Inactive);
    }

    #[test]
    fn test_remove_untracked_is_noop() {
        let bus = CascadeBus::default();
        let live = LiveNodes::new();
        let mut a = coordinator(&bus, &live, "a", LifecycleState::Active);

        a.handle_activation(&ActivationMessage::remove("a", "ghost"));
        assert_eq!(a.current_state(), LifecycleState::Active);
        assert_eq!(a.metrics().transitions_requested, 0);
    }

    #[test]
    fn test_messages_for_other_targets_ignored() {
        let bus = CascadeBus::default();
        let live = LiveNodes::new();
        let mut a = coordinator(&bus, &live, "a", LifecycleState::Unconfigured);

        a.handle_activation(&ActivationMessage::add("z", "b"));
        assert!(a.registry().snapshot().is_empty());
        assert_eq!(a.metrics().activation_messages, 1);
    }

    #[test]
    fn test_state_from_untracked_peer_ignored() {
        let bus = CascadeBus::default();
        let live = LiveNodes::new();
        let mut a = coordinator(&bus, &live, "a", LifecycleState::Unconfigured);

        a.handle_state(&StateMessage::new("b", LifecycleState::Active));
        assert_eq!(a.current_state(), LifecycleState::Unconfigured);
        assert!(!a.registry().is_tracked("b"));
    }

    #[test]
    fn test_own_state_announcement_ignored() {
        let bus = CascadeBus::default();
        let live = LiveNodes::new();
        let mut a = coordinator(&bus, &live, "a", LifecycleState::Unconfigured);

        a.handle_activation(&ActivationMessage::add("a", "a"));
        a.handle_state(&StateMessage::new("a", LifecycleState::Active));
        assert!(a.registry().snapshot().is_empty());
        assert_eq!(a.current_state(), LifecycleState::Unconfigured);
    }

    #[tokio::test]
    async fn test_reconcile_drops_dead_activator_and_heartbeats() {
        let bus = CascadeBus::default();
        let live = LiveNodes::new();
        let mut a = coordinator(&bus, &live, "a", LifecycleState::Inactive);
        live.register("/b");
        live.register("/c");

        a.handle_activation(&ActivationMessage::add("a", "b"));
        a.handle_activation(&ActivationMessage::add("a", "c"));
        a.handle_state(&StateMessage::new("b", LifecycleState::Active));
        assert_eq!(a.current_state(), LifecycleState::Active);

        live.deregister("/b");
        let mut rx = bus.subscribe_states();
        a.reconcile().await;

        assert!(!a.registry().is_tracked("b"));
        assert!(a.registry().is_tracked("c"));
        assert_eq!(a.current_state(), LifecycleState::Inactive);

        let announced = drain(&mut rx);
        assert_eq!(announced.last(), Some(&StateMessage::new("a", LifecycleState::Inactive)));
        assert_eq!(a.metrics().stale_activators_dropped, 1);
        assert_eq!(a.metrics().reconcile_ticks, 1);
    }

    #[tokio::test]
    async fn test_reconcile_without_activators_stays_unconfigured() {
        let bus = CascadeBus::default();
        let live = LiveNodes::new();
        let mut a = coordinator(&bus, &live, "a", LifecycleState::Unconfigured);
        let mut rx = bus.subscribe_states();

        a.reconcile().await;
        a.reconcile().await;

        assert_eq!(a.current_state(), LifecycleState::Unconfigured);
        let announced = drain(&mut rx);
        assert_eq!(announced.len(), 2);
        assert!(announced.iter().all(|m| m.state == LifecycleState::Unconfigured));
    }

    #[test]
    fn test_outgoing_add_remove_clear() {
        let bus = CascadeBus::default();
        let live = LiveNodes::new();
        let mut a = coordinator(&bus, &live, "a", LifecycleState::Active);

        a.handle_request(CoordRequest::AddActivation { target: "x".to_string() });
        a.handle_request(CoordRequest::AddActivation { target: "y".to_string() });
        a.handle_request(CoordRequest::AddActivation { target: "a".to_string() });
        assert_eq!(a.registry().outgoing_targets(), vec!["x", "y"]);

        a.handle_request(CoordRequest::RemoveActivation { target: "x".to_string() });
        assert_eq!(a.registry().outgoing_targets(), vec!["y"]);

        let (reply_tx, mut reply_rx) = tokio::sync::oneshot::channel();
        a.handle_request(CoordRequest::ClearActivations { reply_tx });
        assert_eq!(reply_rx.try_recv().unwrap(), 1);
        assert!(a.registry().outgoing_targets().is_empty());

        let history = bus.activation_history();
        assert_eq!(
            history,
            vec![
                ActivationMessage::add("x", "a"),
                ActivationMessage::add("y", "a"),
                ActivationMessage::remove("x", "a"),
                ActivationMessage::remove("y", "a"),
            ]
        );
    }

    #[test]
    fn test_failed_transition_counts() {
        let bus = CascadeBus::default();
        let live = LiveNodes::new();
        live.register("/a");
        let mut a = Coordinator::new(
            "a",
            CoordinatorConfig::default(),
            LocalLifecycle::new().fail_on(Transition::Configure),
            &bus,
            Arc::new(live),
        );

        a.handle_activation(&ActivationMessage::add("a", "b"));
        a.handle_state(&StateMessage::new("b", LifecycleState::Inactive));

        assert_eq!(a.current_state(), LifecycleState::Finalized);
        assert_eq!(a.metrics().transitions_failed, 1);
    }

    #[tokio::test]
    async fn test_reconcile_reactivates_without_new_state_message() {
        let bus = CascadeBus::default();
        let live = LiveNodes::new();
        let mut a = coordinator(&bus, &live, "a", LifecycleState::Inactive);
        live.register("/b");

        a.handle_activation(&ActivationMessage::add("a", "b"));
        a.handle_state(&StateMessage::new("b", LifecycleState::Active));
        assert_eq!(a.current_state(), LifecycleState::Active);

        let (reply_tx, mut reply_rx) = tokio::sync::oneshot::channel();
        a.handle_request(CoordRequest::Transition {
            transition: Transition::Deactivate,
            reply_tx,
        });
        assert_eq!(reply_rx.try_recv().unwrap(), Ok(LifecycleState::Inactive));
        assert_eq!(a.current_state(), LifecycleState::Inactive);

        a.reconcile().await;

        assert_eq!(a.current_state(), LifecycleState::Active);
        assert!(a.registry().is_tracked("b"));
    }

    struct FailingDiscovery;

    #[async_trait::async_trait]
    impl NodeDiscovery for FailingDiscovery {
        async fn live_node_identities(&self) -> crate::error::CascadeResult<std::collections::HashSet<String>> {
            Err(crate::error::CascadeError::Discovery("lookup timed out".to_string()))
        }
    }

    #[tokio::test]
    async fn test_reconcile_keeps_activators_when_discovery_fails() {
        let bus = CascadeBus::default();
        let mut a = Coordinator::new(
            "a",
            CoordinatorConfig::default(),
            LocalLifecycle::with_state(LifecycleState::Inactive),
            &bus,
            Arc::new(FailingDiscovery),
        );

        a.handle_activation(&ActivationMessage::add("a", "b"));
        a.handle_state(&StateMessage::new("b", LifecycleState::Inactive));
        assert_eq!(a.current_state(), LifecycleState::Inactive);

        let mut rx = bus.subscribe_states();
        a.reconcile().await;

        assert!(a.registry().is_tracked("b"));
        assert_eq!(drain(&mut rx), vec![StateMessage::new("a", LifecycleState::Inactive)]);

        let metrics = a.metrics();
        assert_eq!(metrics.discovery_failures, 1);
        assert_eq!(metrics.stale_activators_dropped, 0);
        assert_eq!(metrics.reconcile_ticks, 1);
    }

    #[tokio::test]
    async fn test_reconcile_runs_rules_when_discovery_fails() {
        let bus = CascadeBus::default();
        let mut a = Coordinator::new(
            "a",
            CoordinatorConfig::default(),
            LocalLifecycle::with_state(LifecycleState::Inactive),
            &bus,
            Arc::new(FailingDiscovery),
        );

        a.handle_activation(&ActivationMessage::add("a", "b"));
        a.handle_state(&StateMessage::new("b", LifecycleState::Active));
        let (reply_tx, _reply_rx) = tokio::sync::oneshot::channel();
        a.handle_request(CoordRequest::Transition {
            transition: Transition::Deactivate,
            reply_tx,
        });
        assert_eq!(a.current_state(), LifecycleState::Inactive);

        a.reconcile().await;

        assert_eq!(a.current_state(), LifecycleState::Active);
        assert_eq!(a.metrics().discovery_failures, 1);
    }
}
