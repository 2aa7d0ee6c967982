//! CascadeBus - in-process transport for the two cascade topics
//!
//! Activation messages are retained: a bounded history is replayed to every
//! new subscriber before live traffic. State announcements use a plain
//! broadcast channel, so subscribers only see what is sent after they join.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::debug;

use super::config::BusConfig;
use super::gateway::BroadcastGateway;
use super::messages::{ACTIVATIONS_TOPIC, ActivationMessage, STATES_TOPIC, StateMessage};

struct ActivationLog {
    history: Mutex<VecDeque<ActivationMessage>>,
    depth: usize,
    tx: broadcast::Sender<ActivationMessage>,
}

impl ActivationLog {
    fn lock(&self) -> MutexGuard<'_, VecDeque<ActivationMessage>> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Shared transport handle; cheap to clone
#[derive(Clone)]
pub struct CascadeBus {
    activations: Arc<ActivationLog>,
    states_tx: broadcast::Sender<StateMessage>,
}

impl CascadeBus {
    /// Create a new bus with the given capacities
    pub fn new(config: &BusConfig) -> Self {
        debug!(?config, "CascadeBus::new: creating bus");
        let depth = config.activation_history_depth.max(1);
        let (activations_tx, _) = broadcast::channel(depth);
        let (states_tx, _) = broadcast::channel(config.state_channel_capacity.max(1));
        Self {
            activations: Arc::new(ActivationLog {
                history: Mutex::new(VecDeque::with_capacity(depth)),
                depth,
                tx: activations_tx,
            }),
            states_tx,
        }
    }

    /// Publish a relationship change and retain it for late subscribers
    pub fn publish_activation(&self, msg: ActivationMessage) {
        debug!(topic = ACTIVATIONS_TOPIC, ?msg, "CascadeBus::publish_activation: called");
        let mut history = self.activations.lock();
        if history.len() == self.activations.depth {
            history.pop_front();
        }
        history.push_back(msg.clone());
        // No subscribers is fine, the history keeps the message
        let _ = self.activations.tx.send(msg);
    }

    /// Publish a state announcement; dropped if nobody listens
    pub fn publish_state(&self, msg: StateMessage) {
        debug!(topic = STATES_TOPIC, node = %msg.node, state = %msg.state, "CascadeBus::publish_state: called");
        let _ = self.states_tx.send(msg);
    }

    /// Subscribe to relationship changes, starting with the retained history
    pub fn subscribe_activations(&self) -> ActivationSubscription {
        // Holding the history lock while subscribing keeps replay and live traffic gap-free
        let history = self.activations.lock();
        let rx = self.activations.tx.subscribe();
        debug!(topic = ACTIVATIONS_TOPIC, backlog = history.len(), "CascadeBus::subscribe_activations: new subscriber");
        ActivationSubscription {
            backlog: history.clone(),
            rx,
        }
    }

    /// Subscribe to state announcements sent from now on
    pub fn subscribe_states(&self) -> broadcast::Receiver<StateMessage> {
        debug!(topic = STATES_TOPIC, "CascadeBus::subscribe_states: new subscriber");
        self.states_tx.subscribe()
    }

    /// Create a publisher bound to one node identity
    pub fn gateway_for(&self, node: impl Into<String>) -> BroadcastGateway {
        BroadcastGateway::new(self.clone(), node.into())
    }

    /// Retained relationship history, oldest first
    pub fn activation_history(&self) -> Vec<ActivationMessage> {
        self.activations.lock().iter().cloned().collect()
    }
}

impl Default for CascadeBus {
    fn default() -> Self {
        Self::new(&BusConfig::default())
    }
}

/// Receiver for the retained activation topic
pub struct ActivationSubscription {
    backlog: VecDeque<ActivationMessage>,
    rx: broadcast::Receiver<ActivationMessage>,
}

impl ActivationSubscription {
    /// Next message: retained history first, then live traffic
    ///
    /// Cancel safe: a backlog entry is only taken when the call completes.
    pub async fn recv(&mut self) -> Result<ActivationMessage, RecvError> {
        if let Some(msg) = self.backlog.pop_front() {
            return Ok(msg);
        }
        self.rx.recv().await
    }

    /// Non-blocking variant of [`recv`](Self::recv)
    pub fn try_recv(&mut self) -> Result<ActivationMessage, TryRecvError> {
        if let Some(msg) = self.backlog.pop_front() {
            return Ok(msg);
        }
        self.rx.try_recv()
    }
}
