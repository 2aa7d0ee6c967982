//! Cascade Lifecycle - activation-driven lifecycle synchronization
//!
//! Nodes form a many-to-many activation graph. A node's own state follows the
//! aggregate state of the nodes that activate it: it configures once any
//! activator reports, activates while any activator is active, and
//! deactivates when its activators go inactive or disappear.
//!
//! # Architecture
//!
//! ```text
//!   activations topic (retained)        states topic (not retained)
//!            │                                   │
//!            ▼                                   ▼
//!   ┌──────────────────────── Coordinator task ────────────────────────┐
//!   │  ActivationRegistry ──► decide() ──► StateMachineAdapter ──┐     │
//!   │          ▲                                                 │     │
//!   │   LivenessReconciler (every 500ms)          state announcement   │
//!   └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`registry`] - incoming activators and outgoing targets
//! - [`decision`] - pure cascade rules
//! - [`bus`] - topics, wire messages, per-node gateway
//! - [`lifecycle`] - engine boundary and state machine adapter
//! - [`discovery`] - live node queries for reconciliation
//! - [`coordinator`] - the per-node task and its handle
//! - [`sim`] - in-process graph simulation

pub mod bus;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod decision;
pub mod discovery;
pub mod error;
pub mod lifecycle;
pub mod registry;
pub mod sim;

// Re-export commonly used types
pub use bus::{ActivationMessage, BusConfig, CascadeBus, Operation, StateMessage};
pub use config::{Config, GraphConfig, NodeSpec};
pub use coordinator::{Coordinator, CoordinatorConfig, CoordinatorHandle, CoordinatorMetrics};
pub use discovery::{LiveNodes, NodeDiscovery, qualify};
pub use error::{CascadeError, CascadeResult, TransitionError};
pub use lifecycle::{LifecycleEngine, LifecycleState, LocalLifecycle, StateMachineAdapter, Transition, TransitionHooks};
pub use registry::{ActivationRegistry, ActivatorSnapshot};
pub use sim::Simulation;
