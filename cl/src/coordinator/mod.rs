//! Cascade coordinator
//!
//! One Coordinator task runs per node and serializes everything that touches
//! the node's activation registry:
//! - **Relationship messages:** ADD/REMOVE addressed to this node
//! - **State announcements:** reported states of tracked activators
//! - **Reconciliation ticks:** liveness check plus state heartbeat
//! - **Handle requests:** outgoing activations and operator transitions

mod config;
mod core;
mod handle;
mod messages;
mod reconciler;

pub use config::CoordinatorConfig;
pub use self::core::Coordinator;
pub use handle::CoordinatorHandle;
pub use messages::{CoordRequest, CoordinatorMetrics};
pub use reconciler::{LivenessReconciler, stale_activators};
