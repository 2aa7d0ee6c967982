//! Broadcast transport for cascade messages
//!
//! Two topics carry the protocol:
//!
//! ```text
//! activations  {operation, target, activator}  reliable, retained for late joiners
//! states       {node, state}                   reliable, NOT retained
//! ```
//!
//! Relationship history must survive for nodes that start late, while state
//! announcements are refreshed by every coordinator's periodic heartbeat.

mod config;
mod gateway;
mod messages;
mod transport;

pub use config::BusConfig;
pub use gateway::BroadcastGateway;
pub use messages::{ACTIVATIONS_TOPIC, ActivationMessage, Operation, STATES_TOPIC, StateMessage};
pub use transport::{ActivationSubscription, CascadeBus};
