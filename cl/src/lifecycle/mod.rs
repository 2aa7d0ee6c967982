//! Single-node lifecycle boundary
//!
//! - [`LifecycleEngine`] is the host runtime's state machine
//! - [`StateMachineAdapter`] runs transitions and reports them via [`TransitionHooks`]
//! - [`LocalLifecycle`] is an in-memory engine for simulation and tests

mod adapter;
mod engine;
mod state;

pub use adapter::{StateAnnouncer, StateMachineAdapter, TransitionHooks};
pub use engine::{LifecycleEngine, LocalLifecycle};
pub use state::{LifecycleState, Transition};
