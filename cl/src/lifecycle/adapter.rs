//! StateMachineAdapter - facade over the host lifecycle engine
//!
//! The adapter executes transitions it is asked for and reports each
//! completed one through [`TransitionHooks`]. It never decides on its own
//! when a transition should happen.

use tracing::{debug, info, warn};

use super::engine::LifecycleEngine;
use super::state::{LifecycleState, Transition};
use crate::bus::BroadcastGateway;
use crate::error::TransitionError;

/// Callbacks invoked once per completed transition
///
/// Host runtimes that drive transitions themselves call these directly.
pub trait TransitionHooks: Send {
    fn on_configured(&self);
    fn on_cleaned_up(&self);
    fn on_activated(&self);
    fn on_deactivated(&self);
    fn on_shutdown(&self);
    fn on_error(&self);
}

/// Hooks that turn every completed transition into a state announcement
#[derive(Clone)]
pub struct StateAnnouncer {
    gateway: BroadcastGateway,
}

impl StateAnnouncer {
    pub fn new(gateway: BroadcastGateway) -> Self {
        Self { gateway }
    }
}

impl TransitionHooks for StateAnnouncer {
    fn on_configured(&self) {
        self.gateway.announce_state(LifecycleState::Inactive);
    }

    fn on_cleaned_up(&self) {
        self.gateway.announce_state(LifecycleState::Unconfigured);
    }

    fn on_activated(&self) {
        self.gateway.announce_state(LifecycleState::Active);
    }

    fn on_deactivated(&self) {
        self.gateway.announce_state(LifecycleState::Inactive);
    }

    fn on_shutdown(&self) {
        self.gateway.announce_state(LifecycleState::Finalized);
    }

    fn on_error(&self) {
        self.gateway.announce_state(LifecycleState::Finalized);
    }
}

/// Wraps a lifecycle engine and reports its transitions
pub struct StateMachineAdapter {
    engine: Box<dyn LifecycleEngine>,
    hooks: Box<dyn TransitionHooks>,
}

impl StateMachineAdapter {
    pub fn new(engine: impl LifecycleEngine, hooks: impl TransitionHooks + 'static) -> Self {
        Self {
            engine: Box::new(engine),
            hooks: Box::new(hooks),
        }
    }

    pub fn current_state(&self) -> LifecycleState {
        self.engine.current_state()
    }

    pub fn configure(&mut self) -> Result<LifecycleState, TransitionError> {
        self.request(Transition::Configure)
    }

    pub fn cleanup(&mut self) -> Result<LifecycleState, TransitionError> {
        self.request(Transition::Cleanup)
    }

    pub fn activate(&mut self) -> Result<LifecycleState, TransitionError> {
        self.request(Transition::Activate)
    }

    pub fn deactivate(&mut self) -> Result<LifecycleState, TransitionError> {
        self.request(Transition::Deactivate)
    }

    pub fn shutdown(&mut self) -> Result<LifecycleState, TransitionError> {
        self.request(Transition::Shutdown)
    }

    /// Run `transition` on the engine and fire the matching hook
    pub fn request(&mut self, transition: Transition) -> Result<LifecycleState, TransitionError> {
        let from = self.engine.current_state();
        debug!(%from, %transition, "StateMachineAdapter::request: called");

        match self.engine.request_transition(transition) {
            Ok(state) => {
                info!(%from, %transition, to = %state, "Transition completed");
                match transition {
                    Transition::Configure => self.hooks.on_configured(),
                    Transition::Cleanup => self.hooks.on_cleaned_up(),
                    Transition::Activate => self.hooks.on_activated(),
                    Transition::Deactivate => self.hooks.on_deactivated(),
                    Transition::Shutdown => self.hooks.on_shutdown(),
                }
                Ok(state)
            }
            Err(e @ TransitionError::Rejected { .. }) => {
                debug!(error = %e, "StateMachineAdapter::request: rejected");
                Err(e)
            }
            Err(e @ TransitionError::Failed { .. }) => {
                warn!(error = %e, "Transition failed, engine entered its error path");
                self.hooks.on_error();
                Err(e)
            }
        }
    }
}
