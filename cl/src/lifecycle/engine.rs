//! Boundary to the single-node lifecycle engine

use std::collections::HashSet;

use tracing::debug;

use super::state::{LifecycleState, Transition};
use crate::error::TransitionError;

/// Single-node lifecycle engine provided by the host runtime
///
/// The coordinator only decides *when* to transition. How a transition runs
/// (user callbacks, resource setup) belongs to the engine.
pub trait LifecycleEngine: Send + 'static {
    /// Current primary state of this node
    fn current_state(&self) -> LifecycleState;

    /// Execute a transition and return the state the node ended up in
    fn request_transition(&mut self, transition: Transition) -> Result<LifecycleState, TransitionError>;
}

/// In-memory engine following the managed-node transition table
///
/// Used by the simulator and by tests in place of a host runtime. Failures
/// can be injected per transition; a failed transition finalizes the node.
#[derive(Debug, Clone)]
pub struct LocalLifecycle {
    state: LifecycleState,
    failing: HashSet<Transition>,
}

impl Default for LocalLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalLifecycle {
    pub fn new() -> Self {
        Self {
            state: LifecycleState::Unconfigured,
            failing: HashSet::new(),
        }
    }

    /// Start from a given state (for tests)
    pub fn with_state(state: LifecycleState) -> Self {
        Self {
            state,
            failing: HashSet::new(),
        }
    }

    /// Make every future `transition` fail
    pub fn fail_on(mut self, transition: Transition) -> Self {
        self.failing.insert(transition);
        self
    }

    fn is_valid(&self, transition: Transition) -> bool {
        matches!(
            (self.state, transition),
            (LifecycleState::Unconfigured, Transition::Configure)
                | (LifecycleState::Inactive, Transition::Cleanup)
                | (LifecycleState::Inactive, Transition::Activate)
                | (LifecycleState::Active, Transition::Deactivate)
                | (
                    LifecycleState::Unconfigured | LifecycleState::Inactive | LifecycleState::Active,
                    Transition::Shutdown
                )
        )
    }
}

impl LifecycleEngine for LocalLifecycle {
    fn current_state(&self) -> LifecycleState {
        self.state
    }

    fn request_transition(&mut self, transition: Transition) -> Result<LifecycleState, TransitionError> {
        debug!(from = %self.state, %transition, "LocalLifecycle::request_transition: called");
        if !self.is_valid(transition) {
            return Err(TransitionError::Rejected {
                from: self.state,
                transition,
            });
        }

        if self.failing.contains(&transition) {
            self.state = LifecycleState::Finalized;
            return Err(TransitionError::Failed {
                transition,
                reason: "injected failure".to_string(),
            });
        }

        self.state = transition.goal_state();
        Ok(self.state)
    }
}
