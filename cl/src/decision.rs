//! Cascade decision rules
//!
//! Pure functions from the local state and the activators' reported states to
//! the transition the node should request next.

use crate::lifecycle::{LifecycleState, Transition};
use crate::registry::ActivatorSnapshot;

/// Aggregate view of activator states
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivatorSummary {
    pub any_active: bool,
    pub any_inactive: bool,
}

impl ActivatorSummary {
    pub fn of(activators: &ActivatorSnapshot) -> Self {
        activators.values().fold(Self::default(), |acc, state| Self {
            any_active: acc.any_active || *state == LifecycleState::Active,
            any_inactive: acc.any_inactive || *state == LifecycleState::Inactive,
        })
    }
}

/// Transition to request given the current state and activator snapshot
pub fn decide(current: LifecycleState, activators: &ActivatorSnapshot) -> Option<Transition> {
    let summary = ActivatorSummary::of(activators);

    match current {
        state if state.is_unconfigured() => {
            (summary.any_active || summary.any_inactive).then_some(Transition::Configure)
        }
        LifecycleState::Inactive if summary.any_active => Some(Transition::Activate),
        LifecycleState::Active if !summary.any_active && summary.any_inactive => Some(Transition::Deactivate),
        _ => None,
    }
}

/// Rule applied after an activator was removed
///
/// Losing the last `Active` activator deactivates the node even when no
/// remaining activator is `Inactive`; `decide` alone would leave it active.
pub fn after_removal(prior: Option<LifecycleState>, remaining: &ActivatorSnapshot) -> Option<Transition> {
    match prior {
        Some(LifecycleState::Active) if !ActivatorSummary::of(remaining).any_active => Some(Transition::Deactivate),
        _ => None,
    }
}
