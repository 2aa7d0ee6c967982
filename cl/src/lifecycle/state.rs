//! Lifecycle states and transitions

use std::fmt;

use serde::{Deserialize, Serialize};

/// Primary state of a managed node
///
/// `Unknown` only describes a remote peer that has not reported yet; a node's
/// own state is never `Unknown` once it is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    #[default]
    Unknown,
    Unconfigured,
    Inactive,
    Active,
    Finalized,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Unknown => "unknown",
            LifecycleState::Unconfigured => "unconfigured",
            LifecycleState::Inactive => "inactive",
            LifecycleState::Active => "active",
            LifecycleState::Finalized => "finalized",
        }
    }

    /// Whether a node in this state can still be configured
    pub fn is_unconfigured(&self) -> bool {
        matches!(self, LifecycleState::Unconfigured | LifecycleState::Unknown)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transition a coordinator can request from the lifecycle engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    Configure,
    Cleanup,
    Activate,
    Deactivate,
    Shutdown,
}

impl Transition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transition::Configure => "configure",
            Transition::Cleanup => "cleanup",
            Transition::Activate => "activate",
            Transition::Deactivate => "deactivate",
            Transition::Shutdown => "shutdown",
        }
    }

    /// State the node ends up in when the transition succeeds
    pub fn goal_state(&self) -> LifecycleState {
        match self {
            Transition::Configure | Transition::Deactivate => LifecycleState::Inactive,
            Transition::Cleanup => LifecycleState::Unconfigured,
            Transition::Activate => LifecycleState::Active,
            Transition::Shutdown => LifecycleState::Finalized,
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
