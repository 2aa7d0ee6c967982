//! Wire messages for the two cascade topics

use serde::{Deserialize, Serialize};

use crate::lifecycle::LifecycleState;

/// Topic carrying activation relationship changes (retained)
pub const ACTIVATIONS_TOPIC: &str = "activations";

/// Topic carrying state announcements (not retained)
pub const STATES_TOPIC: &str = "states";

/// Relationship operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Add,
    Remove,
}

/// Announcement that `activator` starts or stops activating `target`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationMessage {
    pub operation: Operation,
    pub target: String,
    pub activator: String,
}

impl ActivationMessage {
    pub fn add(target: impl Into<String>, activator: impl Into<String>) -> Self {
        Self {
            operation: Operation::Add,
            target: target.into(),
            activator: activator.into(),
        }
    }

    pub fn remove(target: impl Into<String>, activator: impl Into<String>) -> Self {
        Self {
            operation: Operation::Remove,
            target: target.into(),
            activator: activator.into(),
        }
    }
}

/// Announcement of a node's current lifecycle state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateMessage {
    pub node: String,
    pub state: LifecycleState,
}

impl StateMessage {
    pub fn new(node: impl Into<String>, state: LifecycleState) -> Self {
        Self {
            node: node.into(),
            state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activation_message_json() {
        let msg = ActivationMessage::add("camera", "planner");
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"operation":"add","target":"camera","activator":"planner"}"#);
    }

    #[test]
    fn test_remove_message_deserialize() {
        let json = r#"{"operation":"remove","target":"camera","activator":"planner"}"#;
        let msg: ActivationMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg, ActivationMessage::remove("camera", "planner"));
    }

    #[test]
    fn test_state_message_json() {
        let msg = StateMessage::new("planner", LifecycleState::Active);
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"node":"planner","state":"active"}"#);
    }

    #[test]
    fn test_topic_names() {
        assert_eq!(ACTIVATIONS_TOPIC, "activations");
        assert_eq!(STATES_TOPIC, "states");
        assert_ne!(ACTIVATIONS_TOPIC, STATES_TOPIC);
    }
}
