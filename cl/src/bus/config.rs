//! Bus configuration

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Capacity settings for the in-process cascade bus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BusConfig {
    /// Activation messages kept for late subscribers
    #[serde(default = "default_activation_history_depth")]
    pub activation_history_depth: usize,

    /// Buffered state announcements per subscriber
    #[serde(default = "default_state_channel_capacity")]
    pub state_channel_capacity: usize,
}

fn default_activation_history_depth() -> usize {
    debug!("default_activation_history_depth: called");
    1000
}

fn default_state_channel_capacity() -> usize {
    debug!("default_state_channel_capacity: called");
    100
}

impl Default for BusConfig {
    fn default() -> Self {
        debug!("BusConfig::default: called");
        Self {
            activation_history_depth: default_activation_history_depth(),
            state_channel_capacity: default_state_channel_capacity(),
        }
    }
}
