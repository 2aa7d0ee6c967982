//! Coordinator configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Coordinator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CoordinatorConfig {
    /// Liveness reconciliation period in milliseconds (2 Hz default)
    #[serde(default = "default_reconcile_period_ms")]
    pub reconcile_period_ms: u64,

    /// Channel buffer size for handle requests
    #[serde(default = "default_command_buffer")]
    pub command_buffer: usize,

    /// Namespace used to qualify activator names against discovery
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

fn default_reconcile_period_ms() -> u64 {
    debug!("default_reconcile_period_ms: called");
    500
}

fn default_command_buffer() -> usize {
    debug!("default_command_buffer: called");
    256
}

fn default_namespace() -> String {
    debug!("default_namespace: called");
    "/".to_string()
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        debug!("CoordinatorConfig::default: called");
        Self {
            reconcile_period_ms: default_reconcile_period_ms(),
            command_buffer: default_command_buffer(),
            namespace: default_namespace(),
        }
    }
}

impl CoordinatorConfig {
    /// Get the reconciliation period as a Duration
    pub fn reconcile_period(&self) -> Duration {
        debug!(reconcile_period_ms = %self.reconcile_period_ms, "CoordinatorConfig::reconcile_period: called");
        Duration::from_millis(self.reconcile_period_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CoordinatorConfig::default();
        assert_eq!(config.reconcile_period_ms, 500);
        assert_eq!(config.command_buffer, 256);
        assert_eq!(config.namespace, "/");
    }

    #[test]
    fn test_reconcile_period_duration() {
        let config = CoordinatorConfig {
            reconcile_period_ms: 50,
            ..Default::default()
        };
        assert_eq!(config.reconcile_period(), Duration::from_millis(50));
    }

    #[test]
    fn test_zero_period_clamped() {
        let config = CoordinatorConfig {
            reconcile_period_ms: 0,
            ..Default::default()
        };
        assert_eq!(config.reconcile_period(), Duration::from_millis(1));
    }

    #[test]
    fn test_yaml_kebab_case() {
        let config: CoordinatorConfig = serde_yaml::from_str("reconcile-period-ms: 100\nnamespace: /robot").unwrap();
        assert_eq!(config.reconcile_period_ms, 100);
        assert_eq!(config.namespace, "/robot");
        assert_eq!(config.command_buffer, 256);
    }
}
