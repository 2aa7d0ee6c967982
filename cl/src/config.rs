//! Configuration for the cascade simulator

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bus::BusConfig;
use crate::coordinator::CoordinatorConfig;
use crate::error::{CascadeError, CascadeResult};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(default)]
    pub log_level: Option<String>,

    #[serde(default)]
    pub coordinator: CoordinatorConfig,

    #[serde(default)]
    pub bus: BusConfig,

    #[serde(default)]
    pub graph: GraphConfig,
}

/// Nodes to simulate and the activation edges between them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphConfig {
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub name: String,

    /// Nodes this node activates
    #[serde(default)]
    pub activates: Vec<String>,
}

impl NodeSpec {
    pub fn new(name: impl Into<String>, activates: &[&str]) -> Self {
        Self {
            name: name.into(),
            activates: activates.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl GraphConfig {
    /// Nodes no other node activates; the simulator drives these directly
    pub fn roots(&self) -> Vec<&str> {
        let activated: HashSet<&str> = self
            .nodes
            .iter()
            .flat_map(|node| node.activates.iter().map(String::as_str))
            .collect();
        self.nodes
            .iter()
            .map(|node| node.name.as_str())
            .filter(|name| !activated.contains(name))
            .collect()
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|node| node.activates.len()).sum()
    }

    /// Reject duplicate names, self-activation and edges to unknown nodes
    pub fn validate(&self) -> CascadeResult<()> {
        let mut names = HashSet::new();
        for node in &self.nodes {
            if node.name.is_empty() {
                return Err(CascadeError::Config("node with empty name".to_string()));
            }
            if !names.insert(node.name.as_str()) {
                return Err(CascadeError::Config(format!("duplicate node '{}'", node.name)));
            }
        }

        for node in &self.nodes {
            for target in &node.activates {
                if target == &node.name {
                    return Err(CascadeError::Config(format!("node '{}' activates itself", node.name)));
                }
                if !names.contains(target.as_str()) {
                    return Err(CascadeError::Config(format!(
                        "node '{}' activates unknown node '{}'",
                        node.name, target
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Config {
    /// Load config from file, or use defaults
    pub fn load(path: Option<&PathBuf>) -> Result<Self> {
        if let Some(config_path) = path {
            debug!(path = %config_path.display(), "Config::load: explicit path");
            return Self::load_from_file(config_path)
                .context(format!("Failed to load config from {}", config_path.display()));
        }

        for path in Self::default_paths() {
            if path.exists() {
                debug!(path = %path.display(), "Config::load: found default config");
                return Self::load_from_file(&path);
            }
        }

        debug!("Config::load: no config file found, using defaults");
        Ok(Config::default())
    }

    /// Read just the log level so logging can start before the full load
    pub fn load_log_level(path: Option<&PathBuf>) -> Option<String> {
        Self::load(path).ok().and_then(|config| config.log_level)
    }

    /// Validate the config before spawning anything
    pub fn validate(&self) -> CascadeResult<()> {
        self.graph.validate()
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    fn default_paths() -> Vec<PathBuf> {
        [
            dirs::config_dir().map(|p| p.join("cascade-lifecycle").join("config.yml")),
            Some(PathBuf::from("cascade.yml")),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}
