//! Redis lookup configuration.

use serde::{Deserialize, Serialize};

use weblog_core::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedisMode {
    Standalone,
    #[default]
    Cluster,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedisLookupConfig {
    #[serde(default)]
    pub mode: RedisMode,
    /// `host:port` pairs or full `redis://` / `rediss://` URLs. Standalone
    /// mode uses the first entry only.
    #[serde(default = "default_nodes")]
    pub nodes: Vec<String>,
}

fn default_nodes() -> Vec<String> {
    vec!["127.0.0.1:7000".into()]
}

impl Default for RedisLookupConfig {
    fn default() -> Self {
        Self {
            mode: RedisMode::default(),
            nodes: default_nodes(),
        }
    }
}

impl RedisLookupConfig {
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.nodes.iter().all(|n| n.trim().is_empty()) {
            return Err(PipelineError::Config("redis.nodes must not be empty".into()));
        }
        Ok(())
    }

    /// Nodes as connection URLs, with blank entries dropped.
    pub fn node_urls(&self) -> Vec<String> {
        self.nodes
            .iter()
            .map(|n| n.trim())
            .filter(|n| !n.is_empty())
            .map(|n| {
                if n.starts_with("redis://") || n.starts_with("rediss://") {
                    n.to_string()
                } else {
                    format!("redis://{n}")
                }
            })
            .collect()
    }
}
