//! Tracing subscriber setup.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default level: "trace" | "debug" | "info" | "warn" | "error"
    #[serde(default = "default_level")]
    pub level: String,
    /// Per-crate overrides, e.g. `weblog-core: debug`.
    #[serde(default)]
    pub components: BTreeMap<String, String>,
    /// JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            components: BTreeMap::new(),
            json: false,
        }
    }
}

impl LogConfig {
    /// `EnvFilter` directive string, e.g. `"info,weblog_core=debug"`.
    pub fn directives(&self) -> String {
        let mut directives = self.level.clone();
        for (component, level) in &self.components {
            directives.push_str(&format!(",{}={}", component.replace('-', "_"), level));
        }
        directives
    }
}

/// Install the global subscriber. `RUST_LOG`, when set, wins over the
/// configured directives.
pub fn init_tracing(config: &LogConfig) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(config.directives())?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    if config.json {
        registry.with(fmt::layer().json()).try_init()?;
    } else {
        registry.with(fmt::layer()).try_init()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_include_component_overrides() {
        let mut cfg = LogConfig::default();
        cfg.components.insert("weblog-core".into(), "debug".into());
        cfg.components.insert("rdkafka".into(), "warn".into());
        assert_eq!(cfg.directives(), "info,rdkafka=warn,weblog_core=debug");
    }

    #[test]
    fn default_is_plain_info() {
        let cfg = LogConfig::default();
        assert_eq!(cfg.directives(), "info");
        assert!(!cfg.json);
    }
}
