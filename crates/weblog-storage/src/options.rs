//! Connection and table options shared by the SQL sinks.

use serde::{Deserialize, Serialize};
use weblog_core::PipelineError;

/// Table written by default.
pub const DEFAULT_TABLE: &str = "TB_HR_TEST_WEB_LOG";

/// Options for a SQL record sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkOptions {
    /// Target table name. Must be a plain identifier.
    #[serde(default = "default_table")]
    pub table: String,
    /// Maximum number of pooled connections (default: 1, the pipeline
    /// writes from a single task).
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Timeout for establishing a connection, in seconds (default: 30).
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_table() -> String { DEFAULT_TABLE.into() }
fn default_max_connections() -> u32 { 1 }
fn default_connect_timeout_secs() -> u64 { 30 }

impl Default for SinkOptions {
    fn default() -> Self {
        Self {
            table: default_table(),
            max_connections: default_max_connections(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl SinkOptions {
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Reject table names that would need escaping; the name is spliced
    /// into SQL text.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let valid = !self.table.is_empty()
            && self.table.len() <= 64
            && self
                .table
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
            && !self.table.starts_with(|c: char| c.is_ascii_digit());
        if !valid {
            return Err(PipelineError::Config(format!(
                "invalid table name '{}': use letters, digits and '_' only",
                self.table
            )));
        }
        if self.max_connections == 0 {
            return Err(PipelineError::Config("storage.max_connections must be > 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_is_valid() {
        let opts = SinkOptions::default();
        assert_eq!(opts.table, DEFAULT_TABLE);
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn rejects_injection_prone_table_names() {
        for bad in ["", "web-log", "logs; DROP TABLE x", "a`b", "1logs", "schema.table"] {
            let opts = SinkOptions::default().with_table(bad);
            assert!(opts.validate().is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn zero_pool_size_is_rejected() {
        let opts = SinkOptions {
            max_connections: 0,
            ..Default::default()
        };
        assert!(opts.validate().is_err());
    }
}
