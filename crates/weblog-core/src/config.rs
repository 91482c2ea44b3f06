//! Pipeline configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::PipelineError;

/// Settings for the message pipeline itself (not its external endpoints).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Upper bound on a single poll of the stream source (milliseconds).
    #[serde(default = "default_poll_timeout_ms")]
    pub poll_timeout_ms: u64,
    /// Length of the throughput reporting window (seconds).
    #[serde(default = "default_report_interval_secs")]
    pub report_interval_secs: u64,
    /// Attribute read from the lookup store for each customer.
    #[serde(default = "default_tier_attribute")]
    pub tier_attribute: String,
    /// Tier code an event must carry to be persisted.
    #[serde(default = "default_tier_code")]
    pub tier_code: String,
}

fn default_poll_timeout_ms() -> u64 { 100 }
fn default_report_interval_secs() -> u64 { 60 }
fn default_tier_attribute() -> String { "CUS_GRADE".into() }
fn default_tier_code() -> String { crate::tier::DEFAULT_TIER_CODE.into() }

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            poll_timeout_ms: default_poll_timeout_ms(),
            report_interval_secs: default_report_interval_secs(),
            tier_attribute: default_tier_attribute(),
            tier_code: default_tier_code(),
        }
    }
}

impl PipelineConfig {
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval_secs)
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.poll_timeout_ms == 0 {
            return Err(PipelineError::Config("pipeline.poll_timeout_ms must be > 0".into()));
        }
        if self.report_interval_secs == 0 {
            return Err(PipelineError::Config("pipeline.report_interval_secs must be > 0".into()));
        }
        if self.tier_attribute.trim().is_empty() {
            return Err(PipelineError::Config("pipeline.tier_attribute must not be empty".into()));
        }
        if self.tier_code.trim().is_empty() {
            return Err(PipelineError::Config("pipeline.tier_code must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.poll_timeout(), Duration::from_millis(100));
        assert_eq!(cfg.report_interval(), Duration::from_secs(60));
        assert_eq!(cfg.tier_attribute, "CUS_GRADE");
        assert_eq!(cfg.tier_code, "01");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let cfg: PipelineConfig = serde_json::from_str(r#"{"tier_code":"02"}"#).unwrap();
        assert_eq!(cfg.tier_code, "02");
        assert_eq!(cfg.poll_timeout_ms, 100);
    }

    #[test]
    fn zero_interval_is_invalid() {
        let cfg = PipelineConfig {
            report_interval_secs: 0,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(PipelineError::Config(_))));
    }
}
