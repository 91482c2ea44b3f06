//! Kafka consumer configuration.

use rdkafka::ClientConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use weblog_core::PipelineError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KafkaSourceConfig {
    /// Comma-separated `host:port` bootstrap list.
    #[serde(default = "default_brokers")]
    pub brokers: String,
    #[serde(default = "default_topic")]
    pub topic: String,
    #[serde(default = "default_group_id")]
    pub group_id: String,
    /// Where a new consumer group starts: `"latest"` or `"earliest"`.
    #[serde(default = "default_auto_offset_reset")]
    pub auto_offset_reset: String,
    /// Offsets are committed in the background; redelivery after a crash is
    /// expected and produces duplicate rows downstream.
    #[serde(default = "bool_true")]
    pub enable_auto_commit: bool,
    #[serde(default = "default_session_timeout_ms")]
    pub session_timeout_ms: u64,
    /// Upper bound on messages returned by one poll.
    #[serde(default = "default_max_batch")]
    pub max_batch: usize,
    /// Extra librdkafka properties, applied last.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

fn default_brokers() -> String { "localhost:9092".into() }
fn default_topic() -> String { "hr-test-web-log".into() }
fn default_group_id() -> String { "web-log-consumer-group".into() }
fn default_auto_offset_reset() -> String { "latest".into() }
fn default_session_timeout_ms() -> u64 { 45_000 }
fn default_max_batch() -> usize { 500 }
fn bool_true() -> bool { true }

impl Default for KafkaSourceConfig {
    fn default() -> Self {
        Self {
            brokers: default_brokers(),
            topic: default_topic(),
            group_id: default_group_id(),
            auto_offset_reset: default_auto_offset_reset(),
            enable_auto_commit: true,
            session_timeout_ms: default_session_timeout_ms(),
            max_batch: default_max_batch(),
            properties: BTreeMap::new(),
        }
    }
}

impl KafkaSourceConfig {
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.brokers.split(',').all(|b| b.trim().is_empty()) {
            return Err(PipelineError::Config("kafka.brokers must not be empty".into()));
        }
        if self.topic.trim().is_empty() {
            return Err(PipelineError::Config("kafka.topic must not be empty".into()));
        }
        if self.group_id.trim().is_empty() {
            return Err(PipelineError::Config("kafka.group_id must not be empty".into()));
        }
        if !matches!(self.auto_offset_reset.as_str(), "latest" | "earliest") {
            return Err(PipelineError::Config(format!(
                "kafka.auto_offset_reset must be 'latest' or 'earliest', got '{}'",
                self.auto_offset_reset
            )));
        }
        if self.max_batch == 0 {
            return Err(PipelineError::Config("kafka.max_batch must be > 0".into()));
        }
        Ok(())
    }

    /// librdkafka properties in the order they are applied.
    pub fn client_settings(&self) -> Vec<(String, String)> {
        let mut settings = vec![
            ("bootstrap.servers".to_string(), self.brokers.clone()),
            ("group.id".to_string(), self.group_id.clone()),
            ("auto.offset.reset".to_string(), self.auto_offset_reset.clone()),
            ("enable.auto.commit".to_string(), self.enable_auto_commit.to_string()),
            ("session.timeout.ms".to_string(), self.session_timeout_ms.to_string()),
        ];
        settings.extend(self.properties.iter().map(|(k, v)| (k.clone(), v.clone())));
        settings
    }

    pub fn to_client_config(&self) -> ClientConfig {
        let mut cfg = ClientConfig::new();
        for (key, value) in self.client_settings() {
            cfg.set(key, value);
        }
        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_web_log_topic() {
        let cfg = KafkaSourceConfig::default();
        assert_eq!(cfg.topic, "hr-test-web-log");
        assert_eq!(cfg.group_id, "web-log-consumer-group");
        assert_eq!(cfg.auto_offset_reset, "latest");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn settings_include_overrides_last() {
        let mut cfg = KafkaSourceConfig {
            brokers: "k1:9192,k2:9194".into(),
            ..Default::default()
        };
        cfg.properties.insert("security.protocol".into(), "SASL_SSL".into());

        let settings = cfg.client_settings();
        assert_eq!(settings[0], ("bootstrap.servers".into(), "k1:9192,k2:9194".into()));
        assert!(settings.contains(&("auto.offset.reset".into(), "latest".into())));
        assert_eq!(settings.last().unwrap(), &("security.protocol".into(), "SASL_SSL".into()));

        let client = cfg.to_client_config();
        assert_eq!(client.get("group.id"), Some("web-log-consumer-group"));
    }

    #[test]
    fn rejects_bad_values() {
        let empty_brokers = KafkaSourceConfig { brokers: " , ".into(), ..Default::default() };
        assert!(empty_brokers.validate().is_err());

        let bad_reset = KafkaSourceConfig { auto_offset_reset: "smallest".into(), ..Default::default() };
        assert!(bad_reset.validate().is_err());

        let zero_batch = KafkaSourceConfig { max_batch: 0, ..Default::default() };
        assert!(zero_batch.validate().is_err());
    }

    #[test]
    fn partial_yaml_like_input_uses_defaults() {
        let cfg: KafkaSourceConfig = serde_json::from_str(r#"{"brokers":"b:9092"}"#).unwrap();
        assert_eq!(cfg.brokers, "b:9092");
        assert_eq!(cfg.max_batch, 500);
    }
}
