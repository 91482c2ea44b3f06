//! Message, event and record types plus the payload decoder.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

/// A message as handed over by the stream source.
///
/// The payload is opaque until [`decode`] runs; `topic`/`partition`/`offset`
/// are carried only for log context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub payload: String,
}

impl RawMessage {
    pub fn new(topic: impl Into<String>, partition: i32, offset: i64, payload: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            partition,
            offset,
            payload: payload.into(),
        }
    }
}

/// A typed web-access-log event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedEvent {
    pub timestamp: DateTime<Utc>,
    pub customer_id: String,
    pub url: Option<String>,
    pub http_method: Option<String>,
    pub response_time_ms: Option<i32>,
    pub client_ip: Option<String>,
    pub status_code: Option<i32>,
    pub service_id: Option<String>,
    pub product_code: Option<String>,
}

/// The row appended to durable storage for an accepted event.
///
/// Field names follow the table columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedRecord {
    pub timestamp: DateTime<Utc>,
    pub cusno: String,
    pub url: Option<String>,
    pub http_method: Option<String>,
    pub response_time: Option<i32>,
    pub ip_address: Option<String>,
    pub status_code: Option<i32>,
    pub service_id: Option<String>,
    pub prod_cd: Option<String>,
}

impl From<&DecodedEvent> for PersistedRecord {
    fn from(event: &DecodedEvent) -> Self {
        Self {
            timestamp: event.timestamp,
            cusno: event.customer_id.clone(),
            url: event.url.clone(),
            http_method: event.http_method.clone(),
            response_time: event.response_time_ms,
            ip_address: event.client_ip.clone(),
            status_code: event.status_code,
            service_id: event.service_id.clone(),
            prod_cd: event.product_code.clone(),
        }
    }
}

/// Wire shape of an inbound message. Every field is optional here so that
/// absence and wrong type produce distinct errors.
#[derive(Debug, Deserialize)]
struct WireEvent {
    timestamp: Option<String>,
    cusno: Option<String>,
    url: Option<String>,
    http_method: Option<String>,
    response_time: Option<i32>,
    ip_address: Option<String>,
    status_code: Option<i32>,
    service_id: Option<String>,
    prod_cd: Option<String>,
}

/// Decode a raw JSON payload into a [`DecodedEvent`].
///
/// The payload must be a JSON object whose `timestamp` is an RFC 3339
/// instant and whose `cusno` is a string. Fields with the wrong JSON type
/// (e.g. `"response_time": "12"`) are rejected here rather than at use.
pub fn decode(payload: &str) -> Result<DecodedEvent, DecodeError> {
    let value: serde_json::Value =
        serde_json::from_str(payload).map_err(|e| DecodeError::Malformed(e.to_string()))?;

    if !value.is_object() {
        return Err(DecodeError::Malformed(format!(
            "expected a JSON object, got {}",
            json_kind(&value)
        )));
    }

    let wire: WireEvent =
        serde_json::from_value(value).map_err(|e| DecodeError::Malformed(e.to_string()))?;

    let raw_ts = wire.timestamp.ok_or(DecodeError::MissingField("timestamp"))?;
    let timestamp = DateTime::parse_from_rfc3339(&raw_ts)
        .map_err(|e| DecodeError::InvalidTimestamp {
            value: raw_ts.clone(),
            reason: e.to_string(),
        })?
        .with_timezone(&Utc);

    let customer_id = wire.cusno.ok_or(DecodeError::MissingField("cusno"))?;

    Ok(DecodedEvent {
        timestamp,
        customer_id,
        url: wire.url,
        http_method: wire.http_method,
        response_time_ms: wire.response_time,
        client_ip: wire.ip_address,
        status_code: wire.status_code,
        service_id: wire.service_id,
        product_code: wire.prod_cd,
    })
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
