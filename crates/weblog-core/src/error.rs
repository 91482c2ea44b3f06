//! Error types for the weblog pipeline.

use thiserror::Error;

/// Errors raised while turning a raw payload into a [`DecodedEvent`].
///
/// [`DecodedEvent`]: crate::event::DecodedEvent
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Not JSON, not an object, or a field holds a value of the wrong type.
    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("invalid timestamp '{value}': {reason}")]
    InvalidTimestamp { value: String, reason: String },
}

/// Errors that can occur anywhere in the pipeline.
///
/// Only `Connection` and `Config` are fatal; everything else is reduced to a
/// log line at the message boundary.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("connection to {component} failed: {reason}")]
    Connection { component: String, reason: String },

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("lookup error: {0}")]
    Lookup(String),

    #[error("persist error: {0}")]
    Persist(String),

    #[error("stream source error: {0}")]
    Source(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    pub fn connection(component: impl Into<String>, reason: impl ToString) -> Self {
        Self::Connection {
            component: component.into(),
            reason: reason.to_string(),
        }
    }

    /// Returns `true` if the error must abort startup rather than be logged
    /// and skipped.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_startup_errors_are_fatal() {
        assert!(PipelineError::connection("mysql", "refused").is_fatal());
        assert!(PipelineError::Config("bad table".into()).is_fatal());
        assert!(!PipelineError::Lookup("timeout".into()).is_fatal());
        assert!(!PipelineError::Persist("duplicate".into()).is_fatal());
        assert!(!PipelineError::from(DecodeError::MissingField("timestamp")).is_fatal());
    }

    #[test]
    fn connection_error_message_names_component() {
        let err = PipelineError::connection("redis", "connection refused");
        assert_eq!(err.to_string(), "connection to redis failed: connection refused");
    }
}
