use std::fmt;

use thiserror::Error;

/// Error types for queue client operations.
///
/// Every failure is returned to the caller unchanged; the client never
/// retries or swallows an error. Partial batch failure is not an error, see
/// [`crate::message::BatchResultEntry`].
#[derive(Debug, Error)]
pub enum QueueClientError {
    /// Error that occurs while building the SQS SDK client.
    ///
    /// This typically happens when an explicit [`crate::connection::Connection`]
    /// carries only half of a credential pair.
    #[error("failed to initialize SQS client: {0}")]
    InitializationError(String),

    /// Broker or network level failure: authentication, throttling, a
    /// malformed queue identifier, size limits.
    #[error("{0}")]
    TransportError(#[from] TransportError),

    /// The receipt handle is well formed but no longer refers to a live lease.
    #[error("receipt handle no longer refers to a live lease: {receipt_handle}")]
    InvalidHandle { receipt_handle: String },
}

impl QueueClientError {
    /// Returns the broker error code when the failure came from the transport.
    pub fn code(&self) -> Option<&str> {
        match self {
            QueueClientError::TransportError(err) => err.code(),
            _ => None,
        }
    }
}

/// Broker-level failure with the broker-provided detail preserved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct TransportError {
    operation: String,
    code: Option<String>,
    message: String,
}

impl TransportError {
    /// Creates a new `TransportError` for `operation` without a broker code.
    pub fn new(operation: impl Into<String>, message: impl Into<String>) -> Self {
        TransportError {
            operation: operation.into(),
            code: None,
            message: message.into(),
        }
    }

    /// Attaches the broker error code, e.g. `AWS.SimpleQueueService.NonExistentQueue`.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} failed: {}: {}", self.operation, code, self.message),
            None => write!(f, "{} failed: {}", self.operation, self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_display_includes_code_when_present() {
        let err = TransportError::new("SendMessage", "body too large").with_code("InvalidParameterValue");
        assert_eq!(
            err.to_string(),
            "SendMessage failed: InvalidParameterValue: body too large"
        );

        let err = TransportError::new("DeleteMessage", "connection reset");
        assert_eq!(err.to_string(), "DeleteMessage failed: connection reset");
        assert_eq!(err.code(), None);
    }

    #[test]
    fn code_is_only_reported_for_transport_failures() {
        let err: QueueClientError = TransportError::new("ReceiveMessage", "denied")
            .with_code("AccessDenied")
            .into();
        assert_eq!(err.code(), Some("AccessDenied"));

        let err = QueueClientError::InvalidHandle {
            receipt_handle: "rh-1".to_string(),
        };
        assert_eq!(err.code(), None);
    }
}
