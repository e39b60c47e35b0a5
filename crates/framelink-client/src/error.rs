use std::time::Duration;

use framelink_transport::TransportError;

/// Boxed root cause carried by wrapping variants.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur in connection operations.
///
/// Wrapping variants keep their root cause reachable through
/// [`std::error::Error::source`].
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// The stream ended, or the connection was closed locally.
    #[error("connection closed")]
    ConnectionClosed,

    /// Dialing the remote address failed.
    #[error("connection failed: {source}")]
    ConnectionFailed {
        address: String,
        #[source]
        source: TransportError,
    },

    /// A decoded message was shorter than its header requires.
    #[error("message is too short ({len} bytes, need {needed})")]
    MessageTooShort { len: usize, needed: usize },

    /// The background reader reported a non-terminal read failure.
    #[error("failed to wait message: {0}")]
    FailedToWaitMessage(#[source] std::io::Error),

    /// Writing an encoded message to the socket failed.
    #[error("failed to send message: {0}")]
    FailedToSendMessage(#[source] std::io::Error),

    /// The codec could not encode the outgoing message.
    #[error("failed to build message: {0}")]
    FailedToBuildMessage(#[source] BoxError),

    /// The codec rejected inbound bytes.
    #[error(transparent)]
    Decode(BoxError),

    /// No message arrived within the pop timeout.
    #[error("pop message timeout after {0:?}")]
    PopMessageTimeout(Duration),

    /// The caller's cancellation token fired.
    ///
    /// A [`CancellationToken`](tokio_util::sync::CancellationToken) carries
    /// no cause, so this variant cannot say why the caller cancelled. Callers
    /// that cancel on a deadline and need to tell that apart from an explicit
    /// cancel should record the reason alongside the token they fire.
    #[error("operation cancelled")]
    Cancelled,

    /// The operation needs an open connection.
    #[error("connection not open")]
    NotConnected,

    /// `open` was called on a connection that is already open.
    #[error("connection already open")]
    AlreadyOpen,

    /// The connection configuration is unusable.
    #[error("invalid connection config: {0}")]
    InvalidConfig(String),
}

impl ConnectionError {
    /// Returns true if the connection can never deliver another message.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::ConnectionClosed | Self::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, ConnectionError>;

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn wrapping_variants_keep_root_cause() {
        let err = ConnectionError::FailedToSendMessage(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "pipe gone",
        ));
        assert_eq!(err.to_string(), "failed to send message: pipe gone");
        let source = err.source().expect("source should be kept");
        assert_eq!(source.to_string(), "pipe gone");
    }

    #[test]
    fn connection_failed_exposes_transport_error() {
        let err = ConnectionError::ConnectionFailed {
            address: "127.0.0.1:1".to_string(),
            source: TransportError::Shutdown,
        };
        let source = err.source().expect("source should be kept");
        assert!(source.downcast_ref::<TransportError>().is_some());
    }

    #[test]
    fn decode_is_transparent() {
        let inner = std::io::Error::new(std::io::ErrorKind::InvalidData, "bad frame");
        let err = ConnectionError::Decode(Box::new(inner));
        assert_eq!(err.to_string(), "bad frame");
    }

    #[test]
    fn terminal_classification() {
        assert!(ConnectionError::ConnectionClosed.is_terminal());
        assert!(ConnectionError::Cancelled.is_terminal());
        assert!(!ConnectionError::PopMessageTimeout(Duration::from_millis(1)).is_terminal());
    }

    #[test]
    fn cancelled_carries_no_cause() {
        let err = ConnectionError::Cancelled;
        assert!(err.source().is_none());
        assert_eq!(err.to_string(), "operation cancelled");
    }
}
