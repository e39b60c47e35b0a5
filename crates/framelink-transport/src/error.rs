use std::path::PathBuf;

/// Errors that can occur while dialing a transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to connect to the specified address.
    #[error("failed to connect to {address}: {source}")]
    Connect {
        address: String,
        source: std::io::Error,
    },

    /// The address string cannot be used by this transport.
    #[error("invalid address {address:?}: {reason}")]
    InvalidAddress {
        address: String,
        reason: &'static str,
    },

    /// The socket path is too long for the platform.
    #[error("socket path too long ({len} bytes, max {max}): {path}")]
    PathTooLong {
        path: PathBuf,
        len: usize,
        max: usize,
    },

    /// An I/O error occurred while configuring the stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The transport has been shut down and refuses new dials.
    #[error("transport shut down")]
    Shutdown,
}

impl TransportError {
    /// Returns true when the transport reports itself closed rather than
    /// failing to reach the remote end.
    pub fn is_shutdown(&self) -> bool {
        matches!(self, Self::Shutdown)
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
