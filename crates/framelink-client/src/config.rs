use std::time::Duration;

use crate::error::{ConnectionError, Result};

/// Default size of the reusable read buffer: 64 KiB.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 64 * 1024;

/// Default time `pop_message` waits for the next message.
pub const DEFAULT_POP_TIMEOUT: Duration = Duration::from_secs(5);

/// Construction parameters for a [`Connection`](crate::Connection).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Remote address in the transport's syntax (`host:port` for TCP).
    pub address: String,
    /// Size of the reusable read buffer; bounds a single inbound message.
    pub max_message_size: usize,
    /// Per-call wait bound for `pop_message`.
    pub pop_timeout: Duration,
    /// Optional bound on dialing. `None` waits for the transport.
    pub connect_timeout: Option<Duration>,
}

impl ConnectionConfig {
    /// Config for `address` with default limits.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            pop_timeout: DEFAULT_POP_TIMEOUT,
            connect_timeout: None,
        }
    }

    pub fn with_max_message_size(mut self, max_message_size: usize) -> Self {
        self.max_message_size = max_message_size;
        self
    }

    pub fn with_pop_timeout(mut self, pop_timeout: Duration) -> Self {
        self.pop_timeout = pop_timeout;
        self
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = Some(connect_timeout);
        self
    }

    /// Reject configurations that cannot produce a working connection.
    pub fn validate(&self) -> Result<()> {
        if self.address.trim().is_empty() {
            return Err(ConnectionError::InvalidConfig(
                "address must not be empty".to_string(),
            ));
        }
        if self.max_message_size == 0 {
            return Err(ConnectionError::InvalidConfig(
                "max_message_size must be greater than zero".to_string(),
            ));
        }
        if self.pop_timeout.is_zero() {
            return Err(ConnectionError::InvalidConfig(
                "pop_timeout must be greater than zero".to_string(),
            ));
        }
        if self.connect_timeout.is_some_and(|t| t.is_zero()) {
            return Err(ConnectionError::InvalidConfig(
                "connect_timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
