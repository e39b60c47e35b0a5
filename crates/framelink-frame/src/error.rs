/// Errors that can occur while building or parsing messages.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// Fewer bytes than the header, or than the header-declared payload length.
    #[error("message is too short ({len} bytes, need {needed})")]
    MessageTooShort { len: usize, needed: usize },

    /// The success byte was neither 0 nor 1.
    #[error("invalid success flag 0x{0:02x}")]
    InvalidSuccessFlag(u8),

    /// Bytes remain after the declared payload.
    #[error("{0} trailing bytes after message payload")]
    TrailingBytes(usize),

    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The payload encoder failed.
    #[error("failed to encode payload: {0}")]
    Encode(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<serde_json::Error> for FrameError {
    fn from(err: serde_json::Error) -> Self {
        Self::Encode(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
