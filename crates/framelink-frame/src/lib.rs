//! Reference message codec for framelink.
//!
//! Every message is framed with:
//! - A 1-byte success flag (`0` or `1`)
//! - A 4-byte little-endian operation code
//! - A 4-byte little-endian payload length
//!
//! The connection layer treats this codec as a black box; any other codec
//! can be plugged in through `framelink_client::MessageCodec`.

pub mod codec;
pub mod encoder;
pub mod error;

pub use codec::{
    build_raw_message, parse_raw_message, parse_raw_message_with_limit, RawMessage,
    DEFAULT_MAX_PAYLOAD, HEADER_SIZE,
};
pub use encoder::{Json, MessageEncoder};
pub use error::{FrameError, Result};
