//! Client connection handle for length-framed binary request/response protocols.
//!
//! framelink dials one stream socket, reads it on a background task, and
//! hands inbound messages to a sequential consumer with a per-call timeout.
//!
//! # Crate Structure
//!
//! - [`transport`]: Stream socket dialing (TCP, Unix domain sockets)
//! - [`frame`]: Reference message codec (success flag, opcode, payload)
//! - [`client`]: Connection handle, background reader, pop/send API

/// Re-export transport types.
pub mod transport {
    pub use framelink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use framelink_frame::*;
}

/// Re-export client types.
pub mod client {
    pub use framelink_client::*;
}

pub use framelink_client::{
    CancellationToken, Connection, ConnectionConfig, ConnectionError, MessageCodec, RawCodec,
};
