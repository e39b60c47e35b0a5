//! Client connection handle for length-framed request/response protocols.
//!
//! A [`Connection`] dials one stream socket, pumps inbound bytes into
//! discrete messages on a background task, and hands them to a sequential
//! consumer through [`Connection::pop_message`], a bounded wait that ends in
//! exactly one of: a message, a timeout, a cancellation, a transient read
//! failure, or the connection being closed.
//!
//! Message encoding and decoding are delegated to a [`MessageCodec`]; the
//! default [`RawCodec`] uses the reference wire format from `framelink-frame`.

pub mod codec;
pub mod config;
pub mod connection;
mod delivery;
pub mod error;
mod reader;

pub use codec::{MessageCodec, PassthroughCodec, RawCodec};
pub use config::{ConnectionConfig, DEFAULT_MAX_MESSAGE_SIZE, DEFAULT_POP_TIMEOUT};
pub use connection::Connection;
pub use error::{BoxError, ConnectionError, Result};
pub use framelink_frame::{Json, MessageEncoder, RawMessage};
pub use tokio_util::sync::CancellationToken;
