//! Stream socket transports for framelink.
//!
//! Provides a unified way to dial a reliable, ordered byte stream by address
//! string and split it into independently owned read and write halves:
//! - TCP (`host:port`)
//! - Unix domain sockets (filesystem path, Unix only)
//!
//! This is the lowest layer of framelink. The connection handle in
//! `framelink-client` is generic over the [`Transport`] trait defined here.

pub mod error;
pub mod tcp;
pub mod traits;

#[cfg(unix)]
pub mod uds;

pub use error::{Result, TransportError};
pub use tcp::TcpTransport;
pub use traits::Transport;

#[cfg(unix)]
pub use uds::UnixTransport;
