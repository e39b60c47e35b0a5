use std::future::Future;

use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::Result;

/// A dialer for reliable, ordered byte-stream connections.
///
/// `dial` returns the stream already split into halves so that a background
/// reader and a foreground writer can own one each without a shared lock.
/// Closing the write half does not close the read half; callers that need
/// the read side to stop must arrange that separately.
pub trait Transport: Send + Sync + 'static {
    /// Owned read side of a dialed stream.
    type ReadHalf: AsyncRead + Send + Unpin + 'static;
    /// Owned write side of a dialed stream.
    type WriteHalf: AsyncWrite + Send + Unpin + 'static;

    /// Dial `address` and return the split stream.
    fn dial(
        &self,
        address: &str,
    ) -> impl Future<Output = Result<(Self::ReadHalf, Self::WriteHalf)>> + Send;

    /// Transport name for diagnostics.
    fn name(&self) -> &'static str;
}
