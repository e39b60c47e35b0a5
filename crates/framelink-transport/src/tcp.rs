use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tracing::debug;

use crate::error::{Result, TransportError};
use crate::traits::Transport;

/// TCP transport. Addresses are anything `TcpStream::connect` resolves
/// (`127.0.0.1:4000`, `localhost:4000`, `[::1]:4000`).
///
/// Clones share the shutdown flag: once [`TcpTransport::shutdown`] is called
/// on any clone, every subsequent dial fails with [`TransportError::Shutdown`].
#[derive(Debug, Clone)]
pub struct TcpTransport {
    nodelay: bool,
    shut_down: Arc<AtomicBool>,
}

impl TcpTransport {
    /// Create a TCP transport with `TCP_NODELAY` enabled.
    pub fn new() -> Self {
        Self {
            nodelay: true,
            shut_down: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Override `TCP_NODELAY` for dialed streams.
    pub fn with_nodelay(mut self, nodelay: bool) -> Self {
        self.nodelay = nodelay;
        self
    }

    /// Refuse all further dials.
    pub fn shutdown(&self) {
        self.shut_down.store(true, Ordering::Release);
    }

    /// Whether [`TcpTransport::shutdown`] has been called.
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for TcpTransport {
    type ReadHalf = OwnedReadHalf;
    type WriteHalf = OwnedWriteHalf;

    async fn dial(&self, address: &str) -> Result<(OwnedReadHalf, OwnedWriteHalf)> {
        if self.is_shut_down() {
            return Err(TransportError::Shutdown);
        }
        if address.trim().is_empty() {
            return Err(TransportError::InvalidAddress {
                address: address.to_string(),
                reason: "address must not be empty",
            });
        }

        let stream = TcpStream::connect(address)
            .await
            .map_err(|e| TransportError::Connect {
                address: address.to_string(),
                source: e,
            })?;
        stream.set_nodelay(self.nodelay)?;

        debug!(address, peer = ?stream.peer_addr().ok(), "connected over tcp");
        Ok(stream.into_split())
    }

    fn name(&self) -> &'static str {
        "tcp"
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    #[tokio::test]
    async fn test_dial_and_exchange() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 5];
            stream.read_exact(&mut buf).await.unwrap();
            stream.write_all(&buf).await.unwrap();
        });

        let (mut reader, mut writer) = TcpTransport::new().dial(&addr).await.unwrap();
        writer.write_all(b"hello").await.unwrap();
        let mut buf = [0u8; 5];
        reader.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"hello");

        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_dial_refused() {
        // Bind then drop to get a port with nothing listening.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let result = TcpTransport::new().dial(&addr).await;
        assert!(matches!(result, Err(TransportError::Connect { .. })));
    }

    #[tokio::test]
    async fn test_empty_address_rejected() {
        let result = TcpTransport::new().dial("  ").await;
        assert!(matches!(
            result,
            Err(TransportError::InvalidAddress { .. })
        ));
    }

    #[tokio::test]
    async fn test_shutdown_refuses_dial_on_all_clones() {
        let transport = TcpTransport::new();
        let clone = transport.clone();
        transport.shutdown();

        assert!(clone.is_shut_down());
        let err = clone.dial("127.0.0.1:1").await.unwrap_err();
        assert!(err.is_shutdown());
    }
}
