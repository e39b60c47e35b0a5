use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;
use tracing::debug;

use crate::error::{Result, TransportError};
use crate::traits::Transport;

/// Unix domain socket transport. Addresses are filesystem paths.
#[derive(Debug, Clone, Default)]
pub struct UnixTransport {
    shut_down: Arc<AtomicBool>,
}

impl UnixTransport {
    /// Maximum socket path length.
    /// Unix `sockaddr_un.sun_path` is typically 108 bytes on Linux, 104 on macOS.
    #[cfg(target_os = "linux")]
    const MAX_PATH_LEN: usize = 108;
    #[cfg(not(target_os = "linux"))]
    const MAX_PATH_LEN: usize = 104;

    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse all further dials.
    pub fn shutdown(&self) {
        self.shut_down.store(true, Ordering::Release);
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }
}

impl Transport for UnixTransport {
    type ReadHalf = OwnedReadHalf;
    type WriteHalf = OwnedWriteHalf;

    async fn dial(&self, address: &str) -> Result<(OwnedReadHalf, OwnedWriteHalf)> {
        if self.is_shut_down() {
            return Err(TransportError::Shutdown);
        }
        if address.is_empty() {
            return Err(TransportError::InvalidAddress {
                address: address.to_string(),
                reason: "socket path must not be empty",
            });
        }

        let path = Path::new(address);
        let len = path.as_os_str().len();
        if len >= Self::MAX_PATH_LEN {
            return Err(TransportError::PathTooLong {
                path: path.to_path_buf(),
                len,
                max: Self::MAX_PATH_LEN,
            });
        }

        let stream = UnixStream::connect(path)
            .await
            .map_err(|e| TransportError::Connect {
                address: address.to_string(),
                source: e,
            })?;
        debug!(?path, "connected to unix domain socket");
        Ok(stream.into_split())
    }

    fn name(&self) -> &'static str {
        "unix-domain-socket"
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::UnixListener;

    use super::*;

    fn make_sock_path(tag: &str) -> PathBuf {
        let dir = PathBuf::from(format!(
            "/tmp/fl-{}-{}-{}",
            tag,
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("time should be after epoch")
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
        dir.join("peer.sock")
    }

    #[tokio::test]
    async fn test_dial_and_exchange() {
        let sock_path = make_sock_path("uds");
        let listener = UnixListener::bind(&sock_path).unwrap();

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            stream.write_all(b"hello").await.unwrap();
        });

        let address = sock_path.to_str().unwrap();
        let (mut reader, _writer) = UnixTransport::new().dial(address).await.unwrap();
        let mut buf = [0u8; 5];
        reader.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"hello");

        server.await.unwrap();
        if let Some(parent) = sock_path.parent() {
            let _ = std::fs::remove_dir_all(parent);
        }
    }

    #[tokio::test]
    async fn test_path_too_long() {
        let long_path = "/tmp/".to_string() + &"a".repeat(200) + ".sock";
        let result = UnixTransport::new().dial(&long_path).await;
        assert!(matches!(result, Err(TransportError::PathTooLong { .. })));
    }

    #[tokio::test]
    async fn test_missing_socket_is_connect_error() {
        let sock_path = make_sock_path("missing");
        let result = UnixTransport::new()
            .dial(sock_path.to_str().unwrap())
            .await;
        assert!(matches!(result, Err(TransportError::Connect { .. })));
        if let Some(parent) = sock_path.parent() {
            let _ = std::fs::remove_dir_all(parent);
        }
    }

    #[tokio::test]
    async fn test_shutdown_refuses_dial() {
        let transport = UnixTransport::new();
        transport.shutdown();
        let err = transport.dial("/tmp/unused.sock").await.unwrap_err();
        assert!(matches!(err, TransportError::Shutdown));
    }
}
