#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::ErrorKind;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use framelink_client::{CancellationToken, Connection, ConnectionConfig, MessageCodec};
use framelink_transport::{Transport, TransportError};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpListener;

/// Bind a loopback listener on an ephemeral port.
pub async fn loopback() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("loopback listener should bind");
    let address = listener
        .local_addr()
        .expect("listener should have an address")
        .to_string();
    (listener, address)
}

pub fn config(address: &str, pop_timeout: Duration) -> ConnectionConfig {
    ConnectionConfig::new(address).with_pop_timeout(pop_timeout)
}

/// One scripted outcome of a socket read.
pub enum Script {
    Data(&'static [u8]),
    Fail(ErrorKind),
    /// Block forever (until the reader is shut down or cancelled).
    Stall,
}

pub struct ScriptedReader {
    steps: VecDeque<Script>,
}

impl AsyncRead for ScriptedReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        match self.steps.pop_front() {
            Some(Script::Data(bytes)) => {
                buf.put_slice(bytes);
                Poll::Ready(Ok(()))
            }
            Some(Script::Fail(kind)) => {
                Poll::Ready(Err(std::io::Error::new(kind, "scripted failure")))
            }
            Some(Script::Stall) => {
                self.steps.push_front(Script::Stall);
                Poll::Pending
            }
            None => Poll::Ready(Ok(())),
        }
    }
}

/// Write half that records everything written, or fails every write.
pub struct RecordingWriter {
    written: Arc<Mutex<Vec<u8>>>,
    fail_with: Option<ErrorKind>,
}

impl AsyncWrite for RecordingWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        if let Some(kind) = self.fail_with {
            return Poll::Ready(Err(std::io::Error::new(kind, "scripted write failure")));
        }
        self.written
            .lock()
            .expect("recording lock should not be poisoned")
            .extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// Transport whose single dial yields a scripted stream.
pub struct ScriptedTransport {
    parts: Mutex<Option<(ScriptedReader, RecordingWriter)>>,
    written: Arc<Mutex<Vec<u8>>>,
    stall_dial: bool,
}

impl ScriptedTransport {
    pub fn new(reads: impl IntoIterator<Item = Script>) -> Self {
        Self::build(reads, None, false)
    }

    pub fn failing_writes(reads: impl IntoIterator<Item = Script>, kind: ErrorKind) -> Self {
        Self::build(reads, Some(kind), false)
    }

    /// A transport whose dial never completes.
    pub fn stalled() -> Self {
        Self::build([], None, true)
    }

    fn build(
        reads: impl IntoIterator<Item = Script>,
        fail_with: Option<ErrorKind>,
        stall_dial: bool,
    ) -> Self {
        let written = Arc::new(Mutex::new(Vec::new()));
        let reader = ScriptedReader {
            steps: reads.into_iter().collect(),
        };
        let writer = RecordingWriter {
            written: Arc::clone(&written),
            fail_with,
        };
        Self {
            parts: Mutex::new(Some((reader, writer))),
            written,
            stall_dial,
        }
    }

    /// Shared view of the bytes written through this transport.
    pub fn written(&self) -> Arc<Mutex<Vec<u8>>> {
        Arc::clone(&self.written)
    }
}

impl Transport for ScriptedTransport {
    type ReadHalf = ScriptedReader;
    type WriteHalf = RecordingWriter;

    async fn dial(&self, _address: &str) -> framelink_transport::Result<(ScriptedReader, RecordingWriter)> {
        if self.stall_dial {
            std::future::pending::<()>().await;
        }
        self.parts
            .lock()
            .expect("parts lock should not be poisoned")
            .take()
            .ok_or(TransportError::Shutdown)
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Open a connection over a scripted transport.
pub async fn open_scripted<C: MessageCodec>(
    codec: C,
    transport: ScriptedTransport,
    pop_timeout: Duration,
    cancel: CancellationToken,
) -> Connection<C, ScriptedTransport> {
    let mut conn = Connection::from_parts(
        config("scripted", pop_timeout),
        codec,
        transport,
        cancel,
    );
    conn.open().await.expect("scripted dial should succeed");
    conn
}
