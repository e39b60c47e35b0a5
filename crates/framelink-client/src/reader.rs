use std::io::ErrorKind;
use std::sync::Arc;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::delivery::{Inbound, Terminal};

/// Background task that turns socket reads into inbound events.
///
/// Each successful read becomes one message holding exactly the bytes read;
/// there is no framing here. End-of-stream (or a local close) latches the
/// terminal state and drops the sender, which drains the handoff for good.
/// Any other read failure is reported and the loop keeps going.
pub(crate) struct Reader<R> {
    inner: R,
    buf: Vec<u8>,
    link: Link,
}

/// Everything the reader shares with the handle. Kept apart from the stream
/// so awaiting a handoff never borrows the read half.
struct Link {
    tx: mpsc::Sender<Inbound>,
    terminal: Arc<Terminal>,
    cancel: CancellationToken,
    shutdown: CancellationToken,
}

enum Step {
    Cancelled,
    Shutdown,
    Read(std::io::Result<usize>),
}

enum Flow {
    Continue,
    Stop,
}

impl<R: AsyncRead + Unpin> Reader<R> {
    pub(crate) fn new(
        inner: R,
        max_message_size: usize,
        tx: mpsc::Sender<Inbound>,
        terminal: Arc<Terminal>,
        cancel: CancellationToken,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            inner,
            buf: vec![0u8; max_message_size],
            link: Link {
                tx,
                terminal,
                cancel,
                shutdown,
            },
        }
    }

    /// Run until end-of-stream, local close, or cancellation.
    pub(crate) async fn run(self) {
        let Self {
            mut inner,
            mut buf,
            link,
        } = self;

        loop {
            if link.cancel.is_cancelled() {
                debug!("reader stopped by cancellation");
                return;
            }

            let step = tokio::select! {
                biased;
                _ = link.cancel.cancelled() => Step::Cancelled,
                _ = link.shutdown.cancelled() => Step::Shutdown,
                read = inner.read(&mut buf) => Step::Read(read),
            };

            let flow = match step {
                Step::Cancelled => {
                    debug!("reader stopped by cancellation");
                    Flow::Stop
                }
                Step::Shutdown => link.finish("closed locally"),
                Step::Read(Ok(0)) => link.finish("end of stream"),
                Step::Read(Ok(n)) => {
                    debug!(bytes = n, "received message");
                    // The read buffer is reused, so hand off an owned copy.
                    let message = Bytes::copy_from_slice(&buf[..n]);
                    link.deliver(Inbound::Message(message)).await
                }
                Step::Read(Err(err)) if err.kind() == ErrorKind::Interrupted => Flow::Continue,
                Step::Read(Err(err)) if is_end_of_stream(&err) => {
                    debug!(error = %err, "stream terminated");
                    link.finish("stream terminated")
                }
                Step::Read(Err(err)) => {
                    warn!(error = %err, "transient read error");
                    link.deliver(Inbound::Failure(err)).await
                }
            };

            if let Flow::Stop = flow {
                return;
            }
        }
    }
}

impl Link {
    async fn deliver(&self, event: Inbound) -> Flow {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                debug!("reader stopped by cancellation during handoff");
                Flow::Stop
            }
            _ = self.shutdown.cancelled() => self.finish("closed locally"),
            sent = self.tx.send(event) => match sent {
                Ok(()) => Flow::Continue,
                Err(_) => {
                    debug!("consumer dropped; reader exiting");
                    Flow::Stop
                }
            },
        }
    }

    fn finish(&self, reason: &'static str) -> Flow {
        if self.terminal.close() {
            info!(reason, "connection closed");
        }
        Flow::Stop
    }
}

/// Read errors that mean the stream can never yield more bytes.
fn is_end_of_stream(err: &std::io::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::UnexpectedEof
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
            | ErrorKind::NotConnected
    )
}
