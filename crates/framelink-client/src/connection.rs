use std::sync::Arc;
use std::time::Duration;

use framelink_frame::MessageEncoder;
use framelink_transport::{TcpTransport, Transport, TransportError};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::codec::{MessageCodec, RawCodec};
use crate::config::ConnectionConfig;
use crate::delivery::{handoff, Inbound, Terminal};
use crate::error::{ConnectionError, Result};
use crate::reader::Reader;

/// Handle for one outbound stream connection.
///
/// Lifecycle is constructed → open → closed, and a closed connection is
/// never reopened. While open, a background task reads the socket and hands
/// each read to [`Connection::pop_message`], one at a time.
///
/// `pop_message` assumes a single logical consumer; concurrent callers are
/// served one after another. Writes from `send_message` are serialized
/// internally.
pub struct Connection<C: MessageCodec = RawCodec, T: Transport = TcpTransport> {
    config: ConnectionConfig,
    codec: C,
    transport: T,
    cancel: CancellationToken,
    shutdown: CancellationToken,
    terminal: Arc<Terminal>,
    opened: bool,
    writer: Mutex<Option<T::WriteHalf>>,
    inbound: Mutex<Option<mpsc::Receiver<Inbound>>>,
    reader_task: Option<JoinHandle<()>>,
}

impl Connection {
    /// TCP connection using the reference codec.
    ///
    /// `cancel` is observed by the background reader and by every
    /// `pop_message` call for the lifetime of the connection.
    pub fn new(config: ConnectionConfig, cancel: CancellationToken) -> Self {
        Self::from_parts(config, RawCodec::new(), TcpTransport::new(), cancel)
    }
}

impl<C: MessageCodec, T: Transport> Connection<C, T> {
    /// Connection with an explicit codec and transport.
    pub fn from_parts(
        config: ConnectionConfig,
        codec: C,
        transport: T,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            config,
            codec,
            transport,
            cancel,
            shutdown: CancellationToken::new(),
            terminal: Arc::new(Terminal::new()),
            opened: false,
            writer: Mutex::new(None),
            inbound: Mutex::new(None),
            reader_task: None,
        }
    }

    /// Dial the configured address and start the background reader.
    ///
    /// A transport that reports itself shut down yields
    /// [`ConnectionError::ConnectionClosed`]; any other dial failure yields
    /// [`ConnectionError::ConnectionFailed`] and leaves the handle unopened,
    /// so the caller may try again.
    pub async fn open(&mut self) -> Result<()> {
        if self.terminal.is_closed() {
            return Err(ConnectionError::ConnectionClosed);
        }
        if self.opened {
            return Err(ConnectionError::AlreadyOpen);
        }
        self.config.validate()?;

        let dialed = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(ConnectionError::Cancelled),
            dialed = dial(&self.transport, &self.config.address, self.config.connect_timeout) => dialed,
        };
        let (read_half, write_half) = dialed.map_err(|err| {
            if err.is_shutdown() {
                ConnectionError::ConnectionClosed
            } else {
                ConnectionError::ConnectionFailed {
                    address: self.config.address.clone(),
                    source: err,
                }
            }
        })?;

        let (tx, rx) = handoff();
        let reader = Reader::new(
            read_half,
            self.config.max_message_size,
            tx,
            Arc::clone(&self.terminal),
            self.cancel.clone(),
            self.shutdown.clone(),
        );
        self.reader_task = Some(tokio::spawn(reader.run()));
        *self.writer.get_mut() = Some(write_half);
        *self.inbound.get_mut() = Some(rx);
        self.opened = true;

        info!(
            address = %self.config.address,
            transport = self.transport.name(),
            "connection opened"
        );
        Ok(())
    }

    /// Close the connection without waiting for the reader to exit.
    ///
    /// Latches the closed state, unblocks the reader's in-flight read,
    /// abandons any in-flight `send_message` and shuts down the write half.
    /// Closing twice is a no-op.
    pub async fn close(&self) -> Result<()> {
        if !self.opened {
            return Err(ConnectionError::NotConnected);
        }

        self.shutdown.cancel();
        if self.terminal.close() {
            info!(address = %self.config.address, "connection closed locally");
        }

        if let Some(mut writer) = self.writer.lock().await.take() {
            if let Err(err) = writer.shutdown().await {
                debug!(error = %err, "write half shutdown failed");
            }
        }
        Ok(())
    }

    /// Close and wait for the background reader to exit.
    pub async fn shutdown(mut self) -> Result<()> {
        self.close().await?;
        if let Some(task) = self.reader_task.take() {
            if let Err(err) = task.await {
                warn!(error = %err, "reader task failed");
            }
        }
        Ok(())
    }

    /// Wait until the connection is closed and return the terminal error.
    ///
    /// Returns [`ConnectionError::ConnectionClosed`] once the stream ended or
    /// was closed locally, or [`ConnectionError::Cancelled`] if the
    /// cancellation token fires first. The closed state is latched, so any
    /// number of callers, early or late, observe it.
    pub async fn wait_for_close(&self) -> ConnectionError {
        tokio::select! {
            biased;
            _ = self.terminal.closed() => ConnectionError::ConnectionClosed,
            _ = self.cancel.cancelled() => ConnectionError::Cancelled,
        }
    }

    /// Encode a message with the codec and write it to the socket.
    ///
    /// Encoding happens before anything touches the socket, so an encoder
    /// failure never produces a partial write. A `close` issued while the
    /// write is in flight abandons it with
    /// [`ConnectionError::ConnectionClosed`].
    pub async fn send_message<P>(&self, success: bool, opcode: u32, payload: &P) -> Result<()>
    where
        P: MessageEncoder + ?Sized,
    {
        let message = self
            .codec
            .build(success, opcode, payload)
            .map_err(ConnectionError::FailedToBuildMessage)?;

        let mut writer = self.writer.lock().await;
        let Some(stream) = writer.as_mut() else {
            return Err(if self.opened {
                ConnectionError::ConnectionClosed
            } else {
                ConnectionError::NotConnected
            });
        };

        // A local close must not wait behind a write the peer never drains.
        let written = tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => return Err(ConnectionError::ConnectionClosed),
            written = write_message(stream, &message) => written,
        };
        written.map_err(ConnectionError::FailedToSendMessage)?;

        debug!(opcode, success, bytes = message.len(), "sent message");
        Ok(())
    }

    /// Wait for the next inbound message.
    ///
    /// Once the connection is closed, a read already handed off is still
    /// returned; after that every call fails immediately with
    /// [`ConnectionError::ConnectionClosed`]. Otherwise returns the first of:
    /// - cancellation → [`ConnectionError::Cancelled`]
    /// - `pop_timeout` elapsed since this call began → [`ConnectionError::PopMessageTimeout`]
    /// - a message → the codec's parse result, unchanged
    /// - a transient read failure → [`ConnectionError::FailedToWaitMessage`]
    ///
    /// Cancellation is checked first, so an already-cancelled token wins
    /// over a message that is ready. A timeout never drops a message; it
    /// stays queued for the next call.
    pub async fn pop_message(&self) -> Result<C::Message> {
        if self.terminal.is_closed() {
            return match self.queued_inbound().await {
                Some(event) => self.resolve(event),
                None => Err(ConnectionError::ConnectionClosed),
            };
        }
        if !self.opened {
            return Err(ConnectionError::NotConnected);
        }

        let deadline = Instant::now() + self.config.pop_timeout;
        let event = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(ConnectionError::Cancelled),
            _ = tokio::time::sleep_until(deadline) => {
                return Err(ConnectionError::PopMessageTimeout(self.config.pop_timeout));
            }
            event = self.next_inbound() => event,
        };

        match event {
            Some(event) => self.resolve(event),
            None => Err(ConnectionError::ConnectionClosed),
        }
    }

    fn resolve(&self, event: Inbound) -> Result<C::Message> {
        match event {
            Inbound::Message(bytes) => self.codec.parse(bytes),
            Inbound::Failure(err) => Err(ConnectionError::FailedToWaitMessage(err)),
        }
    }

    /// Event left in the handoff when the connection closed, without waiting.
    async fn queued_inbound(&self) -> Option<Inbound> {
        let mut inbound = self.inbound.lock().await;
        inbound.as_mut().and_then(|rx| rx.try_recv().ok())
    }

    async fn next_inbound(&self) -> Option<Inbound> {
        let mut inbound = self.inbound.lock().await;
        match inbound.as_mut() {
            Some(rx) => rx.recv().await,
            None => None,
        }
    }

    /// Remote address this connection dials.
    pub fn address(&self) -> &str {
        &self.config.address
    }

    /// Construction parameters.
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Message codec.
    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// True between a successful `open` and the closed state.
    pub fn is_open(&self) -> bool {
        self.opened && !self.terminal.is_closed()
    }

    /// True once the stream ended or the connection was closed. Never reverts.
    pub fn is_closed(&self) -> bool {
        self.terminal.is_closed()
    }
}

impl<C: MessageCodec, T: Transport> Drop for Connection<C, T> {
    fn drop(&mut self) {
        // Unblocks the reader so the task does not outlive the handle.
        self.shutdown.cancel();
    }
}

impl<C: MessageCodec, T: Transport> std::fmt::Debug for Connection<C, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("address", &self.config.address)
            .field("transport", &self.transport.name())
            .field("open", &self.is_open())
            .field("closed", &self.is_closed())
            .finish()
    }
}

async fn dial<T: Transport>(
    transport: &T,
    address: &str,
    connect_timeout: Option<Duration>,
) -> framelink_transport::Result<(T::ReadHalf, T::WriteHalf)> {
    let Some(limit) = connect_timeout else {
        return transport.dial(address).await;
    };

    match tokio::time::timeout(limit, transport.dial(address)).await {
        Ok(dialed) => dialed,
        Err(_) => Err(TransportError::Connect {
            address: address.to_string(),
            source: std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                format!("connect timed out after {limit:?}"),
            ),
        }),
    }
}

async fn write_message<W>(stream: &mut W, message: &[u8]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    stream.write_all(message).await?;
    stream.flush().await
}
