use framelink_client::{
    CancellationToken, Connection, ConnectionConfig, ConnectionError, MessageCodec,
    PassthroughCodec, RawCodec,
};
use framelink_transport::{TcpTransport, Transport};
use tracing::{debug, info, warn};

use crate::cmd::{cancel_on_ctrl_c, ListenArgs};
use crate::exit::{connection_error, CliError, CliResult, INTERRUPTED, SUCCESS};
use crate::output::{print_message, OutputFormat, Printable};

pub async fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let config = args.connect.config()?;
    let cancel = cancel_on_ctrl_c();

    if args.connect.unix {
        return run_unix(config, cancel, &args, format).await;
    }
    let transport = TcpTransport::new();
    if args.passthrough {
        let conn = Connection::from_parts(config, PassthroughCodec, transport, cancel);
        listen(conn, &args, format).await
    } else {
        let conn = Connection::from_parts(config, RawCodec::new(), transport, cancel);
        listen(conn, &args, format).await
    }
}

#[cfg(unix)]
async fn run_unix(
    config: ConnectionConfig,
    cancel: CancellationToken,
    args: &ListenArgs,
    format: OutputFormat,
) -> CliResult<i32> {
    let transport = framelink_transport::UnixTransport::new();
    if args.passthrough {
        let conn = Connection::from_parts(config, PassthroughCodec, transport, cancel);
        listen(conn, args, format).await
    } else {
        let conn = Connection::from_parts(config, RawCodec::new(), transport, cancel);
        listen(conn, args, format).await
    }
}

#[cfg(not(unix))]
async fn run_unix(
    _config: ConnectionConfig,
    _cancel: CancellationToken,
    _args: &ListenArgs,
    _format: OutputFormat,
) -> CliResult<i32> {
    Err(CliError::new(
        crate::exit::USAGE,
        "--unix is only supported on Unix platforms",
    ))
}

async fn listen<C, T>(
    mut conn: Connection<C, T>,
    args: &ListenArgs,
    format: OutputFormat,
) -> CliResult<i32>
where
    C: MessageCodec,
    C::Message: Printable,
    T: Transport,
{
    conn.open()
        .await
        .map_err(|err| connection_error("connect failed", err))?;
    info!(address = conn.address(), "listening");

    let mut received = 0usize;
    let outcome = loop {
        match conn.pop_message().await {
            Ok(message) => {
                print_message(&message, conn.address(), format);
                received += 1;
                if args.count.is_some_and(|count| received >= count) {
                    break Ok(SUCCESS);
                }
            }
            Err(err) => match classify_pop_error(err, args.idle_exit) {
                PopDisposition::Continue => {}
                PopDisposition::Stop(code) => break Ok(code),
                PopDisposition::Fatal(err) => break Err(err),
            },
        }
    };

    debug!(received, "listen finished");
    let _ = conn.shutdown().await;
    outcome
}

#[derive(Debug)]
enum PopDisposition {
    Continue,
    Stop(i32),
    Fatal(CliError),
}

fn classify_pop_error(err: ConnectionError, idle_exit: bool) -> PopDisposition {
    match err {
        ConnectionError::PopMessageTimeout(timeout) => {
            if idle_exit {
                info!(?timeout, "no message within timeout; exiting");
                PopDisposition::Stop(SUCCESS)
            } else {
                debug!(?timeout, "still waiting");
                PopDisposition::Continue
            }
        }
        ConnectionError::FailedToWaitMessage(source) => {
            warn!(error = %source, "read failed; still listening");
            PopDisposition::Continue
        }
        err @ (ConnectionError::MessageTooShort { .. } | ConnectionError::Decode(_)) => {
            warn!(error = %err, "dropping undecodable message");
            PopDisposition::Continue
        }
        ConnectionError::ConnectionClosed => {
            info!("peer closed the connection");
            PopDisposition::Stop(SUCCESS)
        }
        ConnectionError::Cancelled => PopDisposition::Stop(INTERRUPTED),
        other => PopDisposition::Fatal(connection_error("receive failed", other)),
    }
}
