use std::fs;

use framelink_client::{CancellationToken, Connection, ConnectionConfig, MessageCodec, RawCodec};
use framelink_transport::{TcpTransport, Transport};
use tracing::debug;

use crate::cmd::{cancel_on_ctrl_c, SendArgs};
use crate::exit::{connection_error, io_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_message, OutputFormat, Printable};

pub async fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let config = args.connect.config()?;
    let payload = resolve_payload(&args)?;
    let cancel = cancel_on_ctrl_c();

    if args.connect.unix {
        return run_unix(config, cancel, &args, &payload, format).await;
    }
    let conn = Connection::from_parts(config, RawCodec::new(), TcpTransport::new(), cancel);
    exchange(conn, &args, &payload, format).await
}

#[cfg(unix)]
async fn run_unix(
    config: ConnectionConfig,
    cancel: CancellationToken,
    args: &SendArgs,
    payload: &[u8],
    format: OutputFormat,
) -> CliResult<i32> {
    let transport = framelink_transport::UnixTransport::new();
    let conn = Connection::from_parts(config, RawCodec::new(), transport, cancel);
    exchange(conn, args, payload, format).await
}

#[cfg(not(unix))]
async fn run_unix(
    _config: ConnectionConfig,
    _cancel: CancellationToken,
    _args: &SendArgs,
    _payload: &[u8],
    _format: OutputFormat,
) -> CliResult<i32> {
    Err(CliError::new(
        USAGE,
        "--unix is only supported on Unix platforms",
    ))
}

async fn exchange<C, T>(
    mut conn: Connection<C, T>,
    args: &SendArgs,
    payload: &[u8],
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

    let sent = conn.send_message(!args.fail, args.opcode, payload).await;
    if let Err(err) = sent {
        let _ = conn.shutdown().await;
        return Err(connection_error("send failed", err));
    }
    debug!(opcode = args.opcode, bytes = payload.len(), "message sent");

    for _ in 0..args.wait {
        match conn.pop_message().await {
            Ok(message) => print_message(&message, conn.address(), format),
            Err(err) => {
                let _ = conn.shutdown().await;
                return Err(connection_error("receive failed", err));
            }
        }
    }

    conn.shutdown()
        .await
        .map_err(|err| connection_error("close failed", err))?;
    Ok(SUCCESS)
}

fn resolve_payload(args: &SendArgs) -> CliResult<Vec<u8>> {
    if let Some(json) = &args.json {
        serde_json::from_str::<serde_json::Value>(json)
            .map_err(|err| CliError::new(USAGE, format!("--json is not valid JSON: {err}")))?;
        return Ok(json.as_bytes().to_vec());
    }
    if let Some(data) = &args.data {
        return Ok(data.as_bytes().to_vec());
    }
    if let Some(path) = &args.file {
        return fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
    }
    Ok(Vec::new())
}
