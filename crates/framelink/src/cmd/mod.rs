use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use framelink_client::{CancellationToken, ConnectionConfig, DEFAULT_MAX_MESSAGE_SIZE};

use crate::exit::{connection_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod listen;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send one message and optionally wait for responses.
    Send(SendArgs),
    /// Print every message the peer sends until it closes the connection.
    Listen(ListenArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub async fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Send(args) => send::run(args, format).await,
        Command::Listen(args) => listen::run(args, format).await,
        Command::Version(args) => version::run(args),
    }
}

/// Options shared by every command that opens a connection.
#[derive(Args, Debug, Clone)]
pub struct ConnectArgs {
    /// Remote address (`host:port`, or a socket path with --unix).
    #[arg(env = "FRAMELINK_ADDR")]
    pub address: String,
    /// Treat the address as a Unix domain socket path.
    #[arg(long)]
    pub unix: bool,
    /// Maximum wait for each inbound message (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s", env = "FRAMELINK_POP_TIMEOUT")]
    pub pop_timeout: String,
    /// Read buffer size in bytes; bounds a single inbound message.
    #[arg(long, default_value_t = DEFAULT_MAX_MESSAGE_SIZE, env = "FRAMELINK_MAX_MESSAGE_SIZE")]
    pub max_message_size: usize,
    /// Dial timeout (e.g. 2s). Default: no limit beyond the OS.
    #[arg(long)]
    pub connect_timeout: Option<String>,
}

impl ConnectArgs {
    pub fn config(&self) -> CliResult<ConnectionConfig> {
        let mut config = ConnectionConfig::new(self.address.clone())
            .with_pop_timeout(parse_duration(&self.pop_timeout)?)
            .with_max_message_size(self.max_message_size);
        if let Some(raw) = &self.connect_timeout {
            config = config.with_connect_timeout(parse_duration(raw)?);
        }
        config
            .validate()
            .map_err(|err| connection_error("invalid options", err))?;
        Ok(config)
    }
}

#[derive(Args, Debug)]
pub struct SendArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
    /// Operation code.
    #[arg(long, short = 'o', default_value_t = 0)]
    pub opcode: u32,
    /// Clear the success flag on the outgoing message.
    #[arg(long)]
    pub fail: bool,
    /// JSON payload.
    #[arg(long, conflicts_with_all = ["data", "file"])]
    pub json: Option<String>,
    /// Raw string payload.
    #[arg(long, conflicts_with_all = ["json", "file"])]
    pub data: Option<String>,
    /// Read payload from file.
    #[arg(long, conflicts_with_all = ["json", "data"])]
    pub file: Option<PathBuf>,
    /// Number of response messages to wait for and print.
    #[arg(long, default_value_t = 0)]
    pub wait: usize,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
    /// Exit after receiving N messages.
    #[arg(long)]
    pub count: Option<usize>,
    /// Exit when no message arrives within the pop timeout.
    #[arg(long)]
    pub idle_exit: bool,
    /// Print each socket read as-is instead of decoding it.
    #[arg(long)]
    pub passthrough: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Cancellation token fired by Ctrl-C.
pub fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received; cancelling");
            trigger.cancel();
        }
    });
    cancel
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;
    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}
