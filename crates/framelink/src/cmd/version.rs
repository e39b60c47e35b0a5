use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    println!("framelink {}", env!("CARGO_PKG_VERSION"));
    if !args.extended {
        return Ok(SUCCESS);
    }

    println!(
        "target: {}",
        option_env!("FRAMELINK_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "transports: tcp{}",
        if cfg!(unix) { ", unix-domain-socket" } else { "" }
    );
    println!(
        "defaults: max_message_size={} pop_timeout={:?}",
        framelink_client::DEFAULT_MAX_MESSAGE_SIZE,
        framelink_client::DEFAULT_POP_TIMEOUT
    );

    Ok(SUCCESS)
}
