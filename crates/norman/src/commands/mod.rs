//! Command dispatch: bridges CLI args -> core operations -> output formatting.

pub mod check;
pub mod config_cmd;
pub mod cover;
pub mod devices;
pub mod watch;

use norman_core::HubConfig;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a hub-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    config: HubConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Check => check::handle(config, global).await,
        Command::Devices(args) => devices::handle(config, args, global).await,
        Command::Cover(args) => cover::handle(config, args, global).await,
        Command::Watch(args) => watch::handle(config, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
