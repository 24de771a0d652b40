//! Command handlers, one module per command group.

pub mod config_cmd;
pub mod connect;
pub mod robot;
pub mod scan;
pub mod schedule;
pub mod util;

use vacbot_core::{RobotClient, RobotCommand};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Route a robot command to its handler.
pub async fn dispatch(
    cmd: Command,
    client: &RobotClient,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Scan(_) => scan::handle(client, global).await,
        Command::Connect(args) => connect::handle(client, args, global).await,
        Command::Forget => connect::forget(client, global).await,
        Command::Status => robot::status(client, global).await,
        Command::Start => robot::command(client, RobotCommand::Start, global).await,
        Command::Stop => robot::command(client, RobotCommand::Stop, global).await,
        Command::Dock => robot::command(client, RobotCommand::Dock, global).await,
        Command::Schedule(args) => schedule::handle(client, args, global).await,
        Command::Map => robot::map(client, global).await,
        Command::Config(_) | Command::Completions(_) => {
            unreachable!("config and completions are handled before dispatch")
        }
    }
}
