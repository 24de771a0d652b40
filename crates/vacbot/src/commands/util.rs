//! Shared helpers for command handlers.

use std::io::IsTerminal;

use vacbot_core::RobotClient;

use crate::error::CliError;

/// Reopen the remembered connection before talking to the robot.
///
/// With no remembered connection this succeeds and the robot call itself
/// reports `NoConnection`.
pub async fn reconnect_saved(client: &RobotClient) -> Result<(), CliError> {
    client.restore().await?;
    Ok(())
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}
