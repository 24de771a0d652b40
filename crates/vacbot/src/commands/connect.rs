//! `vacbot connect` and `vacbot forget`.

use vacbot_core::{ConnectionPreference, RobotClient};

use crate::cli::{ConnectArgs, ConnectTarget, GlobalOpts};
use crate::commands::util;
use crate::error::CliError;
use crate::output;

pub async fn handle(
    client: &RobotClient,
    args: ConnectArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let preference = match args.target {
        ConnectTarget::Wifi { address } => ConnectionPreference::wifi(address.trim()),
        ConnectTarget::Ble { device_id } => ConnectionPreference::ble(device_id.trim()),
    };

    client.switch_transport(preference.clone()).await?;

    if !global.quiet {
        let color = output::should_color(global.color);
        match client.cached_status() {
            Some(status) => eprintln!(
                "Connected to {preference} (battery {})",
                output::paint_battery(status.battery_level, color)
            ),
            None => eprintln!("Connected to {preference}"),
        }
    }
    Ok(())
}

pub async fn forget(client: &RobotClient, global: &GlobalOpts) -> Result<(), CliError> {
    let saved = client.saved_preference();
    if saved.is_none() {
        if !global.quiet {
            eprintln!("No robot connection configured");
        }
        return Ok(());
    }

    if !util::confirm(&format!("Forget the connection to {saved}?"), "forget", global.yes)? {
        return Ok(());
    }
    client.forget().await?;
    if !global.quiet {
        eprintln!("Forgot {saved}");
    }
    Ok(())
}
