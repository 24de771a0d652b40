//! `vacbot scan`: one Bluetooth discovery session.

use std::io::IsTerminal;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tabled::Tabled;
use tokio::sync::mpsc;
use vacbot_core::{DiscoveredDevice, RobotClient};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Device ID")]
    id: String,
    #[tabled(rename = "Signal")]
    rssi: String,
}

impl From<&DiscoveredDevice> for DeviceRow {
    fn from(d: &DiscoveredDevice) -> Self {
        Self {
            name: d.display_name().to_owned(),
            id: d.id.clone(),
            rssi: d.rssi.map_or_else(|| "-".into(), |r| format!("{r} dBm")),
        }
    }
}

fn spinner(secs: u64) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(format!("Scanning for robots ({secs}s)..."));
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

pub async fn handle(client: &RobotClient, global: &GlobalOpts) -> Result<(), CliError> {
    let format = output::format_of(global);
    let secs = client.config().scan.duration.as_secs();
    let progress = (!global.quiet && format == OutputFormat::Table && std::io::stderr().is_terminal())
        .then(|| spinner(secs));

    let (tx, mut rx) = mpsc::unbounded_channel();
    let on_found = {
        let progress = progress.clone();
        move |device: DiscoveredDevice| {
            if let Some(pb) = &progress {
                pb.set_message(format!("Found {}", device.display_name()));
            }
            let _ = tx.send(device);
        }
    };

    let handle = client.start_scan(on_found).await?;
    tokio::select! {
        () = handle.finished() => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::debug!("scan interrupted");
            client.stop_scan(&handle).await;
        }
    }

    let mut devices = Vec::new();
    while let Ok(device) = rx.try_recv() {
        devices.push(device);
    }
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    if devices.is_empty() && format == OutputFormat::Table {
        if !global.quiet {
            eprintln!("No robots found. Make sure the robot is awake and in range.");
        }
        return Ok(());
    }

    let out = output::render_list(format, &devices, |d| DeviceRow::from(d), |d| d.id.clone())?;
    output::print_output(&out, global.quiet);
    Ok(())
}
