//! Status, motion commands and the floor map.

use chrono::Local;
use serde_json::Value;
use vacbot_core::{ConnectionPreference, ConnectionState, RobotClient, RobotCommand, RobotStatus};

use crate::cli::GlobalOpts;
use crate::commands::util;
use crate::error::CliError;
use crate::output;

// ── Status ───────────────────────────────────────────────────────────

fn status_detail(
    status: &RobotStatus,
    preference: &ConnectionPreference,
    state: ConnectionState,
    color: bool,
) -> String {
    let connection = if preference.is_none() {
        output::dim("not configured", color)
    } else {
        format!("{preference} ({})", output::state_label(state))
    };
    let last_cleaned = status.last_cleaned.map_or_else(
        || output::dim("never", color),
        |at| at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
    );
    let errors = if status.errors.is_empty() {
        output::dim("none", color)
    } else {
        status.errors.join("; ")
    };

    output::detail_lines(&[
        ("Robot", output::paint_connectivity(status, color)),
        ("Connection", connection),
        ("Battery", output::paint_battery(status.battery_level, color)),
        ("Cleaning", if status.is_cleaning { "yes" } else { "no" }.to_owned()),
        ("Last cleaned", last_cleaned),
        ("Errors", errors),
    ])
}

/// Always prints a status. An unreachable robot shows the last known
/// values marked offline.
pub async fn status(client: &RobotClient, global: &GlobalOpts) -> Result<(), CliError> {
    if let Err(e) = client.restore().await {
        tracing::debug!(error = %e, "showing cached status");
    }
    let status = client.status().await;
    let preference = client.preference().await;
    let state = client.connection_state();
    let color = output::should_color(global.color);

    let out = output::render_single(
        output::format_of(global),
        &status,
        |s| status_detail(s, &preference, state, color),
        |s| format!("{} {}", s.connectivity_state, s.battery_level),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Commands ─────────────────────────────────────────────────────────

pub async fn command(
    client: &RobotClient,
    command: RobotCommand,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    util::reconnect_saved(client).await?;
    client.command(command).await?;
    if !global.quiet {
        eprintln!(
            "{}",
            match command {
                RobotCommand::Start => "Cleaning started",
                RobotCommand::Stop => "Cleaning stopped",
                RobotCommand::Dock => "Returning to dock",
            }
        );
    }
    Ok(())
}

// ── Map ──────────────────────────────────────────────────────────────

fn describe(value: &Value) -> String {
    match value {
        Value::Array(items) => format!("{} items", items.len()),
        Value::Object(fields) => format!("{} fields", fields.len()),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn map_summary(map: &Value) -> String {
    let rows: Vec<(&str, String)> = map
        .as_object()
        .map(|fields| fields.iter().map(|(k, v)| (k.as_str(), describe(v))).collect())
        .unwrap_or_default();
    if rows.is_empty() {
        return "Map is empty".into();
    }
    output::detail_lines(&rows)
}

pub async fn map(client: &RobotClient, global: &GlobalOpts) -> Result<(), CliError> {
    util::reconnect_saved(client).await?;
    let map = client.get_map().await?.into_value();

    let out = output::render_single(output::format_of(global), &map, map_summary, Value::to_string)?;
    output::print_output(&out, global.quiet);
    Ok(())
}
