//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one value per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};
use vacbot_core::{ConnectionState, RobotStatus};

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;

/// The effective output format once config defaults are applied.
pub fn format_of(global: &GlobalOpts) -> OutputFormat {
    global.output.unwrap_or(OutputFormat::Table)
}

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: Option<ColorMode>) -> bool {
    match mode.unwrap_or(ColorMode::Auto) {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

pub fn paint_connectivity(status: &RobotStatus, color: bool) -> String {
    let label = status.connectivity_state.to_string();
    match (color, status.is_online()) {
        (false, _) => label,
        (true, true) => label.green().to_string(),
        (true, false) => label.red().to_string(),
    }
}

pub fn paint_battery(level: u8, color: bool) -> String {
    let label = format!("{level}%");
    if !color {
        return label;
    }
    match level {
        0..=14 => label.red().to_string(),
        15..=39 => label.yellow().to_string(),
        _ => label.green().to_string(),
    }
}

pub fn state_label(state: ConnectionState) -> &'static str {
    match state {
        ConnectionState::NoConnection => "not configured",
        ConnectionState::Testing => "testing",
        ConnectionState::Connected => "connected",
        ConnectionState::Disconnected => "disconnected",
    }
}

pub fn dim(text: &str, color: bool) -> String {
    if color {
        text.dimmed().to_string()
    } else {
        text.to_owned()
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
///
/// - `table`: uses the `Tabled` derive to build a pretty table
/// - `json` / `json-compact`: serializes the original data via serde
/// - `yaml`: serializes via serde_yaml
/// - `plain`: calls `id_fn` on each item to emit one value per line
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Ok(render_table(&rows))
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => Ok(data.iter().map(&id_fn).collect::<Vec<_>>().join("\n")),
    }
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses `detail_fn`, since single-item views are key/value
/// listings rather than tables.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize + ?Sized,
{
    match format {
        OutputFormat::Table => Ok(detail_fn(data)),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => Ok(id_fn(data)),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

/// Key/value lines with the keys padded to a common width.
pub fn detail_lines(rows: &[(&str, String)]) -> String {
    let width = rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0) + 2;
    rows.iter()
        .map(|(k, v)| format!("{k:<width$}{v}"))
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> Result<String, CliError> {
    let rendered = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    rendered.map_err(|e| CliError::Output(e.to_string()))
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    serde_yaml::to_string(data).map_err(|e| CliError::Output(e.to_string()))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use vacbot_core::ScheduleEntry;

    use super::*;

    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "Day")]
        day: String,
    }

    #[test]
    fn plain_list_is_one_value_per_line() {
        let entries = vec![ScheduleEntry::new("Monday", "09:00"), ScheduleEntry::new("Friday", "18:30")];
        let out = render_list(
            OutputFormat::Plain,
            &entries,
            |e| Row { day: e.day.clone() },
            |e| format!("{} {}", e.day, e.time),
        )
        .unwrap();
        assert_eq!(out, "Monday 09:00\nFriday 18:30");
    }

    #[test]
    fn compact_json_uses_wire_names() {
        let out = render_single(
            OutputFormat::JsonCompact,
            &RobotStatus::synthetic(),
            |_| String::new(),
            |_| String::new(),
        )
        .unwrap();
        assert!(out.contains("\"batteryLevel\":0"), "{out}");
        assert!(out.contains("\"connectivityState\":\"Offline\""), "{out}");
    }

    #[test]
    fn detail_lines_align_values() {
        let out = detail_lines(&[("Robot", "online".into()), ("Battery", "87%".into())]);
        assert_eq!(out, "Robot    online\nBattery  87%");
    }

    #[test]
    fn battery_without_color_is_plain() {
        assert_eq!(paint_battery(9, false), "9%");
    }
}
