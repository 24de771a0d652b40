//! Clap derive structures for the `vacbot` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// vacbot -- drive a VacBot floor cleaner over Wi-Fi or Bluetooth LE
#[derive(Debug, Parser)]
#[command(
    name = "vacbot",
    version,
    about = "Control VacBot floor-cleaning robots from the command line",
    long_about = "Connect to a VacBot robot over its local HTTP API or over Bluetooth LE,\n\
        read its status, start and dock it, and manage its cleaning schedule.\n\n\
        The chosen connection is remembered between runs.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Clone, Args)]
pub struct GlobalOpts {
    /// Output format [default: from config, else table]
    #[arg(long, short = 'o', env = "VACBOT_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output [default: from config, else auto]
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Talk to a simulated robot instead of real hardware
    #[arg(long, env = "VACBOT_SIMULATE", global = true)]
    pub simulate: bool,

    /// Per-request timeout in seconds (Wi-Fi requests and BLE operations)
    #[arg(long, env = "VACBOT_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Look for robots advertising over Bluetooth LE
    Scan(ScanArgs),

    /// Choose how to reach the robot and remember the choice
    #[command(alias = "use")]
    Connect(ConnectArgs),

    /// Drop the remembered connection
    Forget,

    /// Show battery, cleaning state and errors
    #[command(alias = "st")]
    Status,

    /// Start a cleaning run
    Start,

    /// Stop the current cleaning run
    Stop,

    /// Send the robot back to its dock
    Dock,

    /// Inspect and extend the cleaning schedule
    #[command(alias = "sched")]
    Schedule(ScheduleArgs),

    /// Print the robot's floor map
    Map,

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Scan ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Scan duration in seconds [default: ble.scan_secs from config]
    #[arg(long, short = 's', value_parser = clap::value_parser!(u64).range(1..=120))]
    pub secs: Option<u64>,
}

// ── Connect ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConnectArgs {
    #[command(subcommand)]
    pub target: ConnectTarget,
}

#[derive(Debug, Subcommand)]
pub enum ConnectTarget {
    /// Reach the robot through its local HTTP API
    Wifi {
        /// Host or host:port, e.g. 192.168.1.40 or vacbot.local:8080
        address: String,
    },

    /// Reach the robot over Bluetooth LE
    Ble {
        /// Device id as printed by `vacbot scan`
        device_id: String,
    },
}

// ── Schedule ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ScheduleArgs {
    #[command(subcommand)]
    pub command: ScheduleCommand,
}

#[derive(Debug, Subcommand)]
pub enum ScheduleCommand {
    /// List scheduled cleaning runs
    #[command(alias = "ls")]
    List,

    /// Add a weekly cleaning run
    Add {
        /// Weekday, full or abbreviated (Monday, tue, ...)
        day: String,

        /// 24-hour time, HH:MM
        time: String,
    },
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a config file with default settings
    Init,

    /// Display current resolved configuration
    Show,

    /// Print the config file path
    Path,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
