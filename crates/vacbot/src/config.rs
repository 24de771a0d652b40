//! CLI-side configuration: layer global flags over the shared config file
//! and build the `RobotClient`.

use std::sync::Arc;
use std::time::Duration;

use clap::ValueEnum;
use tracing::debug;
use vacbot_config::{Config, FileStorage};
use vacbot_core::{ClientConfig, RobotClient};

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;

/// Fill `--output` / `--color` from `[defaults]` when not given on the
/// command line. Unknown values in the file fall back to the built-ins.
pub fn apply_defaults(global: &mut GlobalOpts, cfg: &Config) {
    if global.output.is_none() {
        global.output = OutputFormat::from_str(&cfg.defaults.output, true).ok();
    }
    if global.color.is_none() {
        global.color = ColorMode::from_str(&cfg.defaults.color, true).ok();
    }
}

/// Resolve the core's runtime configuration from file, env and flags.
pub fn client_config(cfg: &Config, global: &GlobalOpts, scan_secs: Option<u64>) -> ClientConfig {
    let mut client = cfg.to_client_config();
    if global.simulate {
        client.simulate = true;
    }
    if let Some(secs) = global.timeout.filter(|s| *s > 0) {
        client.http_timeout = Duration::from_secs(secs);
        client.ble_timeouts.operation = Duration::from_secs(secs);
    }
    if let Some(secs) = scan_secs {
        client.scan.duration = Duration::from_secs(secs);
    }
    client
}

/// Build the client over file-backed storage. Does not connect.
pub fn open_client(
    cfg: &Config,
    global: &GlobalOpts,
    scan_secs: Option<u64>,
) -> Result<RobotClient, CliError> {
    let client_config = client_config(cfg, global, scan_secs);
    let dir = cfg.storage_dir();
    std::fs::create_dir_all(&dir)?;
    debug!(
        storage = %dir.display(),
        simulate = client_config.simulate,
        "opening robot client"
    );
    Ok(RobotClient::new(client_config, Arc::new(FileStorage::new(dir))))
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["vacbot"];
        argv.extend_from_slice(args);
        argv.push("status");
        Cli::parse_from(argv).global
    }

    #[test]
    fn flags_override_file_settings() {
        let cfg = Config::default();
        let client = client_config(&cfg, &global(&["--simulate", "--timeout", "2"]), Some(3));
        assert!(client.simulate);
        assert_eq!(client.http_timeout, Duration::from_secs(2));
        assert_eq!(client.ble_timeouts.operation, Duration::from_secs(2));
        assert_eq!(client.scan.duration, Duration::from_secs(3));
        assert_eq!(client.ble_timeouts.connect, Duration::from_secs(15));
    }

    #[test]
    fn config_defaults_fill_missing_flags() {
        let mut cfg = Config::default();
        cfg.defaults.output = "yaml".into();
        cfg.defaults.color = "bogus".into();

        let mut opts = global(&[]);
        apply_defaults(&mut opts, &cfg);
        assert_eq!(opts.output, Some(OutputFormat::Yaml));
        assert_eq!(opts.color, None);

        let mut explicit = global(&["-o", "json"]);
        apply_defaults(&mut explicit, &cfg);
        assert_eq!(explicit.output, Some(OutputFormat::Json));
    }
}
