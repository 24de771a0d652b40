//! Config subcommand handlers.

use vacbot_config::Config;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::commands::util;
use crate::config::apply_defaults;
use crate::error::CliError;
use crate::output;

fn to_toml(cfg: &Config) -> Result<String, CliError> {
    toml::to_string_pretty(cfg).map_err(|e| CliError::Output(e.to_string()))
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&vacbot_config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = vacbot_config::load_config()?;
            let mut global_view = global.clone();
            apply_defaults(&mut global_view, &cfg);

            let toml = to_toml(&cfg)?;
            let out = output::render_single(
                output::format_of(&global_view),
                &cfg,
                |_| toml.trim_end().to_owned(),
                |_| toml.trim_end().to_owned(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Init => {
            let path = vacbot_config::config_path();
            if path.exists()
                && !util::confirm(
                    &format!("Overwrite {}?", path.display()),
                    "config init",
                    global.yes,
                )?
            {
                return Ok(());
            }
            let written = vacbot_config::save_config(&Config::default())?;
            if !global.quiet {
                eprintln!("Wrote default configuration to {}", written.display());
            }
            Ok(())
        }
    }
}
