//! `vacbot schedule list|add`.

use tabled::Tabled;
use vacbot_core::{RobotClient, ScheduleEntry};

use crate::cli::{GlobalOpts, ScheduleArgs, ScheduleCommand};
use crate::commands::util;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct ScheduleRow {
    #[tabled(rename = "Day")]
    day: String,
    #[tabled(rename = "Time")]
    time: String,
}

impl From<&ScheduleEntry> for ScheduleRow {
    fn from(e: &ScheduleEntry) -> Self {
        Self {
            day: e.weekday().map_or_else(|| e.day.clone(), |d| d.to_string()),
            time: e.time.clone(),
        }
    }
}

pub async fn handle(
    client: &RobotClient,
    args: ScheduleArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    util::reconnect_saved(client).await?;

    match args.command {
        ScheduleCommand::List => {
            let entries = client.get_schedule().await?;
            let out = output::render_list(
                output::format_of(global),
                &entries,
                |e| ScheduleRow::from(e),
                |e| format!("{} {}", e.day, e.time),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ScheduleCommand::Add { day, time } => {
            let entry = ScheduleEntry::new(day.trim(), time.trim());
            client.set_schedule(entry.clone()).await?;
            if !global.quiet {
                eprintln!("Scheduled cleaning on {} at {}", entry.day, entry.time);
            }
            Ok(())
        }
    }
}
