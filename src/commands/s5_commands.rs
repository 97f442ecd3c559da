use clap::Args;
use serde::Serialize;

use upload_utils::s5_commands::{self, S5CommandsReport, S5CommandsSettings};

use super::{load_settings, CmdResult, JobArgs};

#[derive(Args)]
pub struct CreateS5CommandsArgs {
    #[command(flatten)]
    job: JobArgs,
}

#[derive(Serialize)]
pub struct CreateS5CommandsOutput {
    command: &'static str,
    #[serde(flatten)]
    report: S5CommandsReport,
}

pub fn run_json(args: CreateS5CommandsArgs) -> CmdResult<CreateS5CommandsOutput> {
    let settings: S5CommandsSettings = load_settings(&args.job)?;
    let report = s5_commands::run(&settings)?;

    upload_utils::log_status!(
        "s5",
        "Wrote {} commands to {}",
        report.command_count,
        report.commands_file
    );

    Ok((
        CreateS5CommandsOutput {
            command: "create-s5-commands",
            report,
        },
        0,
    ))
}
