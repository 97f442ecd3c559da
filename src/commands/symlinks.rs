use clap::Args;
use serde::Serialize;

use upload_utils::symlinks::{self, SymLinksReport, SymLinksSettings};

use super::{load_settings, CmdResult, JobArgs};

#[derive(Args)]
pub struct CreateSymLinksArgs {
    #[command(flatten)]
    job: JobArgs,
}

#[derive(Serialize)]
pub struct CreateSymLinksOutput {
    command: &'static str,
    dry_run: bool,
    #[serde(flatten)]
    report: SymLinksReport,
}

pub fn run_json(args: CreateSymLinksArgs) -> CmdResult<CreateSymLinksOutput> {
    let settings: SymLinksSettings = load_settings(&args.job)?;
    let report = symlinks::run(&settings)?;

    upload_utils::log_status!(
        "links",
        "{} linked, {} skipped, {} planned",
        report.linked,
        report.skipped,
        report.planned
    );

    Ok((
        CreateSymLinksOutput {
            command: "create-sym-links",
            dry_run: settings.dry_run,
            report,
        },
        0,
    ))
}
