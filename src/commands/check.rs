use clap::Args;
use serde::Serialize;

use upload_utils::check_directories::{self, CheckDirectoriesReport, CheckDirectoriesSettings};
use upload_utils::check_metadata::{self, CheckMetadataReport, CheckMetadataSettings};

use super::{load_settings, CmdResult, JobArgs};

#[derive(Args)]
pub struct CheckDirectoriesArgs {
    #[command(flatten)]
    job: JobArgs,
}

#[derive(Args)]
pub struct CheckMetadataArgs {
    #[command(flatten)]
    job: JobArgs,
}

#[derive(Serialize)]
pub struct CheckDirectoriesOutput {
    command: &'static str,
    #[serde(flatten)]
    report: CheckDirectoriesReport,
}

#[derive(Serialize)]
pub struct CheckMetadataOutput {
    command: &'static str,
    #[serde(flatten)]
    report: CheckMetadataReport,
}

pub fn run_directories(args: CheckDirectoriesArgs) -> CmdResult<CheckDirectoriesOutput> {
    let settings: CheckDirectoriesSettings = load_settings(&args.job)?;
    let report = check_directories::run(&settings)?;

    upload_utils::log_status!(
        "check",
        "Checked {} files in {} directories",
        report.files_checked,
        report.directories_scanned
    );

    Ok((
        CheckDirectoriesOutput {
            command: "check-directories",
            report,
        },
        0,
    ))
}

pub fn run_metadata(args: CheckMetadataArgs) -> CmdResult<CheckMetadataOutput> {
    let settings: CheckMetadataSettings = load_settings(&args.job)?;
    let report = check_metadata::run(&settings)?;

    if !report.passed {
        upload_utils::log_status!("check", "Metadata problems found in {} (dry run)", report.metadata_dir);
    }

    Ok((
        CheckMetadataOutput {
            command: "check-metadata",
            report,
        },
        0,
    ))
}
