use clap::Args;
use serde::Serialize;

use upload_utils::copy_metadata::{self, CopyMetadataReport, CopyMetadataSettings};

use super::{load_settings, CmdResult, JobArgs};

#[derive(Args)]
pub struct CopyMetadataArgs {
    #[command(flatten)]
    job: JobArgs,
}

#[derive(Serialize)]
pub struct CopyMetadataOutput {
    command: &'static str,
    #[serde(flatten)]
    report: CopyMetadataReport,
}

pub fn run_json(args: CopyMetadataArgs) -> CmdResult<CopyMetadataOutput> {
    let settings: CopyMetadataSettings = load_settings(&args.job)?;
    let report = copy_metadata::run(&settings)?;

    upload_utils::log_status!(
        "copy",
        "Copied {} metadata files to {}",
        report.copied.len(),
        report.output_directory
    );

    Ok((
        CopyMetadataOutput {
            command: "copy-metadata",
            report,
        },
        0,
    ))
}
