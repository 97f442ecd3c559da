use clap::Args;
use serde::Serialize;

use upload_utils::delete::{
    folders, sources, staging, DeleteFoldersReport, DeleteFoldersSettings, DeleteSourceFoldersReport,
    DeleteSourceFoldersSettings, DeleteStagingFolderReport, DeleteStagingFolderSettings,
};

use super::{load_settings, CmdResult, JobArgs};

#[derive(Args)]
pub struct DeleteArgs {
    #[command(flatten)]
    job: JobArgs,
}

#[derive(Serialize)]
pub struct DeleteOutput<R: Serialize> {
    command: &'static str,
    #[serde(flatten)]
    report: R,
}

pub fn run_staging_folder(args: DeleteArgs) -> CmdResult<DeleteOutput<DeleteStagingFolderReport>> {
    let settings: DeleteStagingFolderSettings = load_settings(&args.job)?;
    let report = staging::run(&settings)?;

    upload_utils::log_status!("delete", "Removed {}", report.staging_directory);

    Ok((
        DeleteOutput {
            command: "delete-staging-folder",
            report,
        },
        0,
    ))
}

pub fn run_folders(args: DeleteArgs) -> CmdResult<DeleteOutput<DeleteFoldersReport>> {
    let settings: DeleteFoldersSettings = load_settings(&args.job)?;
    let report = folders::run(&settings)?;

    upload_utils::log_status!("delete", "Removed {} folders", report.removed.len());

    Ok((
        DeleteOutput {
            command: "delete-folders",
            report,
        },
        0,
    ))
}

pub fn run_source_folders(args: DeleteArgs) -> CmdResult<DeleteOutput<DeleteSourceFoldersReport>> {
    let settings: DeleteSourceFoldersSettings = load_settings(&args.job)?;
    let report = sources::run(&settings)?;

    upload_utils::log_status!("delete", "Removed {} source folders", report.removed.len());

    Ok((
        DeleteOutput {
            command: "delete-source-folders",
            report,
        },
        0,
    ))
}
