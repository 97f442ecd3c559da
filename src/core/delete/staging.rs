use std::path::PathBuf;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use super::{DeletionGuard, FolderRemover};
use crate::error::Result;
use crate::settings::{default_n_partitions, default_num_of_dir_levels, JobSettings};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteStagingFolderSettings {
    pub staging_directory: PathBuf,
    #[serde(default = "default_num_of_dir_levels")]
    pub num_of_dir_levels: usize,
    #[serde(default = "default_n_partitions")]
    pub n_partitions: usize,
    /// Log what would be removed without deleting anything.
    #[serde(default)]
    pub dry_run: bool,
}

impl JobSettings for DeleteStagingFolderSettings {
    const FIELDS: &'static [&'static str] =
        &["staging_directory", "num_of_dir_levels", "n_partitions", "dry_run"];
    const TEXT_FIELDS: &'static [&'static str] = &["staging_directory"];
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteStagingFolderReport {
    pub staging_directory: String,
    pub sub_directories_removed: usize,
    pub dry_run: bool,
    pub elapsed_seconds: f64,
}

pub fn run(settings: &DeleteStagingFolderSettings) -> Result<DeleteStagingFolderReport> {
    run_with_guard(settings, DeletionGuard::staging()?)
}

pub(crate) fn run_with_guard(
    settings: &DeleteStagingFolderSettings,
    guard: DeletionGuard,
) -> Result<DeleteStagingFolderReport> {
    let started = Instant::now();
    let remover = FolderRemover::new(
        guard,
        settings.num_of_dir_levels,
        settings.n_partitions,
        settings.dry_run,
    );

    let sub_directories = remover.sub_directories(&settings.staging_directory)?;
    remover.remove_sub_directories(&sub_directories)?;
    let staging_directory = crate::paths::posix(&settings.staging_directory);
    remover.remove_directory(&staging_directory)?;

    let elapsed = started.elapsed().as_secs_f64();
    log::debug!("Task took {} seconds", elapsed);

    Ok(DeleteStagingFolderReport {
        staging_directory,
        sub_directories_removed: sub_directories.len(),
        dry_run: settings.dry_run,
        elapsed_seconds: elapsed,
    })
}
