use std::path::PathBuf;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use super::{DeletionGuard, FolderRemover};
use crate::error::Result;
use crate::settings::{default_n_partitions, default_num_of_dir_levels, JobSettings};
use crate::utils::validation;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteFoldersSettings {
    /// Folder(s) to delete.
    pub directories: Vec<PathBuf>,
    #[serde(default = "default_num_of_dir_levels")]
    pub num_of_dir_levels: usize,
    #[serde(default = "default_n_partitions")]
    pub n_partitions: usize,
    #[serde(default)]
    pub dry_run: bool,
}

impl JobSettings for DeleteFoldersSettings {
    const FIELDS: &'static [&'static str] =
        &["directories", "num_of_dir_levels", "n_partitions", "dry_run"];

    fn finalize(&mut self) -> Result<()> {
        validation::require_non_empty_vec(
            &self.directories,
            "directories",
            "At least one folder to delete is required",
        )?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteFoldersReport {
    pub removed: Vec<String>,
    pub dry_run: bool,
    pub elapsed_seconds: f64,
}

pub fn run(settings: &DeleteFoldersSettings) -> Result<DeleteFoldersReport> {
    run_with_guard(settings, DeletionGuard::staging_or_scratch()?)
}

pub(crate) fn run_with_guard(
    settings: &DeleteFoldersSettings,
    guard: DeletionGuard,
) -> Result<DeleteFoldersReport> {
    let started = Instant::now();
    let remover = FolderRemover::new(
        guard,
        settings.num_of_dir_levels,
        settings.n_partitions,
        settings.dry_run,
    );

    let mut removed = Vec::with_capacity(settings.directories.len());
    for folder in &settings.directories {
        removed.push(remover.remove_tree(folder)?);
    }

    let elapsed = started.elapsed().as_secs_f64();
    log::debug!("Task took {} seconds", elapsed);

    Ok(DeleteFoldersReport {
        removed,
        dry_run: settings.dry_run,
        elapsed_seconds: elapsed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x").unwrap();
    }

    #[test]
    fn empty_directory_list_is_rejected() {
        let err = crate::settings::from_value::<DeleteFoldersSettings>(json!({"directories": []}))
            .unwrap_err();
        assert_eq!(err.code.as_str(), "validation.invalid_argument");
    }

    #[test]
    fn each_folder_is_removed_in_order() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("behavior_1");
        let second = dir.path().join("behavior_2");
        touch(&first.join("videos/cam/frame.png"));
        touch(&second.join("data.csv"));
        let job: DeleteFoldersSettings = crate::settings::from_value(json!({
            "directories": [first, second],
            "num_of_dir_levels": 1,
        }))
        .unwrap();

        let report = run_with_guard(&job, DeletionGuard::allowing(dir.path())).unwrap();
        assert_eq!(
            report.removed,
            vec![crate::paths::posix(&first), crate::paths::posix(&second)]
        );
        assert!(!first.exists());
        assert!(!second.exists());
    }

    #[test]
    fn refusal_stops_before_later_folders() {
        let dir = tempdir().unwrap();
        let later = dir.path().join("later");
        touch(&later.join("data.csv"));
        let job = DeleteFoldersSettings {
            directories: vec![PathBuf::from("/something/else/here"), later.clone()],
            num_of_dir_levels: 4,
            n_partitions: 20,
            dry_run: false,
        };

        let err = run_with_guard(&job, DeletionGuard::allowing(dir.path())).unwrap_err();
        assert_eq!(err.code.as_str(), "deletion.outside_allowed_root");
        assert!(later.exists());
    }
}
