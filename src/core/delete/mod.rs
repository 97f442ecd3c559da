//! Guarded, partitioned removal of staging and source folders.
//!
//! A folder is removed bottom-up: the directories found
//! `num_of_dir_levels + 1` levels down are deleted in parallel partitions,
//! then the folder itself. Every path is matched against a hard-coded root
//! pattern first.

pub mod folders;
pub mod sources;
pub mod staging;

pub use folders::{DeleteFoldersReport, DeleteFoldersSettings};
pub use sources::{DeleteSourceFoldersReport, DeleteSourceFoldersSettings, DirectoriesToDeleteConfigs};
pub use staging::{DeleteStagingFolderReport, DeleteStagingFolderSettings};

use std::fs;
use std::path::Path;

use regex::Regex;

use crate::error::{Error, Result};
use crate::partition::run_partitioned;
use crate::paths::{entries_at_depth, posix};

pub const STAGING_PATTERN: &str = r"^/allen/aind/stage/svc_aind_airflow/(?:prod|dev)/.*";

pub const STAGING_OR_SCRATCH_PATTERN: &str =
    r"^/allen/aind/stage/svc_aind_airflow/(?:prod|dev)/.+|^/allen/aind/scratch/.+/.+";

/// Paths outside the allowed roots are never removed.
#[derive(Debug, Clone)]
pub struct DeletionGuard {
    pattern: Regex,
}

impl DeletionGuard {
    fn new(pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern)
            .map_err(|e| Error::internal_unexpected(format!("Invalid deletion pattern: {}", e)))?;
        Ok(Self { pattern })
    }

    /// Anything below the Airflow staging roots.
    pub fn staging() -> Result<Self> {
        Self::new(STAGING_PATTERN)
    }

    /// Subfolders of the Airflow staging roots or two levels into scratch.
    pub fn staging_or_scratch() -> Result<Self> {
        Self::new(STAGING_OR_SCRATCH_PATTERN)
    }

    #[cfg(test)]
    pub(crate) fn allowing(root: &Path) -> Self {
        let pattern = format!("^{}/.+", regex::escape(&posix(root)));
        Self::new(&pattern).unwrap()
    }

    pub fn allows(&self, directory: &str) -> bool {
        self.pattern.is_match(directory)
    }

    pub fn check(&self, directory: &str) -> Result<()> {
        if self.allows(directory) {
            Ok(())
        } else {
            Err(Error::deletion_outside_allowed_root(
                directory,
                self.pattern.as_str(),
            ))
        }
    }
}

/// Shared removal behaviour of the delete jobs.
#[derive(Debug, Clone)]
pub struct FolderRemover {
    guard: DeletionGuard,
    num_of_dir_levels: usize,
    n_partitions: usize,
    dry_run: bool,
}

impl FolderRemover {
    pub fn new(guard: DeletionGuard, num_of_dir_levels: usize, n_partitions: usize, dry_run: bool) -> Self {
        Self {
            guard,
            num_of_dir_levels,
            n_partitions,
            dry_run,
        }
    }

    /// Entries exactly `num_of_dir_levels + 1` below `folder` that resolve to directories.
    pub fn sub_directories(&self, folder: &Path) -> Result<Vec<String>> {
        Ok(entries_at_depth(folder, self.num_of_dir_levels + 1)?
            .into_iter()
            .filter(|p| p.is_dir())
            .map(|p| posix(&p))
            .collect())
    }

    pub fn remove_directory(&self, directory: &str) -> Result<()> {
        self.guard.check(directory)?;
        if self.dry_run {
            log::info!("Removing: {}", directory);
            return Ok(());
        }
        fs::remove_dir_all(directory).map_err(|e| {
            Error::internal_io(e.to_string(), Some(format!("remove {}", directory)))
        })
    }

    fn remove_directory_list(&self, directories: &[String]) -> Result<()> {
        log::debug!("Removing list: {:?}", directories);
        let total = directories.len();
        for (counter, directory) in directories.iter().enumerate() {
            log::debug!("Removing {}. On {} of {}", directory, counter + 1, total);
            self.remove_directory(directory)?;
        }
        Ok(())
    }

    pub fn remove_sub_directories(&self, sub_directories: &[String]) -> Result<()> {
        run_partitioned(sub_directories, self.n_partitions, |chunk| {
            self.remove_directory_list(chunk)
        })
    }

    /// Remove the deep subdirectories in parallel, then `folder` itself.
    /// Returns the posix form of `folder`.
    pub fn remove_tree(&self, folder: &Path) -> Result<String> {
        let sub_directories = self.sub_directories(folder)?;
        self.remove_sub_directories(&sub_directories)?;
        let folder = posix(folder);
        self.remove_directory(&folder)?;
        Ok(folder)
    }
}
