//! Broken-symlink scan over the sources of an upload job config.
//!
//! Top levels are checked while the directory list is built; the remaining
//! directories are walked in parallel partitions.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{ModalityConfig, Platform};
use crate::partition::run_partitioned;
use crate::paths::{self, check_path, entries_at_depth, posix};
use crate::settings::{default_n_partitions, JobSettings};

/// The part of an upload job config needed to locate its sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoriesToCheckConfigs {
    pub platform: Platform,
    #[serde(default)]
    pub modalities: Vec<ModalityConfig>,
    #[serde(default)]
    pub metadata_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckDirectoriesSettings {
    pub directories_to_check_configs: DirectoriesToCheckConfigs,
    #[serde(default = "default_n_partitions")]
    pub n_partitions: usize,
    #[serde(default = "default_smart_spim_levels")]
    pub num_of_smart_spim_levels: usize,
}

fn default_smart_spim_levels() -> usize {
    3
}

impl JobSettings for CheckDirectoriesSettings {
    const FIELDS: &'static [&'static str] = &[
        "directories_to_check_configs",
        "n_partitions",
        "num_of_smart_spim_levels",
    ];
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckDirectoriesReport {
    pub directories_scanned: usize,
    pub files_checked: usize,
    pub elapsed_seconds: f64,
}

/// Build the list of directories to walk, checking every top-level entry on the way.
pub fn directories_to_check(settings: &CheckDirectoriesSettings) -> Result<Vec<String>> {
    let configs = &settings.directories_to_check_configs;
    let mut directories = Vec::new();

    if let Some(metadata_dir) = &configs.metadata_dir {
        let pattern = format!("{}/*.json", glob::Pattern::escape(&posix(metadata_dir)));
        for json_file in paths::glob_paths(&pattern)? {
            check_path(&json_file)?;
        }
    }

    for modality_config in &configs.modalities {
        let source = &modality_config.source;
        if modality_config.modality.is_spim() && configs.platform.is_smartspim() {
            let levels = settings.num_of_smart_spim_levels;
            for depth in 1..=levels {
                for entry in entries_at_depth(source, depth)? {
                    check_path(&entry)?;
                }
            }
            for entry in entries_at_depth(source, levels + 1)? {
                if entry.is_dir() {
                    directories.push(posix(&entry));
                } else {
                    check_path(&entry)?;
                }
            }
        } else {
            if !source.is_dir() {
                return Err(Error::path_not_found(posix(source))
                    .with_hint("Modality source directories must exist before upload"));
            }
            directories.push(posix(source));
        }
    }

    Ok(directories)
}

/// Walk `directory` without following directory symlinks, checking every non-directory entry.
fn walk_and_check(directory: &Path, files_checked: &AtomicUsize) -> Result<()> {
    let entries = match fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(e) => {
            log::debug!("Skipping unreadable directory {}: {}", directory.display(), e);
            return Ok(());
        }
    };

    for entry in entries {
        let entry = entry.map_err(|e| {
            Error::internal_io(e.to_string(), Some(format!("read {}", directory.display())))
        })?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| {
            Error::internal_io(e.to_string(), Some(format!("stat {}", path.display())))
        })?;

        if file_type.is_dir() {
            walk_and_check(&path, files_checked)?;
        } else if file_type.is_symlink() && path.is_dir() {
            // Linked directories are not followed.
            continue;
        } else {
            files_checked.fetch_add(1, Ordering::Relaxed);
            check_path(&path)?;
        }
    }
    Ok(())
}

fn process_directory_list(directories: &[String], files_checked: &AtomicUsize) -> Result<()> {
    log::debug!("Scanning list: {:?}", directories);
    let total = directories.len();
    for (counter, directory) in directories.iter().enumerate() {
        log::debug!("Checking {}. On {} of {}", directory, counter + 1, total);
        walk_and_check(Path::new(directory), files_checked)?;
    }
    Ok(())
}

/// Scan the directories in parallel partitions. Returns the number of files checked.
pub fn check_for_broken_sym_links(directories: &[String], n_partitions: usize) -> Result<usize> {
    let files_checked = AtomicUsize::new(0);
    run_partitioned(directories, n_partitions, |chunk| {
        process_directory_list(chunk, &files_checked)
    })?;
    Ok(files_checked.into_inner())
}

pub fn run(settings: &CheckDirectoriesSettings) -> Result<CheckDirectoriesReport> {
    let started = Instant::now();
    let directories = directories_to_check(settings)?;
    log::debug!("Total directories to scan: {}", directories.len());

    let files_checked = check_for_broken_sym_links(&directories, settings.n_partitions)?;

    let elapsed = started.elapsed().as_secs_f64();
    log::debug!("Task took {} seconds", elapsed);

    Ok(CheckDirectoriesReport {
        directories_scanned: directories.len(),
        files_checked,
        elapsed_seconds: elapsed,
    })
}
