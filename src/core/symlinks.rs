//! Symlink a directory, or the files of one acquisition chunk, into an output folder.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::paths::{self, posix};
use crate::settings::{lenient_string, JobSettings};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymLinksSettings {
    #[serde(alias = "input_directory")]
    pub input_source: PathBuf,
    pub output_directory: PathBuf,
    /// Only link files whose name contains this string.
    #[serde(default, deserialize_with = "lenient_string")]
    pub chunk: Option<String>,
    #[serde(default)]
    pub dry_run: bool,
}

impl JobSettings for SymLinksSettings {
    const FIELDS: &'static [&'static str] = &["input_source", "output_directory", "chunk", "dry_run"];
    const TEXT_FIELDS: &'static [&'static str] =
        &["input_source", "input_directory", "output_directory", "chunk"];
    const DEFAULT_LOG_LEVEL: &'static str = "INFO";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkOutcome {
    Linked,
    Skipped,
    Planned,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SymLinksReport {
    pub linked: usize,
    pub skipped: usize,
    pub planned: usize,
}

impl SymLinksReport {
    fn record(&mut self, outcome: LinkOutcome) {
        match outcome {
            LinkOutcome::Linked => self.linked += 1,
            LinkOutcome::Skipped => self.skipped += 1,
            LinkOutcome::Planned => self.planned += 1,
        }
    }
}

#[cfg(unix)]
fn symlink(src: &Path, dst: &Path, _target_is_directory: bool) -> std::io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

#[cfg(windows)]
fn symlink(src: &Path, dst: &Path, target_is_directory: bool) -> std::io::Result<()> {
    if target_is_directory {
        std::os::windows::fs::symlink_dir(src, dst)
    } else {
        std::os::windows::fs::symlink_file(src, dst)
    }
}

fn link_error(e: std::io::Error, src: &Path, dst: &Path) -> Error {
    Error::internal_io(
        e.to_string(),
        Some(format!("symlink {} to {}", src.display(), dst.display())),
    )
}

/// Link `dst` to `src`, never replacing anything already at `dst`.
pub fn create_sym_link(src: &Path, dst: &Path, dry_run: bool) -> Result<LinkOutcome> {
    if paths::occupied(dst) {
        log::warn!("Destination {} exists! Will skip linking.", dst.display());
        return Ok(LinkOutcome::Skipped);
    }

    let is_dir = src.is_dir();
    match (is_dir, dry_run) {
        (true, false) => {
            log::debug!("Sym linking {} to {}", src.display(), dst.display());
            symlink(src, dst, true).map_err(|e| link_error(e, src, dst))?;
            Ok(LinkOutcome::Linked)
        }
        (true, true) => {
            log::info!(
                "(dryrun): symlink(src={}, dst={}, target_is_directory=true)",
                src.display(),
                dst.display()
            );
            Ok(LinkOutcome::Planned)
        }
        (false, false) => {
            log::debug!("Sym linking {} to {}", src.display(), dst.display());
            if let Some(parent) = dst.parent() {
                fs::create_dir_all(parent).map_err(|e| {
                    Error::internal_io(e.to_string(), Some(format!("create {}", parent.display())))
                })?;
            }
            symlink(src, dst, false).map_err(|e| link_error(e, src, dst))?;
            Ok(LinkOutcome::Linked)
        }
        (false, true) => {
            let parent = dst.parent().map(|p| p.display().to_string()).unwrap_or_default();
            log::info!("(dryrun): create_dir_all({})", parent);
            log::info!(
                "(dryrun): symlink(src={}, dst={}, target_is_directory=false)",
                src.display(),
                dst.display()
            );
            Ok(LinkOutcome::Planned)
        }
    }
}

/// Paths to link: the input itself, or every file below it matching the chunk.
pub fn paths_to_link(settings: &SymLinksSettings) -> Result<Vec<PathBuf>> {
    log::debug!("Extracting list of files");
    let Some(chunk) = settings.chunk.as_deref() else {
        return Ok(vec![settings.input_source.clone()]);
    };

    let pattern = format!(
        "{}/**/*{}*",
        glob::Pattern::escape(&posix(&settings.input_source)),
        glob::Pattern::escape(chunk)
    );
    Ok(paths::glob_paths(&pattern)?
        .into_iter()
        .filter(|p| p.is_file() || paths::is_symlink(p))
        .collect())
}

/// Where `path` gets linked inside the output directory.
pub fn destination_for(settings: &SymLinksSettings, path: &Path) -> PathBuf {
    if path.is_dir() {
        return settings.output_directory.clone();
    }
    match path.strip_prefix(&settings.input_source) {
        Ok(relative) if !relative.as_os_str().is_empty() => settings.output_directory.join(relative),
        _ => match path.file_name() {
            Some(name) => settings.output_directory.join(name),
            None => settings.output_directory.clone(),
        },
    }
}

pub fn run(settings: &SymLinksSettings) -> Result<SymLinksReport> {
    log::debug!("Running job with settings {:?}", settings);
    let mut report = SymLinksReport::default();

    for path in paths_to_link(settings)? {
        let dst = destination_for(settings, &path);
        report.record(create_sym_link(&path, &dst, settings.dry_run)?);
    }

    log::debug!("Finished job.");
    Ok(report)
}
