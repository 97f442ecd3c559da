//! Copy the recognised metadata JSON files from one folder to another.

use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::paths::{glob_paths, posix};
use crate::settings::JobSettings;

pub const DEFAULT_METADATA_FILES: &[&str] = &[
    "data_description.json",
    "subject.json",
    "procedures.json",
    "processing.json",
    "quality_control.json",
    "instrument.json",
    "rig.json",
    "acquisition.json",
    "session.json",
];

fn default_possible_files() -> BTreeSet<String> {
    DEFAULT_METADATA_FILES.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyMetadataSettings {
    pub metadata_dir: PathBuf,
    pub output_directory: PathBuf,
    #[serde(default = "default_possible_files")]
    pub possible_files: BTreeSet<String>,
}

impl JobSettings for CopyMetadataSettings {
    const FIELDS: &'static [&'static str] = &["metadata_dir", "output_directory", "possible_files"];
    const TEXT_FIELDS: &'static [&'static str] = &["metadata_dir", "output_directory"];
}

#[derive(Debug, Clone, Serialize)]
pub struct CopyMetadataReport {
    pub output_directory: String,
    pub copied: Vec<String>,
}

/// Names of `*.json` files directly inside `metadata_dir` that are in `possible_files`.
pub fn metadata_files(settings: &CopyMetadataSettings) -> Result<Vec<String>> {
    let pattern = format!("{}/*.json", glob::Pattern::escape(&posix(&settings.metadata_dir)));
    let present: BTreeSet<String> = glob_paths(&pattern)?
        .into_iter()
        .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .collect();

    Ok(settings
        .possible_files
        .intersection(&present)
        .cloned()
        .collect())
}

pub fn run(settings: &CopyMetadataSettings) -> Result<CopyMetadataReport> {
    let files = metadata_files(settings)?;
    log::debug!("metadata_files: {:?}", files);

    for name in &files {
        let src = settings.metadata_dir.join(name);
        let dst = settings.output_directory.join(name);
        fs::copy(&src, &dst).map_err(|e| {
            Error::internal_io(
                e.to_string(),
                Some(format!("copy {} to {}", src.display(), dst.display())),
            )
        })?;
    }

    Ok(CopyMetadataReport {
        output_directory: posix(&settings.output_directory),
        copied: files,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn only_known_json_files_are_copied() {
        let src = tempdir().unwrap();
        let dst = tempdir().unwrap();
        for name in ["subject.json", "rig.json", "notes.json", "subject.txt"] {
            fs::write(src.path().join(name), "{}").unwrap();
        }

        let settings: CopyMetadataSettings = crate::settings::from_value(serde_json::json!({
            "metadata_dir": src.path(),
            "output_directory": dst.path(),
        }))
        .unwrap();

        let report = run(&settings).unwrap();
        assert_eq!(report.copied, vec!["rig.json", "subject.json"]);
        assert!(dst.path().join("subject.json").exists());
        assert!(dst.path().join("rig.json").exists());
        assert!(!dst.path().join("notes.json").exists());
    }

    #[test]
    fn possible_files_can_be_narrowed() {
        let src = tempdir().unwrap();
        let dst = tempdir().unwrap();
        fs::write(src.path().join("subject.json"), "{}").unwrap();
        fs::write(src.path().join("session.json"), "{}").unwrap();

        let settings = CopyMetadataSettings {
            metadata_dir: src.path().to_path_buf(),
            output_directory: dst.path().to_path_buf(),
            possible_files: ["session.json".to_string()].into_iter().collect(),
        };

        let report = run(&settings).unwrap();
        assert_eq!(report.copied, vec!["session.json"]);
        assert!(!dst.path().join("subject.json").exists());
    }

    #[test]
    fn missing_output_directory_is_an_io_error() {
        let src = tempdir().unwrap();
        fs::write(src.path().join("subject.json"), "{}").unwrap();

        let settings = CopyMetadataSettings {
            metadata_dir: src.path().to_path_buf(),
            output_directory: src.path().join("absent"),
            possible_files: default_possible_files(),
        };

        let err = run(&settings).unwrap_err();
        assert_eq!(err.code.as_str(), "internal.io_error");
    }
}
