//! Presence and JSON-syntax checks for the metadata files of an upload.

use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::paths::posix;
use crate::settings::JobSettings;

pub const REQUIRED_FILES: &[&str] = &["data_description.json", "subject.json", "procedures.json"];

pub const OPTIONAL_FILES: &[&str] = &["processing.json", "quality_control.json"];

/// At least one file of each pair must be present and valid.
pub const EITHER_OR_FILES: &[(&str, &str)] = &[
    ("instrument.json", "rig.json"),
    ("acquisition.json", "session.json"),
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckMetadataSettings {
    pub metadata_dir: PathBuf,
    /// Log validation results without failing the job.
    #[serde(default)]
    pub dry_run: bool,
}

impl JobSettings for CheckMetadataSettings {
    const FIELDS: &'static [&'static str] = &["metadata_dir", "dry_run"];
    const TEXT_FIELDS: &'static [&'static str] = &["metadata_dir"];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Valid,
    Invalid,
    Missing,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileCheck {
    pub file: String,
    pub status: FileStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckMetadataReport {
    pub metadata_dir: String,
    pub files: Vec<FileCheck>,
    pub passed: bool,
}

fn validate_json(path: &Path) -> FileStatus {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            log::error!("Validation failed for {}: {}", path.display(), e);
            return FileStatus::Missing;
        }
    };
    match serde_json::from_str::<serde_json::Value>(&content) {
        Ok(_) => {
            log::debug!("Validated JSON file: {}", path.display());
            FileStatus::Valid
        }
        Err(e) => {
            log::error!("Validation failed for {}: {}", path.display(), e);
            FileStatus::Invalid
        }
    }
}

struct Checker<'a> {
    settings: &'a CheckMetadataSettings,
    files: Vec<FileCheck>,
    passed: bool,
}

impl Checker<'_> {
    fn check(&mut self, name: &str) -> FileStatus {
        let status = validate_json(&self.settings.metadata_dir.join(name));
        self.files.push(FileCheck {
            file: name.to_string(),
            status,
        });
        status
    }

    /// In dry-run mode failures are recorded instead of returned.
    fn fail(&mut self, err: Error) -> Result<()> {
        self.passed = false;
        if self.settings.dry_run {
            log::warn!("{}", err.message);
            Ok(())
        } else {
            Err(err)
        }
    }

    fn metadata_dir(&self) -> String {
        posix(&self.settings.metadata_dir)
    }

    fn check_required_files(&mut self) -> Result<()> {
        for name in REQUIRED_FILES {
            if self.check(name) != FileStatus::Valid {
                let err = Error::metadata_missing(
                    format!("Required file {} is missing or invalid.", name),
                    self.metadata_dir(),
                    vec![name.to_string()],
                );
                self.fail(err)?;
            }
        }
        Ok(())
    }

    fn check_optional_files(&mut self) -> Result<()> {
        for name in OPTIONAL_FILES {
            if !self.settings.metadata_dir.join(name).exists() {
                continue;
            }
            if self.check(name) != FileStatus::Valid {
                let err = Error::metadata_invalid(
                    format!("Optional file {} is invalid.", name),
                    self.metadata_dir(),
                    vec![name.to_string()],
                );
                self.fail(err)?;
            }
        }
        Ok(())
    }

    fn check_either_or_files(&mut self) -> Result<()> {
        for (first, second) in EITHER_OR_FILES {
            let valid = self.check(first) == FileStatus::Valid || self.check(second) == FileStatus::Valid;
            if !valid {
                let err = Error::metadata_missing(
                    format!("None of the files in ({}, {}) exist or are valid.", first, second),
                    self.metadata_dir(),
                    vec![first.to_string(), second.to_string()],
                );
                self.fail(err)?;
            }
        }
        Ok(())
    }
}

pub fn run(settings: &CheckMetadataSettings) -> Result<CheckMetadataReport> {
    let started = Instant::now();
    log::info!("Starting metadata validation job.");

    let mut checker = Checker {
        settings,
        files: Vec::new(),
        passed: true,
    };
    checker.check_required_files()?;
    checker.check_optional_files()?;
    checker.check_either_or_files()?;

    log::info!(
        "Metadata validation completed in {:.2} seconds.",
        started.elapsed().as_secs_f64()
    );

    Ok(CheckMetadataReport {
        metadata_dir: checker.metadata_dir(),
        files: checker.files,
        passed: checker.passed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_all(dir: &Path, names: &[&str]) {
        for name in names {
            fs::write(dir.join(name), "{\"schema_version\": \"1.0\"}").unwrap();
        }
    }

    fn settings(dir: &Path, dry_run: bool) -> CheckMetadataSettings {
        CheckMetadataSettings {
            metadata_dir: dir.to_path_buf(),
            dry_run,
        }
    }

    #[test]
    fn complete_metadata_passes() {
        let dir = tempdir().unwrap();
        write_all(
            dir.path(),
            &["data_description.json", "subject.json", "procedures.json", "rig.json", "session.json"],
        );

        let report = run(&settings(dir.path(), false)).unwrap();
        assert!(report.passed);
        assert!(report.files.iter().all(|f| f.status != FileStatus::Invalid));
    }

    #[test]
    fn missing_required_file_fails() {
        let dir = tempdir().unwrap();
        write_all(dir.path(), &["data_description.json", "procedures.json"]);

        let err = run(&settings(dir.path(), false)).unwrap_err();
        assert_eq!(err.code.as_str(), "metadata.missing");
        assert_eq!(err.message, "Required file subject.json is missing or invalid.");
    }

    #[test]
    fn invalid_optional_file_fails() {
        let dir = tempdir().unwrap();
        write_all(
            dir.path(),
            &["data_description.json", "subject.json", "procedures.json", "instrument.json", "acquisition.json"],
        );
        fs::write(dir.path().join("processing.json"), "{not json").unwrap();

        let err = run(&settings(dir.path(), false)).unwrap_err();
        assert_eq!(err.code.as_str(), "metadata.invalid");
        assert_eq!(err.message, "Optional file processing.json is invalid.");
    }

    #[test]
    fn either_or_pair_needs_one_valid_file() {
        let dir = tempdir().unwrap();
        write_all(
            dir.path(),
            &["data_description.json", "subject.json", "procedures.json", "instrument.json"],
        );

        let err = run(&settings(dir.path(), false)).unwrap_err();
        assert_eq!(err.code.as_str(), "metadata.missing");
        assert_eq!(
            err.message,
            "None of the files in (acquisition.json, session.json) exist or are valid."
        );
    }

    #[test]
    fn dry_run_reports_without_failing() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("subject.json"), "[").unwrap();

        let report = run(&settings(dir.path(), true)).unwrap();
        assert!(!report.passed);
        let subject = report.files.iter().find(|f| f.file == "subject.json").unwrap();
        assert_eq!(subject.status, FileStatus::Invalid);
        let description = report
            .files
            .iter()
            .find(|f| f.file == "data_description.json")
            .unwrap();
        assert_eq!(description.status, FileStatus::Missing);
    }
}
