//! s5cmd command generation for a staging folder.
//!
//! The first few levels of the staging tree are scanned and turned into
//! `cp` commands that s5cmd can run in parallel, e.g.
//!
//! ```text
//! singularity exec docker://peakcom/s5cmd:v2.2.2 /s5cmd --log error run s5_commands.txt
//! ```

use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::paths::{entries_at_depth, posix, trim_trailing_slash};
use crate::settings::{default_num_of_dir_levels, JobSettings};
use crate::utils::{io, validation};

pub const DEFAULT_COMMANDS_FILE_NAME: &str = "s5_commands.txt";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S5CommandsSettings {
    /// S3 bucket and prefix the staging directory is uploaded to.
    pub s3_location: String,
    pub staging_directory: PathBuf,
    /// Files found above this depth get their own command; entries at the
    /// next depth are copied whole.
    #[serde(default = "default_num_of_dir_levels")]
    pub num_of_dir_levels_to_partition: usize,
    /// Defaults to `<staging_directory>/s5_commands.txt`.
    #[serde(default)]
    pub s5_commands_file: Option<PathBuf>,
}

impl JobSettings for S5CommandsSettings {
    const FIELDS: &'static [&'static str] = &[
        "s3_location",
        "staging_directory",
        "num_of_dir_levels_to_partition",
        "s5_commands_file",
    ];
    const TEXT_FIELDS: &'static [&'static str] =
        &["s3_location", "staging_directory", "s5_commands_file"];

    fn finalize(&mut self) -> Result<()> {
        validation::require_non_empty(&self.s3_location, "s3_location", "S3 location is required")?;
        if self.s5_commands_file.is_none() {
            self.s5_commands_file = Some(self.staging_directory.join(DEFAULT_COMMANDS_FILE_NAME));
        }
        Ok(())
    }
}

impl S5CommandsSettings {
    pub fn commands_file(&self) -> PathBuf {
        self.s5_commands_file
            .clone()
            .unwrap_or_else(|| self.staging_directory.join(DEFAULT_COMMANDS_FILE_NAME))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct S5CommandsReport {
    pub commands_file: String,
    pub command_count: usize,
    pub elapsed_seconds: f64,
}

pub struct CommandBuilder<'a> {
    staging_prefix: String,
    s3_prefix: &'a str,
}

impl<'a> CommandBuilder<'a> {
    pub fn new(settings: &'a S5CommandsSettings) -> Self {
        Self {
            staging_prefix: posix(&settings.staging_directory),
            s3_prefix: trim_trailing_slash(&settings.s3_location),
        }
    }

    /// `/stage/ecephys_1/abc` -> `s3://bucket/ecephys_1/abc`
    pub fn map_to_s3(&self, local_path: &str) -> String {
        local_path.replacen(&self.staging_prefix, self.s3_prefix, 1)
    }

    pub fn file_command(&self, file_path: &str) -> String {
        format!("cp \"{}\" \"{}\"", file_path, self.map_to_s3(file_path))
    }

    pub fn directory_command(&self, directory_path: &str) -> String {
        let local_dir = format!("{}/*", trim_trailing_slash(directory_path));
        let s3_dir = format!("{}/", trim_trailing_slash(&self.map_to_s3(directory_path)));
        format!("cp \"{}\" \"{}\"", local_dir, s3_dir)
    }
}

pub fn upload_commands(settings: &S5CommandsSettings) -> Result<Vec<String>> {
    let builder = CommandBuilder::new(settings);
    let levels = settings.num_of_dir_levels_to_partition;
    let mut commands = Vec::new();

    for depth in 1..=levels {
        for entry in entries_at_depth(&settings.staging_directory, depth)? {
            if entry.is_file() {
                commands.push(builder.file_command(&posix(&entry)));
            }
        }
    }

    for entry in entries_at_depth(&settings.staging_directory, levels + 1)? {
        if entry.is_file() {
            commands.push(builder.file_command(&posix(&entry)));
        } else if entry.is_dir() {
            commands.push(builder.directory_command(&posix(&entry)));
        } else {
            return Err(Error::path_possibly_broken(posix(&entry)));
        }
    }

    Ok(commands)
}

pub fn save_commands(commands: &[String], path: &Path) -> Result<()> {
    io::write_lines(path, commands, &format!("write s5 commands to {}", path.display()))
}

pub fn run(settings: &S5CommandsSettings) -> Result<S5CommandsReport> {
    let started = Instant::now();
    let commands = upload_commands(settings)?;
    let commands_file = settings.commands_file();
    save_commands(&commands, &commands_file)?;

    let elapsed = started.elapsed().as_secs_f64();
    log::debug!("Task took {} seconds", elapsed);

    Ok(S5CommandsReport {
        commands_file: posix(&commands_file),
        command_count: commands.len(),
        elapsed_seconds: elapsed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x").unwrap();
    }

    fn settings(staging: &Path, levels: usize) -> S5CommandsSettings {
        crate::settings::from_value(json!({
            "s3_location": "s3://some_bucket/some_prefix/",
            "staging_directory": staging,
            "num_of_dir_levels_to_partition": levels,
        }))
        .unwrap()
    }

    #[test]
    fn commands_file_defaults_into_staging_directory() {
        let job: S5CommandsSettings = crate::settings::from_value(json!({
            "s3_location": "s3://some_bucket/some_prefix",
            "staging_directory": "stage",
        }))
        .unwrap();
        assert_eq!(job.s5_commands_file, Some(PathBuf::from("stage").join("s5_commands.txt")));
        assert_eq!(job.num_of_dir_levels_to_partition, 4);
    }

    #[test]
    fn empty_s3_location_is_rejected() {
        let err = crate::settings::from_value::<S5CommandsSettings>(json!({
            "s3_location": "  ",
            "staging_directory": "stage",
        }))
        .unwrap_err();
        assert_eq!(err.code.as_str(), "validation.invalid_argument");
    }

    #[test]
    fn command_builder_maps_paths_to_s3() {
        let job = settings(Path::new("/stage/ecephys_1/"), 1);
        let builder = CommandBuilder::new(&job);
        assert_eq!(
            builder.file_command("/stage/ecephys_1/ophys/hello.txt"),
            "cp \"/stage/ecephys_1/ophys/hello.txt\" \"s3://some_bucket/some_prefix/ophys/hello.txt\""
        );
        assert_eq!(
            builder.directory_command("/stage/ecephys_1/ophys/sub_dir/"),
            "cp \"/stage/ecephys_1/ophys/sub_dir/*\" \"s3://some_bucket/some_prefix/ophys/sub_dir/\""
        );
    }

    #[test]
    fn files_above_partition_depth_get_own_commands() {
        let dir = tempdir().unwrap();
        let stage = dir.path().join("SmartSPIM_1");
        touch(&stage.join("instrument.json"));
        touch(&stage.join("SmartSPIM/nohup.out"));
        touch(&stage.join("SmartSPIM/Ex_488/471320/tile.tif"));
        touch(&stage.join("SmartSPIM/Ex_488/stack.txt"));
        let root = posix(&stage);

        let commands = upload_commands(&settings(&stage, 2)).unwrap();
        assert_eq!(
            commands,
            vec![
                format!("cp \"{root}/instrument.json\" \"s3://some_bucket/some_prefix/instrument.json\""),
                format!("cp \"{root}/SmartSPIM/nohup.out\" \"s3://some_bucket/some_prefix/SmartSPIM/nohup.out\""),
                format!("cp \"{root}/SmartSPIM/Ex_488/471320/*\" \"s3://some_bucket/some_prefix/SmartSPIM/Ex_488/471320/\""),
                format!("cp \"{root}/SmartSPIM/Ex_488/stack.txt\" \"s3://some_bucket/some_prefix/SmartSPIM/Ex_488/stack.txt\""),
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn broken_entry_at_partition_depth_fails() {
        let dir = tempdir().unwrap();
        let stage = dir.path().join("stage");
        fs::create_dir_all(stage.join("a")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("gone"), stage.join("a/broken")).unwrap();

        let err = upload_commands(&settings(&stage, 1)).unwrap_err();
        assert_eq!(err.code.as_str(), "path.not_found");
        assert!(err.message.starts_with("Possible broken file path: "));
    }

    #[test]
    fn run_writes_one_command_per_line() {
        let dir = tempdir().unwrap();
        let stage = dir.path().join("stage");
        touch(&stage.join("a.txt"));
        touch(&stage.join("sub/b.txt"));

        let report = run(&settings(&stage, 0)).unwrap();
        assert_eq!(report.command_count, 2);

        let written = fs::read_to_string(stage.join("s5_commands.txt")).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(written.ends_with('\n'));
        assert!(lines[1].ends_with("\"s3://some_bucket/some_prefix/sub/\""));
    }
}
