use clap::{Parser, Subcommand};

mod commands;
mod output;
mod tty;

use commands::{check, copy_metadata, delete, notify, s5_commands, symlinks};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "upload-utils")]
#[command(version = VERSION)]
#[command(about = "Batch jobs that prepare, verify, and clean up staged data around S3 uploads")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan modality sources for broken symlinks
    CheckDirectories(check::CheckDirectoriesArgs),
    /// Check that the metadata JSON files are present and parse
    CheckMetadata(check::CheckMetadataArgs),
    /// Copy known metadata JSON files to another folder
    CopyMetadata(copy_metadata::CopyMetadataArgs),
    /// Write s5cmd copy commands for a staging folder
    #[command(name = "create-s5-commands")]
    CreateS5Commands(s5_commands::CreateS5CommandsArgs),
    /// Symlink a folder, or the files of one chunk, into an output folder
    CreateSymLinks(symlinks::CreateSymLinksArgs),
    /// Remove a staging folder under the Airflow staging root
    DeleteStagingFolder(delete::DeleteArgs),
    /// Remove folders under the staging or scratch roots
    DeleteFolders(delete::DeleteArgs),
    /// Remove the modality source folders of an upload
    DeleteSourceFolders(delete::DeleteArgs),
    /// Notify capsule owners, excluding CSV rows by number
    CleanupNotification(notify::NotifyArgs),
    /// Notify capsule owners, excluding users or capsules listed locally or in S3
    TriggerCleanupNotification(notify::NotifyArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let (json_result, exit_code) = commands::run_json(cli.command);
    if let Err(err) = output::print_json_result(json_result) {
        eprintln!("{}", err);
    }

    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn job_settings_and_flags_parse() {
        let cli = Cli::try_parse_from([
            "upload-utils",
            "delete-folders",
            "-j",
            r#"{"directories": ["/allen/aind/scratch/a/b"]}"#,
            "--",
            "--dry_run",
            "true",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::DeleteFolders(_)));
    }

    #[test]
    fn subcommand_names_are_kebab_case() {
        let names: Vec<String> = Cli::command()
            .get_subcommands()
            .map(|c| c.get_name().to_string())
            .collect();
        assert!(names.contains(&"create-s5-commands".to_string()));
        assert!(names.contains(&"create-sym-links".to_string()));
        assert!(names.contains(&"trigger-cleanup-notification".to_string()));
    }

    #[test]
    fn exit_codes_are_clamped() {
        assert_eq!(exit_code_to_u8(-1), 0);
        assert_eq!(exit_code_to_u8(20), 20);
        assert_eq!(exit_code_to_u8(300), 255);
    }
}
