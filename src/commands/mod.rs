use clap::Args;
use serde_json::{Map, Value};
use std::io::Read;
use std::path::Path;

use upload_utils::settings::{self, JobSettings};

pub type CmdResult<T> = upload_utils::Result<(T, i32)>;

/// Settings arguments shared by every job.
///
/// Settings come from three layers, later ones winning per key: environment
/// variables named after the fields, the `--job-settings` JSON, then
/// trailing `--key value` flags.
///
/// # Combining --job-settings with flags
///
/// When using both, add an explicit `--` separator before the flags:
///
/// ```sh
/// upload-utils delete-folders -j '{"directories": ["/allen/aind/scratch/a/b"]}' -- --dry_run true
/// ```
#[derive(Args, Default, Debug)]
pub struct JobArgs {
    /// Job settings as JSON (inline, @file, or - for stdin)
    #[arg(short = 'j', long = "job-settings", value_name = "JSON")]
    pub job_settings: Option<String>,

    /// Individual settings as --key value pairs (e.g. --dry_run true).
    /// When combined with --job-settings, add '--' separator first.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub extra: Vec<String>,
}

// ============================================================================
// JSON Input Parsing (CLI layer)
// ============================================================================

/// Parse `--key value` and `--key=value` pairs into a JSON object.
fn parse_kv_flags<T: JobSettings>(extra: &[String]) -> upload_utils::Result<Map<String, Value>> {
    let mut obj = Map::new();
    let mut iter = extra.iter();

    while let Some(arg) = iter.next() {
        let Some(flag) = arg.strip_prefix("--") else {
            return Err(upload_utils::Error::validation_invalid_argument(
                "extra",
                format!("Unexpected argument '{}', expected --key value", arg),
                None,
                None,
            ));
        };

        let (key, raw) = match flag.split_once('=') {
            Some((key, raw)) => (key, raw),
            None => {
                let raw = iter.next().ok_or_else(|| {
                    upload_utils::Error::validation_invalid_argument(
                        flag,
                        format!("Missing value for flag --{}", flag),
                        None,
                        None,
                    )
                })?;
                (flag, raw.as_str())
            }
        };
        obj.insert(key.to_string(), settings::parse_field::<T>(key, raw));
    }

    Ok(obj)
}

/// Read JSON spec from string, file (@path), or stdin (-).
fn read_json_spec_to_string(spec: &str) -> upload_utils::Result<String> {
    use std::io::IsTerminal;

    if spec.trim() == "-" {
        let mut buf = String::new();
        let mut stdin = std::io::stdin();
        if stdin.is_terminal() {
            return Err(upload_utils::Error::validation_invalid_argument(
                "job_settings",
                "Cannot read JSON from stdin when stdin is a TTY",
                None,
                None,
            ));
        }
        stdin.read_to_string(&mut buf).map_err(|e| {
            upload_utils::Error::internal_io(e.to_string(), Some("read stdin".to_string()))
        })?;
        return Ok(buf);
    }

    if let Some(path) = spec.strip_prefix('@') {
        if path.trim().is_empty() {
            return Err(upload_utils::Error::validation_invalid_argument(
                "job_settings",
                "Invalid JSON spec '@' (missing file path)",
                None,
                None,
            ));
        }
        return upload_utils::io::read_file(Path::new(path), &format!("read {}", path));
    }

    Ok(spec.to_string())
}

fn parse_json_spec(spec: &str) -> upload_utils::Result<Value> {
    let raw = read_json_spec_to_string(spec)?;
    serde_json::from_str(&raw).map_err(|e| {
        upload_utils::Error::validation_invalid_json(
            e,
            Some("parse job settings".to_string()),
            Some(raw.chars().take(200).collect::<String>()),
        )
    })
}

/// Initialise logging for the job, then merge env, JSON and flag layers into settings.
pub(crate) fn load_settings<T: JobSettings>(args: &JobArgs) -> upload_utils::Result<T> {
    upload_utils::logging::init(T::DEFAULT_LOG_LEVEL);

    let document = args
        .job_settings
        .as_deref()
        .map(parse_json_spec)
        .transpose()?;
    let flags = parse_kv_flags::<T>(&args.extra)?;

    settings::resolve(settings::process_env_layer::<T>(), document, flags)
}

pub mod check;
pub mod copy_metadata;
pub mod delete;
pub mod notify;
pub mod s5_commands;
pub mod symlinks;

/// Dispatch a command to its handler and map result to JSON.
macro_rules! dispatch {
    ($args:expr, $module:ident :: $handler:ident) => {
        crate::output::map_cmd_result_to_json($module::$handler($args))
    };
}

pub(crate) fn run_json(command: crate::Commands) -> (upload_utils::Result<serde_json::Value>, i32) {
    crate::tty::status("upload-utils is working...");

    match command {
        crate::Commands::CheckDirectories(args) => dispatch!(args, check::run_directories),
        crate::Commands::CheckMetadata(args) => dispatch!(args, check::run_metadata),
        crate::Commands::CopyMetadata(args) => dispatch!(args, copy_metadata::run_json),
        crate::Commands::CreateS5Commands(args) => dispatch!(args, s5_commands::run_json),
        crate::Commands::CreateSymLinks(args) => dispatch!(args, symlinks::run_json),
        crate::Commands::DeleteStagingFolder(args) => dispatch!(args, delete::run_staging_folder),
        crate::Commands::DeleteFolders(args) => dispatch!(args, delete::run_folders),
        crate::Commands::DeleteSourceFolders(args) => dispatch!(args, delete::run_source_folders),
        crate::Commands::CleanupNotification(args) => dispatch!(args, notify::run_rows),
        crate::Commands::TriggerCleanupNotification(args) => dispatch!(args, notify::run_trigger),
    }
}
