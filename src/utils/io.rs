//! File I/O primitives with consistent error handling.

use crate::error::{Error, Result};
use std::fs;
use std::path::Path;

/// Read a whole text file, reporting failures as `internal.io_error` with `operation` as context.
pub fn read_file(path: &Path, operation: &str) -> Result<String> {
    fs::read_to_string(path)
        .map_err(|e| Error::internal_io(e.to_string(), Some(operation.to_string())))
}

/// Like [`read_file`], but a file that does not exist yields `None`.
pub fn read_file_if_exists(path: &Path, operation: &str) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::internal_io(e.to_string(), Some(operation.to_string()))),
    }
}

/// Write `lines` to `path`, each terminated by a newline, replacing any existing file.
pub fn write_lines(path: &Path, lines: &[String], operation: &str) -> Result<()> {
    let mut content = String::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
    for line in lines {
        content.push_str(line);
        content.push('\n');
    }
    fs::write(path, content)
        .map_err(|e| Error::internal_io(e.to_string(), Some(operation.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    #[test]
    fn read_file_succeeds_for_existing_file() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "user_email,capsule_url").unwrap();

        let content = read_file(temp.path(), "read csv").unwrap();
        assert!(content.starts_with("user_email,capsule_url"));
    }

    #[test]
    fn read_file_returns_error_for_missing_file() {
        let err = read_file(Path::new("/nonexistent/path.txt"), "read csv").unwrap_err();
        assert_eq!(err.code.as_str(), "internal.io_error");
        assert_eq!(err.details["context"], "read csv");
    }

    #[test]
    fn read_file_if_exists_maps_missing_to_none() {
        let dir = tempdir().unwrap();
        assert_eq!(
            read_file_if_exists(&dir.path().join("exclude.txt"), "read exclude list").unwrap(),
            None
        );

        fs::write(dir.path().join("exclude.txt"), "2,5").unwrap();
        assert_eq!(
            read_file_if_exists(&dir.path().join("exclude.txt"), "read exclude list").unwrap(),
            Some("2,5".to_string())
        );
    }

    #[test]
    fn write_lines_terminates_every_line() {
        let temp = NamedTempFile::new().unwrap();
        let lines = vec!["cp \"a\" \"b\"".to_string(), "cp \"c\" \"d\"".to_string()];
        write_lines(temp.path(), &lines, "write s5 commands").unwrap();

        let content = fs::read_to_string(temp.path()).unwrap();
        assert_eq!(content, "cp \"a\" \"b\"\ncp \"c\" \"d\"\n");
    }

    #[test]
    fn write_lines_returns_error_for_invalid_path() {
        let err = write_lines(
            Path::new("/nonexistent/dir/s5_commands.txt"),
            &[],
            "write s5 commands",
        )
        .unwrap_err();
        assert_eq!(err.code.as_str(), "internal.io_error");
    }
}
