//! Path rendering, level globbing, and validity checks shared by the jobs.

use std::fs;
use std::path::{Path, PathBuf};

use glob::{glob_with, MatchOptions, Pattern};

use crate::error::{Error, Result};

/// Forward-slash rendering with trailing slashes trimmed.
pub fn posix(path: &Path) -> String {
    let rendered = path.to_string_lossy().replace('\\', "/");
    trim_trailing_slash(&rendered).to_string()
}

pub fn trim_trailing_slash(s: &str) -> &str {
    s.trim_end_matches('/')
}

fn match_options() -> MatchOptions {
    MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: true,
    }
}

/// Expand a glob pattern. Unreadable directories are skipped.
pub fn glob_paths(pattern: &str) -> Result<Vec<PathBuf>> {
    let entries = glob_with(pattern, match_options()).map_err(|e| {
        Error::validation_invalid_argument(
            "pattern",
            e.to_string(),
            Some(pattern.to_string()),
            None,
        )
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) => paths.push(path),
            Err(e) => log::debug!("Skipping unreadable path {}: {}", e.path().display(), e.error()),
        }
    }
    Ok(paths)
}

/// Pattern for everything exactly `depth` levels below `base`.
pub fn depth_pattern(base: &Path, depth: usize) -> String {
    let mut pattern = Pattern::escape(&posix(base));
    for _ in 0..depth {
        pattern.push_str("/*");
    }
    pattern
}

/// Non-hidden entries exactly `depth` levels below `base`, in lexical order.
pub fn entries_at_depth(base: &Path, depth: usize) -> Result<Vec<PathBuf>> {
    glob_paths(&depth_pattern(base, depth))
}

/// True when `path` is itself a symlink (does not follow it).
pub fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false)
}

/// True when something, even a dangling symlink, occupies `path`.
pub fn occupied(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Accept directories, files, and symlinks whose target exists.
pub fn check_path(path: &Path) -> Result<()> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() || meta.is_file() => Ok(()),
        Ok(_) if is_symlink(path) => Ok(()),
        _ => Err(Error::path_not_found(path.to_string_lossy())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "x").unwrap();
    }

    #[test]
    fn posix_trims_trailing_slashes() {
        assert_eq!(posix(Path::new("/stage/abc/")), "/stage/abc");
        assert_eq!(posix(Path::new("relative/dir")), "relative/dir");
    }

    #[test]
    fn entries_at_depth_skips_hidden_and_sorts() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("b/one.txt"));
        touch(&dir.path().join("a/two.txt"));
        touch(&dir.path().join(".hidden/three.txt"));

        let level_one = entries_at_depth(dir.path(), 1).unwrap();
        assert_eq!(level_one, vec![dir.path().join("a"), dir.path().join("b")]);

        let level_two = entries_at_depth(dir.path(), 2).unwrap();
        assert_eq!(
            level_two,
            vec![dir.path().join("a/two.txt"), dir.path().join("b/one.txt")]
        );
    }

    #[test]
    fn entries_at_depth_escapes_base() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("run[1]");
        touch(&base.join("data.bin"));

        let entries = entries_at_depth(&base, 1).unwrap();
        assert_eq!(entries, vec![base.join("data.bin")]);
    }

    #[test]
    fn check_path_accepts_files_and_directories() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("f.txt");
        touch(&file);
        assert!(check_path(&file).is_ok());
        assert!(check_path(dir.path()).is_ok());
    }

    #[test]
    fn check_path_rejects_missing_path() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing");
        let err = check_path(&missing).unwrap_err();
        assert_eq!(err.code.as_str(), "path.not_found");
        assert!(err.message.ends_with("is neither a directory, file, nor valid symlink"));
    }

    #[cfg(unix)]
    #[test]
    fn check_path_distinguishes_valid_and_broken_symlinks() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("target.txt");
        touch(&target);

        let good = dir.path().join("good");
        std::os::unix::fs::symlink(&target, &good).unwrap();
        assert!(check_path(&good).is_ok());

        let broken = dir.path().join("broken");
        std::os::unix::fs::symlink(dir.path().join("gone.txt"), &broken).unwrap();
        assert!(check_path(&broken).is_err());
        assert!(occupied(&broken));
        assert!(is_symlink(&broken));
    }
}
