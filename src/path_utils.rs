//! Path utilities for writing exported CBZ files.
//!
//! Exported names come from book metadata, so they are sanitized before they
//! touch the file system, and output paths are validated (including the
//! Windows long path limit) before anything is written.

use crate::error::{Error, Result};

use std::path::{Path, PathBuf};

/// Maximum path length for Windows without long path support
const WINDOWS_MAX_PATH: usize = 260;

/// Windows long path prefix
const WINDOWS_LONG_PATH_PREFIX: &str = r"\\?\";

/// Converts a path to a string, failing on non UTF-8 paths.
pub fn path_to_string_safe(path: &Path) -> Result<String> {
    path.to_str()
        .map(|s| s.to_string())
        .ok_or_else(|| Error::PathUtf8Error(path.to_path_buf()))
}

pub fn path_to_string_lossy(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// Rejects paths that are too long for the platform or contain characters
/// that most file systems refuse.
pub fn validate_path(path: &Path) -> Result<()> {
    let path_str = path_to_string_lossy(path);

    if cfg!(windows)
        && path_str.len() > WINDOWS_MAX_PATH
        && !path_str.starts_with(WINDOWS_LONG_PATH_PREFIX)
    {
        return Err(Error::PathTooLong(path.to_path_buf()));
    }

    // The long path prefix itself contains a '?'
    let path_to_check = path_str
        .strip_prefix(WINDOWS_LONG_PATH_PREFIX)
        .unwrap_or(&path_str);

    if path_to_check
        .chars()
        .any(|c| matches!(c, '<' | '>' | '"' | '|' | '?' | '*'))
    {
        return Err(Error::InvalidPath(
            path.to_path_buf(),
            "Path contains invalid characters".to_string(),
        ));
    }

    Ok(())
}

/// Adds the Windows long path prefix to long absolute paths.
pub fn prepare_long_path(path: &Path) -> Result<PathBuf> {
    let path_str = path_to_string_safe(path)?;

    if cfg!(windows)
        && path_str.len() > WINDOWS_MAX_PATH
        && !path_str.starts_with(WINDOWS_LONG_PATH_PREFIX)
    {
        let absolute_path = path.canonicalize().map_err(|e| {
            Error::InvalidPath(
                path.to_path_buf(),
                format!("Cannot canonicalize path: {}", e),
            )
        })?;

        let absolute_str = path_to_string_safe(&absolute_path)?;
        Ok(PathBuf::from(format!(
            "{}{}",
            WINDOWS_LONG_PATH_PREFIX, absolute_str
        )))
    } else {
        Ok(path.to_path_buf())
    }
}

/// Replaces characters that are invalid in file names.
///
/// Trailing dots and spaces are removed as Windows silently strips them.
pub fn sanitize_filename(filename: &str) -> String {
    let sanitized: String = filename
        .chars()
        .map(|c| match c {
            '<' | '>' | '"' | '|' | '?' | '*' => '-',
            ':' => '-',
            '/' | '\\' => '-',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    sanitized.trim_end_matches(['.', ' ']).to_string()
}

/// Validates a path and resolves it to an absolute form where it exists.
///
/// Paths that do not exist yet (output files) are returned unchanged once
/// validated.
pub fn normalize_path(path: &Path) -> Result<PathBuf> {
    validate_path(path)?;

    match path.canonicalize() {
        Ok(canonical) => prepare_long_path(&canonical),
        Err(e) => {
            if path.exists() {
                Err(Error::InvalidPath(
                    path.to_path_buf(),
                    format!("Cannot access path: {}", e),
                ))
            } else {
                Ok(path.to_path_buf())
            }
        }
    }
}
