//! Atomic file writes.
//!
//! Every artifact the toolbox persists goes through [`write_atomic`]: the
//! bytes land in a temporary file in the destination directory, which is then
//! renamed over the target. Readers see either the old or the new file.

use crate::{Error, Result};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Atomically replaces `path` with `contents`, creating parent directories.
///
/// # Errors
///
/// Returns [`Error::IoError`] if a directory, the temporary file or the
/// final rename cannot be created.
///
/// # Examples
///
/// ```
/// use mcp_toolbox_core::fs::write_atomic;
///
/// let dir = tempfile::tempdir()?;
/// let path = dir.path().join("nested/out.txt");
/// write_atomic(&path, b"hello")?;
/// assert_eq!(std::fs::read_to_string(&path)?, "hello");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;

    let mut temp = tempfile::NamedTempFile::new_in(parent).map_err(|e| Error::io(parent, e))?;
    temp.write_all(contents).map_err(|e| Error::io(temp.path(), e))?;
    temp.as_file().sync_all().map_err(|e| Error::io(temp.path(), e))?;
    temp.persist(path).map_err(|e| Error::io(path, e.error))?;
    Ok(())
}

/// Serializes `value` as 2-space pretty JSON with a trailing newline.
///
/// # Errors
///
/// Returns [`Error::SerializationError`] if `value` cannot be serialized.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut body = serde_json::to_string_pretty(value).map_err(|e| Error::SerializationError {
        message: "failed to serialize JSON document".to_string(),
        source: Some(e),
    })?;
    body.push('\n');
    Ok(body)
}

/// Writes `value` as pretty JSON through [`write_atomic`].
///
/// # Errors
///
/// Propagates serialization and I/O failures.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    write_atomic(path, to_pretty_json(value)?.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_write_atomic_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("file.txt");
        write_atomic(&path, b"one").unwrap();
        write_atomic(&path, b"two").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "two");
    }

    #[test]
    fn test_write_atomic_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        write_atomic(&dir.path().join("a.json"), b"{}").unwrap();
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_pretty_json_has_trailing_newline() {
        let body = to_pretty_json(&json!({"a": [1, 2]})).unwrap();
        assert_eq!(body, "{\n  \"a\": [\n    1,\n    2\n  ]\n}\n");
    }
}
