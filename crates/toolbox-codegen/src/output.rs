//! Whole-directory replacement of generated output.
//!
//! A server's generated directory is never patched. The new content is
//! written into a sibling staging directory, the previous directory is moved
//! aside, and the staging directory is renamed into place. Readers see
//! either the old tree or the new one.

use crate::types::GeneratedCode;
use mcp_toolbox_core::{Error, Result};
use std::path::{Component, Path, PathBuf};

/// Replaces `target` with a directory containing exactly `code`'s files.
///
/// # Errors
///
/// - [`Error::ValidationError`] if a file path is absolute or escapes the
///   directory
/// - [`Error::IoError`] if staging, moving or renaming fails; the previous
///   directory is restored in that case
///
/// # Examples
///
/// ```
/// use mcp_toolbox_codegen::output::replace_dir;
/// use mcp_toolbox_codegen::{GeneratedCode, GeneratedFile};
///
/// let dir = tempfile::tempdir()?;
/// let target = dir.path().join("servers/fs");
///
/// let mut code = GeneratedCode::new();
/// code.add_file(GeneratedFile { path: "index.ts".into(), content: "export {};\n".into() });
/// replace_dir(&target, &code)?;
///
/// assert_eq!(std::fs::read_to_string(target.join("index.ts"))?, "export {};\n");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn replace_dir(target: &Path, code: &GeneratedCode) -> Result<()> {
    let parent = target.parent().ok_or_else(|| Error::ValidationError {
        field: "outDir".to_string(),
        reason: format!("'{}' has no parent directory", target.display()),
    })?;
    std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;

    let staging = tempfile::Builder::new()
        .prefix(".staging-")
        .tempdir_in(parent)
        .map_err(|e| Error::io(parent, e))?;

    for file in code.files() {
        let path = staging.path().join(relative_path(&file.path)?);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
        }
        std::fs::write(&path, &file.content).map_err(|e| Error::io(&path, e))?;
    }

    let trash = if target.exists() {
        let trash = tempfile::Builder::new()
            .prefix(".trash-")
            .tempdir_in(parent)
            .map_err(|e| Error::io(parent, e))?;
        let previous = trash.path().join("previous");
        std::fs::rename(target, &previous).map_err(|e| Error::io(target, e))?;
        Some((trash, previous))
    } else {
        None
    };

    if let Err(e) = std::fs::rename(staging.path(), target) {
        if let Some((_, previous)) = &trash
            && let Err(restore) = std::fs::rename(previous, target)
        {
            tracing::warn!(
                "Failed to restore {} after a failed replace: {}",
                target.display(),
                restore
            );
        }
        return Err(Error::io(target, e));
    }

    if let Some((trash, _)) = trash {
        let trash_path = trash.path().to_path_buf();
        if let Err(e) = trash.close() {
            tracing::warn!(
                "Failed to remove previous output {}: {}",
                trash_path.display(),
                e
            );
        }
    }

    tracing::debug!(
        "Replaced {} with {} generated files",
        target.display(),
        code.file_count()
    );
    Ok(())
}

/// Validates a generated path and converts it to a relative [`PathBuf`].
fn relative_path(path: &str) -> Result<PathBuf> {
    let candidate = Path::new(path);
    let valid = !path.is_empty()
        && candidate
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
    if !valid {
        return Err(Error::ValidationError {
            field: "path".to_string(),
            reason: format!("generated file path '{path}' must be relative and stay inside the output directory"),
        });
    }
    Ok(candidate.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GeneratedFile;
    use tempfile::TempDir;

    fn code(files: &[(&str, &str)]) -> GeneratedCode {
        let mut code = GeneratedCode::new();
        for (path, content) in files {
            code.add_file(GeneratedFile {
                path: (*path).to_string(),
                content: (*content).to_string(),
            });
        }
        code
    }

    #[test]
    fn test_replace_removes_stale_files() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("servers").join("fs");

        replace_dir(&target, &code(&[("tools/old.ts", "old"), ("index.ts", "v1")])).unwrap();
        replace_dir(&target, &code(&[("tools/new.ts", "new"), ("index.ts", "v2")])).unwrap();

        assert!(!target.join("tools/old.ts").exists());
        assert_eq!(std::fs::read_to_string(target.join("tools/new.ts")).unwrap(), "new");
        assert_eq!(std::fs::read_to_string(target.join("index.ts")).unwrap(), "v2");
    }

    #[test]
    fn test_no_temporary_directories_left_behind() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("fs");
        replace_dir(&target, &code(&[("index.ts", "a")])).unwrap();
        replace_dir(&target, &code(&[("index.ts", "b")])).unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["fs".to_string()]);
    }

    #[test]
    fn test_escaping_paths_are_rejected_and_target_kept() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("fs");
        replace_dir(&target, &code(&[("index.ts", "keep")])).unwrap();

        for bad in ["../evil.ts", "/abs.ts", "", "tools/../../x.ts"] {
            let err = replace_dir(&target, &code(&[(bad, "x")])).unwrap_err();
            assert!(matches!(err, Error::ValidationError { .. }), "{bad}");
        }
        assert_eq!(std::fs::read_to_string(target.join("index.ts")).unwrap(), "keep");
    }
}
