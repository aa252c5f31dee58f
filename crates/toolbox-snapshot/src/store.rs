//! On-disk snapshot persistence.
//!
//! # Directory Structure
//!
//! ```text
//! out_dir/
//! ├── .snapshots/
//! │   └── <slug>/
//! │       ├── latest.json
//! │       ├── latest.meta.json
//! │       └── 2025-01-02T03-04-05-678Z.json
//! └── .reports/
//!     └── <slug>/
//!         └── 2025-01-02T03-04-05-678Z.md
//! ```
//!
//! The `latest` pair is replaced on every write; historical snapshots and
//! reports are only ever added.

use crate::fingerprint::schema_fingerprint;
use mcp_toolbox_core::fs::{write_atomic, write_json_atomic};
use mcp_toolbox_core::{Error, Result, clock, slugify_server_name};
use mcp_toolbox_introspector::{Snapshot, TransportDescriptor};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory holding per-server snapshots.
pub const SNAPSHOTS_DIR: &str = ".snapshots";

/// Directory holding per-server diff reports.
pub const REPORTS_DIR: &str = ".reports";

/// File name of the most recent snapshot.
pub const LATEST_FILE: &str = "latest.json";

/// File name of the most recent snapshot's metadata.
pub const LATEST_META_FILE: &str = "latest.meta.json";

/// Metadata stored next to the latest snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMeta {
    /// When the snapshot was retrieved
    pub retrieved_at: String,
    /// Configured server name
    pub server_name: String,
    /// Transport used for the snapshot
    pub transport: TransportDescriptor,
    /// Version reported by the server
    pub server_reported_version: String,
    /// Fingerprint of the tool schema
    pub schema_fingerprint: String,
}

impl SnapshotMeta {
    /// Derives metadata from `snapshot`.
    ///
    /// # Errors
    ///
    /// Propagates fingerprint serialization failures.
    pub fn from_snapshot(snapshot: &Snapshot) -> Result<Self> {
        Ok(Self {
            retrieved_at: snapshot.retrieved_at.clone(),
            server_name: snapshot.server_name.clone(),
            transport: snapshot.transport.clone(),
            server_reported_version: snapshot.version.clone(),
            schema_fingerprint: schema_fingerprint(snapshot)?,
        })
    }
}

/// Paths produced by [`SnapshotStore::write`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenSnapshot {
    /// `latest.json`
    pub latest_path: PathBuf,
    /// `latest.meta.json`
    pub meta_path: PathBuf,
    /// Timestamped historical copy
    pub historical_path: PathBuf,
    /// Fingerprint recorded in the metadata
    pub schema_fingerprint: String,
}

/// Snapshot store rooted at an output directory.
///
/// # Examples
///
/// ```
/// use mcp_toolbox_snapshot::SnapshotStore;
///
/// let dir = tempfile::tempdir()?;
/// let store = SnapshotStore::new(dir.path());
///
/// assert!(store.read_latest("github").is_none());
/// assert!(store.server_dir("My Server").ends_with(".snapshots/my-server"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    out_dir: PathBuf,
}

impl SnapshotStore {
    /// Creates a store rooted at `out_dir`. Nothing is created until a write.
    #[must_use]
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    /// Root output directory.
    #[must_use]
    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Snapshot directory for a server.
    #[must_use]
    pub fn server_dir(&self, server_name: &str) -> PathBuf {
        self.out_dir
            .join(SNAPSHOTS_DIR)
            .join(slugify_server_name(server_name))
    }

    /// Reads the latest snapshot, or `None` if absent or unreadable.
    #[must_use]
    pub fn read_latest(&self, server_name: &str) -> Option<Snapshot> {
        read_optional_json(&self.server_dir(server_name).join(LATEST_FILE))
    }

    /// Reads the latest snapshot metadata, or `None` if absent or unreadable.
    #[must_use]
    pub fn read_latest_meta(&self, server_name: &str) -> Option<SnapshotMeta> {
        read_optional_json(&self.server_dir(server_name).join(LATEST_META_FILE))
    }

    /// Persists `snapshot` as the latest and as a new historical entry.
    ///
    /// The historical copy is written first and the metadata last, so an
    /// interrupted write never records a fingerprint for a snapshot that is
    /// not on disk.
    ///
    /// # Errors
    ///
    /// - [`Error::ValidationError`] if the server name has an empty slug
    /// - [`Error::IoError`] or [`Error::SerializationError`] on write failure
    pub fn write(&self, snapshot: &Snapshot) -> Result<WrittenSnapshot> {
        let slug = checked_slug(&snapshot.server_name)?;
        let dir = self.out_dir.join(SNAPSHOTS_DIR).join(&slug);
        let meta = SnapshotMeta::from_snapshot(snapshot)?;

        let historical_path = unique_path(&dir, &clock::file_stamp(&clock::now_iso()), "json");
        let latest_path = dir.join(LATEST_FILE);
        let meta_path = dir.join(LATEST_META_FILE);

        write_json_atomic(&historical_path, snapshot)?;
        write_json_atomic(&latest_path, snapshot)?;
        write_json_atomic(&meta_path, &meta)?;

        tracing::info!(
            server = %snapshot.server_name,
            fingerprint = %meta.schema_fingerprint,
            "snapshot written"
        );
        tracing::debug!("Wrote historical snapshot: {}", historical_path.display());

        Ok(WrittenSnapshot {
            latest_path,
            meta_path,
            historical_path,
            schema_fingerprint: meta.schema_fingerprint,
        })
    }

    /// Writes a Markdown diff report for `server_name`.
    ///
    /// # Errors
    ///
    /// - [`Error::ValidationError`] if the server name has an empty slug
    /// - [`Error::IoError`] on write failure
    pub fn write_report(&self, server_name: &str, markdown: &str) -> Result<PathBuf> {
        let slug = checked_slug(server_name)?;
        let dir = self.out_dir.join(REPORTS_DIR).join(slug);
        let path = unique_path(&dir, &clock::file_stamp(&clock::now_iso()), "md");
        write_atomic(&path, markdown.as_bytes())?;
        tracing::debug!("Wrote diff report: {}", path.display());
        Ok(path)
    }
}

fn checked_slug(server_name: &str) -> Result<String> {
    let slug = slugify_server_name(server_name);
    if slug.is_empty() {
        return Err(Error::ValidationError {
            field: "serverName".to_string(),
            reason: format!("'{server_name}' has no alphanumeric characters to build a directory name"),
        });
    }
    Ok(slug)
}

/// `dir/stem.ext`, or `dir/stem-N.ext` if that already exists.
fn unique_path(dir: &Path, stem: &str, extension: &str) -> PathBuf {
    let candidate = dir.join(format!("{stem}.{extension}"));
    if !candidate.exists() {
        return candidate;
    }
    (1u32..)
        .map(|n| dir.join(format!("{stem}-{n}.{extension}")))
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}

fn read_optional_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            tracing::warn!("Failed to read {}: {}", path.display(), e);
            return None;
        }
    };
    match serde_json::from_str(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Ignoring unparsable {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcp_toolbox_introspector::ToolDefinition;
    use serde_json::json;
    use tempfile::TempDir;

    fn snapshot(name: &str) -> Snapshot {
        Snapshot {
            server_name: name.to_string(),
            version: "2.1.0".to_string(),
            retrieved_at: "2025-03-04T05:06:07.089Z".to_string(),
            transport: TransportDescriptor::StreamableHttp {
                url: "https://example.com/mcp".to_string(),
            },
            tools: vec![ToolDefinition::new("ping", "Ping", json!({"type": "object"}))],
        }
    }

    #[test]
    fn test_write_then_read_latest() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path());
        let written = store.write(&snapshot("Remote API")).unwrap();

        assert!(written.latest_path.ends_with(".snapshots/remote-api/latest.json"));
        assert!(written.historical_path.exists());
        assert_eq!(store.read_latest("Remote API").unwrap(), snapshot("Remote API"));

        let meta = store.read_latest_meta("Remote API").unwrap();
        assert_eq!(meta.schema_fingerprint, written.schema_fingerprint);
        assert_eq!(meta.server_reported_version, "2.1.0");
        assert_eq!(meta.retrieved_at, "2025-03-04T05:06:07.089Z");
    }

    #[test]
    fn test_written_files_are_pretty_with_newline() {
        let dir = TempDir::new().unwrap();
        let written = SnapshotStore::new(dir.path()).write(&snapshot("fs")).unwrap();
        let body = std::fs::read_to_string(&written.latest_path).unwrap();
        assert!(body.starts_with("{\n  \"serverName\": \"fs\""));
        assert!(body.ends_with("}\n"));
    }

    #[test]
    fn test_history_is_append_only() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path());
        let first = store.write(&snapshot("fs")).unwrap();
        let second = store.write(&snapshot("fs")).unwrap();

        assert_ne!(first.historical_path, second.historical_path);
        assert!(first.historical_path.exists());
        let name = second.historical_path.file_name().unwrap().to_string_lossy().to_string();
        assert!(!name.contains(':'));
    }

    #[test]
    fn test_unparsable_latest_is_treated_as_absent() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path());
        let server_dir = store.server_dir("fs");
        std::fs::create_dir_all(&server_dir).unwrap();
        std::fs::write(server_dir.join(LATEST_FILE), "{not json").unwrap();

        assert!(store.read_latest("fs").is_none());
    }

    #[test]
    fn test_empty_slug_is_rejected() {
        let dir = TempDir::new().unwrap();
        let err = SnapshotStore::new(dir.path()).write(&snapshot("@@@")).unwrap_err();
        assert!(matches!(err, Error::ValidationError { .. }));
    }

    #[test]
    fn test_write_report() {
        let dir = TempDir::new().unwrap();
        let path = SnapshotStore::new(dir.path())
            .write_report("fs", "# report\n")
            .unwrap();
        assert!(path.starts_with(dir.path().join(REPORTS_DIR).join("fs")));
        assert_eq!(path.extension().unwrap(), "md");
        assert_eq!(std::fs::read_to_string(path).unwrap(), "# report\n");
    }
}
