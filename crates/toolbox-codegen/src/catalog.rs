//! Repository-wide tool catalog (`catalog.json`).
//!
//! Lists every server synced into the output directory with its tool names
//! and descriptions, so tools can be found by text search without loading
//! any generated module.

use mcp_toolbox_core::fs::write_json_atomic;
use mcp_toolbox_core::{Result, clock};
use mcp_toolbox_introspector::Snapshot;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Catalog file name at the output root.
pub const CATALOG_FILE: &str = "catalog.json";

/// Contents of `catalog.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    /// When the catalog was last written
    pub generated_at: String,
    /// One entry per server
    pub servers: Vec<CatalogServer>,
}

/// Catalog entry for one server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogServer {
    /// Directory name under `servers/`
    pub server_slug: String,
    /// Configured server name
    pub server_name: String,
    /// Snapshot version
    pub version: String,
    /// Tools in snapshot order
    pub tools: Vec<CatalogTool>,
}

/// Catalog entry for one tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogTool {
    /// Tool name as reported by the server
    pub name: String,
    /// Tool description
    pub description: String,
}

impl CatalogServer {
    /// Builds the entry for `snapshot`.
    #[must_use]
    pub fn from_snapshot(server_slug: &str, snapshot: &Snapshot) -> Self {
        Self {
            server_slug: server_slug.to_string(),
            server_name: snapshot.server_name.clone(),
            version: snapshot.version.clone(),
            tools: snapshot
                .tools
                .iter()
                .map(|tool| CatalogTool {
                    name: tool.name.clone(),
                    description: tool.description.clone(),
                })
                .collect(),
        }
    }
}

impl Catalog {
    /// Reads `out_dir/catalog.json`, or `None` if absent or unparsable.
    #[must_use]
    pub fn read(out_dir: &Path) -> Option<Self> {
        let path = out_dir.join(CATALOG_FILE);
        let content = std::fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&content) {
            Ok(catalog) => Some(catalog),
            Err(e) => {
                tracing::warn!("Ignoring unparsable {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Finds a server entry by slug.
    #[must_use]
    pub fn find(&self, server_slug: &str) -> Option<&CatalogServer> {
        self.servers.iter().find(|s| s.server_slug == server_slug)
    }
}

/// Result of [`write_catalog`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogOutcome {
    /// A new catalog was written
    Written(PathBuf),
    /// Server entries matched the existing file, which was left untouched
    Unchanged(PathBuf),
}

impl CatalogOutcome {
    /// Path of the catalog file.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Written(path) | Self::Unchanged(path) => path,
        }
    }
}

/// Writes `catalog.json` listing `servers` in the given order.
///
/// If the server entries equal those already on disk the file is not
/// rewritten, so `generatedAt` only moves when the content does.
///
/// # Errors
///
/// Returns error if serialization or the atomic write fails.
///
/// # Examples
///
/// ```
/// use mcp_toolbox_codegen::catalog::{CatalogOutcome, CatalogServer, write_catalog};
///
/// let dir = tempfile::tempdir()?;
/// let servers = vec![CatalogServer {
///     server_slug: "fs".into(),
///     server_name: "fs".into(),
///     version: "1.0.0".into(),
///     tools: vec![],
/// }];
///
/// assert!(matches!(write_catalog(dir.path(), servers.clone())?, CatalogOutcome::Written(_)));
/// assert!(matches!(write_catalog(dir.path(), servers)?, CatalogOutcome::Unchanged(_)));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn write_catalog(out_dir: &Path, servers: Vec<CatalogServer>) -> Result<CatalogOutcome> {
    let path = out_dir.join(CATALOG_FILE);

    if Catalog::read(out_dir).is_some_and(|existing| existing.servers == servers) {
        tracing::debug!("Catalog unchanged: {}", path.display());
        return Ok(CatalogOutcome::Unchanged(path));
    }

    let catalog = Catalog {
        generated_at: clock::now_iso(),
        servers,
    };
    write_json_atomic(&path, &catalog)?;
    tracing::info!(servers = catalog.servers.len(), "catalog written");
    Ok(CatalogOutcome::Written(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcp_toolbox_introspector::{ToolDefinition, TransportDescriptor};
    use serde_json::json;
    use tempfile::TempDir;

    fn entry(version: &str) -> CatalogServer {
        let snapshot = Snapshot {
            server_name: "Files".to_string(),
            version: version.to_string(),
            retrieved_at: "2025-01-01T00:00:00.000Z".to_string(),
            transport: TransportDescriptor::Sse {
                url: "https://example.com/sse".to_string(),
            },
            tools: vec![ToolDefinition::new("read", "Read a file", json!({}))],
        };
        CatalogServer::from_snapshot("files", &snapshot)
    }

    #[test]
    fn test_catalog_json_shape() {
        let dir = TempDir::new().unwrap();
        write_catalog(dir.path(), vec![entry("1")]).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join(CATALOG_FILE)).unwrap())
                .unwrap();
        assert!(raw["generatedAt"].is_string());
        assert_eq!(raw["servers"][0]["serverSlug"], "files");
        assert_eq!(raw["servers"][0]["serverName"], "Files");
        assert_eq!(raw["servers"][0]["tools"][0]["description"], "Read a file");
    }

    #[test]
    fn test_changed_entries_rewrite_catalog() {
        let dir = TempDir::new().unwrap();
        write_catalog(dir.path(), vec![entry("1")]).unwrap();
        let outcome = write_catalog(dir.path(), vec![entry("2")]).unwrap();

        assert!(matches!(outcome, CatalogOutcome::Written(_)));
        let catalog = Catalog::read(dir.path()).unwrap();
        assert_eq!(catalog.find("files").unwrap().version, "2");
        assert!(catalog.find("missing").is_none());
    }

    #[test]
    fn test_unparsable_catalog_is_replaced() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CATALOG_FILE), "[").unwrap();
        assert!(Catalog::read(dir.path()).is_none());
        assert!(matches!(
            write_catalog(dir.path(), vec![entry("1")]).unwrap(),
            CatalogOutcome::Written(_)
        ));
    }
}
