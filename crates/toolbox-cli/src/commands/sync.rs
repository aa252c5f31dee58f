//! Sync command implementation.
//!
//! For every configured server, one at a time:
//! 1. Introspect the server
//! 2. Diff against the latest snapshot and write a report when changed
//! 3. Record the new snapshot
//! 4. Regenerate the server's wrappers
//!
//! Then the catalog and README are refreshed. A failing server is reported
//! and skipped; the remaining servers are still processed.
//!
//! `--check` only compares fingerprints and writes nothing.

use super::common::{LoadedConfig, load_config};
use anyhow::{Context, Result};
use colored::Colorize;
use mcp_toolbox_codegen::{Catalog, CatalogServer, CodeGenerator, write_catalog};
use mcp_toolbox_core::cli::{ExitCode, OutputFormat};
use mcp_toolbox_core::{EnvAuthResolver, ServerConfig, slugify_server_name};
use mcp_toolbox_introspector::{Introspector, Snapshot};
use mcp_toolbox_snapshot::{
    DiffSummary, SnapshotStore, ToolChange, diff_snapshots, render_diff_report, schema_fingerprint,
};
use serde::Serialize;
use std::fmt::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Flags of the sync command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Compare fingerprints only, write nothing
    pub check: bool,
    /// Do not list breaking changes in the summary
    pub yes: bool,
}

/// What happened to one server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServerStatus {
    /// First sync of this server; nothing to diff against
    New,
    /// Snapshot and wrappers were rewritten; the schema changed
    Updated,
    /// Snapshot and wrappers were rewritten; the schema is unchanged
    Unchanged,
    /// `--check`: the fingerprint matches the recorded one
    InSync,
    /// `--check`: no snapshot yet, or the fingerprint differs
    OutOfSync,
    /// Introspection, snapshot or generation failed
    Failed,
}

impl ServerStatus {
    /// Returns `true` if this status makes the command exit non-zero.
    #[must_use]
    pub const fn is_failure(self) -> bool {
        matches!(self, Self::OutOfSync | Self::Failed)
    }
}

/// Per-server summary entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSummary {
    /// Configured server name
    pub server: String,
    /// Directory name under `servers/`
    pub slug: String,
    /// Outcome
    pub status: ServerStatus,
    /// Version reported by the server
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Number of tools in the new snapshot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_count: Option<usize>,
    /// Number of changes against the previous snapshot
    pub change_count: usize,
    /// Breaking changes, one line each; empty with `--yes`
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub breaking_changes: Vec<String>,
    /// Diff report written for this run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_path: Option<String>,
    /// Failure message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ServerSummary {
    fn new(server: &ServerConfig, status: ServerStatus) -> Self {
        Self {
            server: server.name.clone(),
            slug: slugify_server_name(&server.name),
            status,
            version: None,
            tool_count: None,
            change_count: 0,
            breaking_changes: Vec::new(),
            report_path: None,
            error: None,
        }
    }

    fn failed(server: &ServerConfig, error: &anyhow::Error) -> Self {
        Self {
            error: Some(format!("{error:#}")),
            ..Self::new(server, ServerStatus::Failed)
        }
    }
}

/// Result of a sync run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    /// Whether this was a `--check` run
    pub check: bool,
    /// Output directory
    pub out_dir: String,
    /// One entry per configured server, in config order
    pub servers: Vec<ServerSummary>,
    /// `catalog.json`, unless `--check`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog_path: Option<String>,
    /// `README.md`, unless `--check`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readme_path: Option<String>,
}

impl SyncReport {
    /// Process exit code for this report.
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        if self.servers.iter().any(|s| s.status.is_failure()) {
            ExitCode::ERROR
        } else {
            ExitCode::SUCCESS
        }
    }
}

/// Runs the sync command.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or the catalog or
/// README cannot be written. Per-server failures are part of the report.
pub async fn run(
    config: Option<PathBuf>,
    out_dir: Option<PathBuf>,
    options: SyncOptions,
    output_format: OutputFormat,
) -> Result<ExitCode> {
    let loaded = load_config(config.as_deref(), out_dir)?;
    let report = sync(&loaded, options).await?;

    let output = match output_format {
        OutputFormat::Pretty => render_summary(&report),
        other => crate::formatters::format_output(&report, other)?,
    };
    println!("{output}");

    Ok(report.exit_code())
}

/// Runs the pipeline for every configured server.
///
/// # Errors
///
/// Returns an error if the generator cannot be built or the catalog or
/// README cannot be written.
pub async fn sync(loaded: &LoadedConfig, options: SyncOptions) -> Result<SyncReport> {
    let introspector = Introspector::new(Arc::new(EnvAuthResolver::new()));
    let store = SnapshotStore::new(&loaded.out_dir);
    let generator = CodeGenerator::new().context("failed to initialize code generator")?;
    let previous_catalog = if options.check {
        None
    } else {
        Catalog::read(&loaded.out_dir)
    };

    let mut servers = Vec::with_capacity(loaded.config.servers.len());
    let mut catalog_entries = Vec::new();

    for server in &loaded.config.servers {
        info!(server = %server.name, "syncing server");
        let snapshot = introspector
            .introspect(server, &loaded.config.security)
            .await
            .with_context(|| format!("introspection of '{}' failed", server.name));

        let summary = match snapshot {
            Err(e) => {
                warn!(server = %server.name, error = %format!("{e:#}"), "server skipped");
                ServerSummary::failed(server, &e)
            }
            Ok(snapshot) if options.check => check_server(&store, server, &snapshot),
            Ok(snapshot) => match write_server(loaded, &store, &generator, server, &snapshot, options) {
                Ok(summary) => {
                    catalog_entries.push(CatalogServer::from_snapshot(&summary.slug, &snapshot));
                    summary
                }
                Err(e) => {
                    warn!(server = %server.name, error = %format!("{e:#}"), "server skipped");
                    ServerSummary::failed(server, &e)
                }
            },
        };

        if summary.status == ServerStatus::Failed
            && let Some(kept) = previous_catalog.as_ref().and_then(|c| c.find(&summary.slug))
        {
            catalog_entries.push(kept.clone());
        }
        servers.push(summary);
    }

    let mut report = SyncReport {
        check: options.check,
        out_dir: loaded.out_dir.display().to_string(),
        servers,
        catalog_path: None,
        readme_path: None,
    };
    if options.check {
        return Ok(report);
    }

    let example_slug = catalog_entries.first().map(|entry| entry.server_slug.clone());
    let catalog = write_catalog(&loaded.out_dir, catalog_entries).context("failed to write catalog")?;
    let readme = generator
        .write_readme(&loaded.out_dir, example_slug.as_deref())
        .context("failed to write README")?;

    report.catalog_path = Some(catalog.path().display().to_string());
    report.readme_path = Some(readme.display().to_string());
    Ok(report)
}

/// Compares the live fingerprint with the recorded one.
fn check_server(store: &SnapshotStore, server: &ServerConfig, snapshot: &Snapshot) -> ServerSummary {
    let live = match schema_fingerprint(snapshot) {
        Ok(fingerprint) => fingerprint,
        Err(e) => return ServerSummary::failed(server, &anyhow::Error::from(e)),
    };
    let recorded = store.read_latest_meta(&server.name).map(|m| m.schema_fingerprint);

    let status = if recorded.as_deref() == Some(live.as_str()) {
        ServerStatus::InSync
    } else {
        ServerStatus::OutOfSync
    };
    info!(server = %server.name, status = ?status, "fingerprint checked");

    ServerSummary {
        version: Some(snapshot.version.clone()),
        tool_count: Some(snapshot.tools.len()),
        ..ServerSummary::new(server, status)
    }
}

/// Diffs, records and regenerates one server.
fn write_server(
    loaded: &LoadedConfig,
    store: &SnapshotStore,
    generator: &CodeGenerator<'_>,
    server: &ServerConfig,
    snapshot: &Snapshot,
    options: SyncOptions,
) -> Result<ServerSummary> {
    let previous = store.read_latest(&server.name);
    let diff = match &previous {
        Some(previous) => diff_against(previous, snapshot)?,
        None => DiffSummary::default(),
    };

    // Wrappers first: a failed generation leaves the previous snapshot as
    // latest, so the next sync sees the same changes again.
    let slug = slugify_server_name(&server.name);
    generator.generate(&loaded.out_dir, &slug, &server.name, snapshot)?;

    let report_path = if diff.is_empty() {
        None
    } else {
        let markdown = render_diff_report(
            &server.name,
            previous.as_ref().map(|p| p.version.as_str()),
            &snapshot.version,
            &diff,
        );
        Some(store.write_report(&server.name, &markdown)?)
    };

    store.write(snapshot)?;

    let status = match (&previous, diff.is_empty()) {
        (None, _) => ServerStatus::New,
        (Some(_), true) => ServerStatus::Unchanged,
        (Some(_), false) => ServerStatus::Updated,
    };
    let breaking_changes = if options.yes {
        Vec::new()
    } else {
        diff.breaking_changes().map(describe_change).collect()
    };

    Ok(ServerSummary {
        version: Some(snapshot.version.clone()),
        tool_count: Some(snapshot.tools.len()),
        change_count: diff.changes.len(),
        breaking_changes,
        report_path: report_path.map(|p| p.display().to_string()),
        ..ServerSummary::new(server, status)
    })
}

/// Diffs `snapshot` against `previous`. Matching fingerprints skip the
/// full comparison.
fn diff_against(previous: &Snapshot, snapshot: &Snapshot) -> Result<DiffSummary> {
    if schema_fingerprint(previous)? == schema_fingerprint(snapshot)? {
        return Ok(DiffSummary::default());
    }
    Ok(diff_snapshots(previous, snapshot))
}

/// One-line description of a change.
#[must_use]
pub fn describe_change(change: &ToolChange) -> String {
    match change {
        ToolChange::ToolAdded { tool_name } => format!("added tool '{tool_name}'"),
        ToolChange::ToolRemoved { tool_name } => format!("removed tool '{tool_name}'"),
        ToolChange::ToolChanged { tool_name, fields } => {
            format!("changed tool '{tool_name}' ({})", fields.join(", "))
        }
        ToolChange::ToolDescriptionChanged { tool_name } => {
            format!("description changed for tool '{tool_name}'")
        }
    }
}

/// Human-readable summary for `--format pretty`.
#[must_use]
pub fn render_summary(report: &SyncReport) -> String {
    let mut out = String::new();

    for server in &report.servers {
        let detail = match (server.tool_count, &server.version) {
            (Some(tools), Some(version)) => format!(" {version}, {tools} tools"),
            _ => String::new(),
        };
        let line = match server.status {
            ServerStatus::New => format!("{} {}{detail}: generated", "✓".green(), server.server.bold()),
            ServerStatus::Updated => format!(
                "{} {}{detail}: {} changes",
                "✓".green(),
                server.server.bold(),
                server.change_count
            ),
            ServerStatus::Unchanged => format!("{} {}{detail}: unchanged", "✓".green(), server.server.bold()),
            ServerStatus::InSync => format!("{} {}{detail}: in sync", "✓".green(), server.server.bold()),
            ServerStatus::OutOfSync => format!("{} {}{detail}: out of sync", "!".yellow(), server.server.bold()),
            ServerStatus::Failed => format!(
                "{} {}: {}",
                "✗".red(),
                server.server.bold(),
                server.error.as_deref().unwrap_or("failed")
            ),
        };
        let _ = writeln!(out, "{line}");
    }

    let breaking: Vec<_> = report
        .servers
        .iter()
        .filter(|s| !s.breaking_changes.is_empty())
        .collect();
    if !breaking.is_empty() {
        let _ = writeln!(out, "\n{}", "Breaking changes:".yellow().bold());
        for server in breaking {
            for change in &server.breaking_changes {
                let _ = writeln!(out, "  {}: {change}", server.server);
            }
        }
    }

    let failed = report.servers.iter().filter(|s| s.status == ServerStatus::Failed).count();
    let ok = report.servers.len() - failed;
    let _ = write!(out, "\n{ok} succeeded, {failed} failed");
    if report.check {
        let stale = report
            .servers
            .iter()
            .filter(|s| s.status == ServerStatus::OutOfSync)
            .count();
        let _ = write!(out, ", {stale} out of sync");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcp_toolbox_core::TransportConfig;

    fn server_config(name: &str) -> ServerConfig {
        ServerConfig {
            name: name.to_string(),
            transport: TransportConfig::Http {
                url: "https://example.com/mcp".to_string(),
                headers: std::collections::BTreeMap::new(),
                auth: None,
            },
        }
    }

    fn summary(name: &str, status: ServerStatus) -> ServerSummary {
        ServerSummary::new(&server_config(name), status)
    }

    fn report(check: bool, servers: Vec<ServerSummary>) -> SyncReport {
        SyncReport {
            check,
            out_dir: "out".to_string(),
            servers,
            catalog_path: None,
            readme_path: None,
        }
    }

    #[test]
    fn test_exit_code_follows_statuses() {
        let ok = report(
            false,
            vec![summary("a", ServerStatus::Updated), summary("b", ServerStatus::Unchanged)],
        );
        assert_eq!(ok.exit_code(), ExitCode::SUCCESS);

        let failed = report(false, vec![summary("a", ServerStatus::Updated), summary("b", ServerStatus::Failed)]);
        assert_eq!(failed.exit_code(), ExitCode::ERROR);

        let stale = report(true, vec![summary("a", ServerStatus::InSync), summary("b", ServerStatus::OutOfSync)]);
        assert_eq!(stale.exit_code(), ExitCode::ERROR);
    }

    #[test]
    fn test_describe_change() {
        let change = ToolChange::ToolChanged {
            tool_name: "search".to_string(),
            fields: vec!["inputSchema.required".to_string(), "inputSchema.properties.q.type".to_string()],
        };
        assert_eq!(
            describe_change(&change),
            "changed tool 'search' (inputSchema.required, inputSchema.properties.q.type)"
        );
        assert_eq!(
            describe_change(&ToolChange::ToolRemoved {
                tool_name: "old".to_string()
            }),
            "removed tool 'old'"
        );
    }

    #[test]
    fn test_render_summary_lists_breaking_changes_and_totals() {
        colored::control::set_override(false);
        let mut updated = summary("GitHub", ServerStatus::Updated);
        updated.version = Some("2.0.0".to_string());
        updated.tool_count = Some(3);
        updated.change_count = 2;
        updated.breaking_changes = vec!["removed tool 'old'".to_string()];
        let mut failed = summary("local", ServerStatus::Failed);
        failed.error = Some("stdio disabled".to_string());

        let text = render_summary(&report(false, vec![updated, failed]));
        assert_eq!(
            text,
            "✓ GitHub 2.0.0, 3 tools: 2 changes\n\
             ✗ local: stdio disabled\n\
             \n\
             Breaking changes:\n  GitHub: removed tool 'old'\n\
             \n\
             1 succeeded, 1 failed"
        );
    }

    #[test]
    fn test_render_summary_check_counts_stale_servers() {
        colored::control::set_override(false);
        let text = render_summary(&report(
            true,
            vec![summary("a", ServerStatus::InSync), summary("b", ServerStatus::OutOfSync)],
        ));
        assert!(text.contains("✓ a: in sync"));
        assert!(text.contains("! b: out of sync"));
        assert!(text.ends_with("2 succeeded, 0 failed, 1 out of sync"));
    }

    #[test]
    fn test_failed_generation_does_not_record_snapshot() {
        use mcp_toolbox_introspector::{ToolDefinition, TransportDescriptor};
        use serde_json::json;

        let dir = tempfile::TempDir::new().unwrap();
        let out_dir = dir.path().join("generated");
        std::fs::create_dir_all(&out_dir).unwrap();
        std::fs::write(out_dir.join("servers"), "not a directory").unwrap();

        let server = server_config("Docs");
        let loaded = LoadedConfig {
            path: dir.path().join("mcp-toolbox.config.json"),
            config: Arc::new(
                mcp_toolbox_core::ToolboxConfig::from_json_str(
                    r#"{
                        "servers": [],
                        "generation": {"outDir": "generated", "language": "ts"},
                        "security": {"allowStdioExec": false, "envAllowlist": []}
                    }"#,
                )
                .unwrap(),
            ),
            out_dir: out_dir.clone(),
        };
        let snapshot = Snapshot {
            server_name: "Docs".to_string(),
            version: "1.0.0".to_string(),
            retrieved_at: "2025-01-01T00:00:00.000Z".to_string(),
            transport: TransportDescriptor::StreamableHttp {
                url: "https://example.com/mcp".to_string(),
            },
            tools: vec![ToolDefinition::new("search", "", json!({"type": "object"}))],
        };
        let store = SnapshotStore::new(&out_dir);
        let generator = CodeGenerator::new().unwrap();

        let result = write_server(
            &loaded,
            &store,
            &generator,
            &server,
            &snapshot,
            SyncOptions::default(),
        );

        assert!(result.is_err());
        assert!(store.read_latest("Docs").is_none());
        assert!(!store.server_dir("Docs").exists());
    }

    #[test]
    fn test_diff_skips_volatile_fields_and_reports_changes() {
        use mcp_toolbox_introspector::{ToolDefinition, TransportDescriptor};
        use serde_json::json;

        let snapshot = Snapshot {
            server_name: "docs".to_string(),
            version: "1.0.0".to_string(),
            retrieved_at: "2025-01-01T00:00:00.000Z".to_string(),
            transport: TransportDescriptor::StreamableHttp {
                url: "https://example.com/mcp".to_string(),
            },
            tools: vec![
                ToolDefinition::new("a", "", json!({})),
                ToolDefinition::new("b", "", json!({})),
            ],
        };

        let mut later = snapshot.clone();
        later.retrieved_at = "2025-02-01T00:00:00.000Z".to_string();
        assert!(diff_against(&snapshot, &later).unwrap().is_empty());

        later.tools.pop();
        let diff = diff_against(&snapshot, &later).unwrap();
        assert!(diff.breaking);
        assert_eq!(describe_change(&diff.changes[0]), "removed tool 'b'");
    }
}
