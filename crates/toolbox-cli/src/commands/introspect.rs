//! Introspect command implementation.
//!
//! Connects to configured servers, lists their tools and records the
//! snapshots. Nothing is diffed or generated.

use super::common::{describe_error, load_config};
use anyhow::{Result, bail};
use colored::Colorize;
use mcp_toolbox_core::cli::{ExitCode, OutputFormat};
use mcp_toolbox_core::{EnvAuthResolver, ServerConfig, ServerId};
use mcp_toolbox_introspector::Introspector;
use mcp_toolbox_snapshot::SnapshotStore;
use serde::Serialize;
use std::fmt::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Outcome for one server.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntrospectedServer {
    /// Configured server name
    pub server: String,
    /// Reported version, when introspection succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Number of tools found
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_count: Option<usize>,
    /// Fingerprint recorded in the metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    /// Path of the latest snapshot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_path: Option<String>,
    /// Failure message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Runs the introspect command.
///
/// With `server` set only that server is introspected; otherwise every
/// configured server is, one after another.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or `server` is
/// not configured. Per-server failures are reported in the output and
/// produce [`ExitCode::ERROR`].
pub async fn run(
    config: Option<PathBuf>,
    out_dir: Option<PathBuf>,
    server: Option<String>,
    output_format: OutputFormat,
) -> Result<ExitCode> {
    let loaded = load_config(config.as_deref(), out_dir)?;
    let targets: Vec<&ServerConfig> = match &server {
        Some(name) => match loaded.config.server(&ServerId::new(name.as_str())) {
            Some(found) => vec![found],
            None => bail!("server '{name}' is not configured in {}", loaded.path.display()),
        },
        None => loaded.config.servers.iter().collect(),
    };

    let introspector = Introspector::new(Arc::new(EnvAuthResolver::new()));
    let store = SnapshotStore::new(&loaded.out_dir);
    let mut results = Vec::with_capacity(targets.len());

    for target in targets {
        let outcome = async {
            let snapshot = introspector.introspect(target, &loaded.config.security).await?;
            let written = store.write(&snapshot)?;
            Ok::<_, mcp_toolbox_core::Error>((snapshot, written))
        }
        .await;

        results.push(match outcome {
            Ok((snapshot, written)) => {
                info!(server = %target.name, tools = snapshot.tools.len(), "snapshot recorded");
                IntrospectedServer {
                    server: target.name.clone(),
                    version: Some(snapshot.version),
                    tool_count: Some(snapshot.tools.len()),
                    fingerprint: Some(written.schema_fingerprint),
                    snapshot_path: Some(written.latest_path.display().to_string()),
                    error: None,
                }
            }
            Err(e) => {
                warn!(server = %target.name, error = %e, "introspection failed");
                IntrospectedServer {
                    server: target.name.clone(),
                    version: None,
                    tool_count: None,
                    fingerprint: None,
                    snapshot_path: None,
                    error: Some(describe_error(&e)),
                }
            }
        });
    }

    let output = match output_format {
        OutputFormat::Pretty => render_pretty(&results),
        other => crate::formatters::format_output(&results, other)?,
    };
    println!("{output}");

    if results.iter().any(|r| r.error.is_some()) {
        Ok(ExitCode::ERROR)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn render_pretty(results: &[IntrospectedServer]) -> String {
    let mut out = String::new();
    for result in results {
        match (&result.error, result.tool_count, &result.version) {
            (Some(error), _, _) => {
                let _ = writeln!(out, "{} {}: {error}", "✗".red(), result.server.bold());
            }
            (None, Some(tools), Some(version)) => {
                let _ = writeln!(
                    out,
                    "{} {} {version}: {tools} tools",
                    "✓".green(),
                    result.server.bold()
                );
            }
            _ => {}
        }
    }
    if results.is_empty() {
        out.push_str("No servers configured.");
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_render_pretty_marks_failures() {
        colored::control::set_override(false);
        let results = vec![
            IntrospectedServer {
                server: "docs".to_string(),
                version: Some("1.2.0".to_string()),
                tool_count: Some(4),
                fingerprint: Some("ab".repeat(32)),
                snapshot_path: Some("out/.snapshots/docs/latest.json".to_string()),
                error: None,
            },
            IntrospectedServer {
                server: "local".to_string(),
                version: None,
                tool_count: None,
                fingerprint: None,
                snapshot_path: None,
                error: Some("stdio disabled".to_string()),
            },
        ];

        assert_eq!(
            render_pretty(&results),
            "✓ docs 1.2.0: 4 tools\n✗ local: stdio disabled"
        );
    }

    #[tokio::test]
    async fn test_unknown_server_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("toolbox.json");
        std::fs::write(
            &path,
            r#"{
                "servers": [],
                "generation": {"outDir": "out", "language": "ts"},
                "security": {"allowStdioExec": false, "envAllowlist": []}
            }"#,
        )
        .unwrap();

        let err = run(Some(path), None, Some("ghost".to_string()), OutputFormat::Json)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("'ghost' is not configured"));
    }

    #[tokio::test]
    async fn test_stdio_gate_fails_without_writing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("toolbox.json");
        std::fs::write(
            &path,
            r#"{
                "servers": [{"name": "local", "transport": {"type": "stdio", "command": "local-mcp"}}],
                "generation": {"outDir": "out", "language": "ts"},
                "security": {"allowStdioExec": false, "envAllowlist": []}
            }"#,
        )
        .unwrap();

        let code = run(Some(path), None, None, OutputFormat::Json).await.unwrap();
        assert_eq!(code, ExitCode::ERROR);
        assert!(!dir.path().join("out").exists());
    }
}
