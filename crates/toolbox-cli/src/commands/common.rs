//! Utilities shared across CLI commands.

use anyhow::{Context, Result};
use mcp_toolbox_core::ToolboxConfig;
use mcp_toolbox_core::config::resolve_config_path;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// A validated configuration plus the paths derived from it.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// File the configuration was read from
    pub path: PathBuf,
    /// Parsed and validated configuration
    pub config: Arc<ToolboxConfig>,
    /// Output directory after `--out-dir` and relative-path resolution
    pub out_dir: PathBuf,
}

/// Loads the configuration for a command.
///
/// The path comes from `--config`, then `MCP_TOOLBOX_CONFIG`, then the
/// default file name in the working directory. `out_dir_override` replaces
/// `generation.outDir` when given.
///
/// # Errors
///
/// Returns an error if the file is missing, malformed or invalid.
///
/// # Examples
///
/// ```
/// use mcp_toolbox_cli::commands::common::load_config;
///
/// let dir = tempfile::tempdir()?;
/// let path = dir.path().join("toolbox.json");
/// std::fs::write(
///     &path,
///     r#"{
///         "servers": [],
///         "generation": {"outDir": "generated", "language": "ts"},
///         "security": {"allowStdioExec": false, "envAllowlist": []}
///     }"#,
/// )?;
///
/// let loaded = load_config(Some(&path), None)?;
/// assert_eq!(loaded.out_dir, dir.path().join("generated"));
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn load_config(config_path: Option<&Path>, out_dir_override: Option<PathBuf>) -> Result<LoadedConfig> {
    let path = resolve_config_path(config_path);
    let config = ToolboxConfig::load(&path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))?;

    let out_dir = out_dir_override.unwrap_or_else(|| config.resolve_out_dir(&path));
    debug!(
        config = %path.display(),
        out_dir = %out_dir.display(),
        servers = config.servers.len(),
        "configuration loaded"
    );

    Ok(LoadedConfig {
        path,
        config: Arc::new(config),
        out_dir,
    })
}

/// Renders an error and its causes on one line, outermost first.
///
/// # Examples
///
/// ```
/// use mcp_toolbox_cli::commands::common::describe_error;
/// use mcp_toolbox_core::Error;
///
/// let err = Error::ConnectionFailed {
///     server: "docs".to_string(),
///     source: "connection refused".into(),
/// };
/// assert_eq!(
///     describe_error(&err),
///     "MCP server connection failed: docs: connection refused"
/// );
/// ```
#[must_use]
pub fn describe_error(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !message.contains(&cause_text) {
            message.push_str(": ");
            message.push_str(&cause_text);
        }
        source = cause.source();
    }
    message
}

/// Completes when the process receives SIGINT or SIGTERM (ctrl-c only on
/// non-unix platforms).
pub async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    () = ctrl_c() => {}
                    _ = terminate.recv() => {}
                }
            }
            Err(e) => {
                warn!("Cannot listen for SIGTERM: {e}");
                ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    ctrl_c().await;
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MINIMAL: &str = r#"{
        "servers": [{"name": "docs", "transport": {"type": "http", "url": "https://docs.example.com/mcp"}}],
        "generation": {"outDir": "out", "language": "ts"},
        "security": {"allowStdioExec": false, "envAllowlist": []}
    }"#;

    #[test]
    fn test_load_config_resolves_out_dir_next_to_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("toolbox.json");
        std::fs::write(&path, MINIMAL).unwrap();

        let loaded = load_config(Some(&path), None).unwrap();
        assert_eq!(loaded.path, path);
        assert_eq!(loaded.out_dir, dir.path().join("out"));
        assert_eq!(loaded.config.servers.len(), 1);
    }

    #[test]
    fn test_out_dir_override_wins() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("toolbox.json");
        std::fs::write(&path, MINIMAL).unwrap();

        let loaded = load_config(Some(&path), Some(PathBuf::from("/tmp/elsewhere"))).unwrap();
        assert_eq!(loaded.out_dir, PathBuf::from("/tmp/elsewhere"));
    }

    #[test]
    fn test_missing_config_mentions_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.json");

        let err = load_config(Some(&path), None).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("absent.json"));
        assert!(message.contains("not found"));
    }
}
