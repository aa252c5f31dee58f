//! Call command implementation.
//!
//! Invokes one tool through the pooled runtime and prints the result,
//! compacted when the configuration asks for it.

use super::common::{load_config, shutdown_signal};
use anyhow::{Context, Result};
use mcp_toolbox_core::cli::{ExitCode, OutputFormat};
use mcp_toolbox_core::{EnvAuthResolver, ServerId, ToolName};
use mcp_toolbox_runtime::{ConnectionPoolManager, McpConnector, PoolOptions, ToolRuntime};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// Parses the `--input` argument; no argument means no arguments.
///
/// # Errors
///
/// Returns an error if `input` is not valid JSON.
///
/// # Examples
///
/// ```
/// use mcp_toolbox_cli::commands::call::parse_input;
/// use serde_json::{Value, json};
///
/// assert_eq!(parse_input(None)?, Value::Null);
/// assert_eq!(parse_input(Some(r#"{"q": "bug"}"#))?, json!({"q": "bug"}));
/// assert!(parse_input(Some("{oops")).is_err());
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn parse_input(input: Option<&str>) -> Result<Value> {
    match input {
        None => Ok(Value::Null),
        Some(raw) => serde_json::from_str(raw).context("--input is not valid JSON"),
    }
}

/// Runs the call command.
///
/// Returns [`ExitCode::ERROR`] when the tool reports `isError`, and
/// [`ExitCode::INTERRUPTED`] when a shutdown signal arrives first. Pooled
/// connections are closed before returning in every case.
///
/// # Errors
///
/// Returns an error if the configuration or input is invalid, or the call
/// itself fails (unknown server, connection, pool or protocol errors).
pub async fn run(
    server: String,
    tool: String,
    input: Option<String>,
    config: Option<PathBuf>,
    output_format: OutputFormat,
) -> Result<ExitCode> {
    let input = parse_input(input.as_deref())?;
    let loaded = load_config(config.as_deref(), None)?;

    let connector = McpConnector::new(Arc::clone(&loaded.config), Arc::new(EnvAuthResolver::new()));
    let pool = Arc::new(ConnectionPoolManager::new(Arc::new(connector), PoolOptions::default()));
    let runtime = ToolRuntime::new(Arc::clone(&loaded.config), Arc::clone(&pool))
        .with_out_dir(&loaded.out_dir);

    let server = ServerId::new(server);
    let tool = ToolName::new(tool);
    let outcome = tokio::select! {
        result = runtime.call_tool(&server, &tool, input) => Some(result),
        () = shutdown_signal() => None,
    };

    let closed = pool.close_all().await;
    debug!(closed, "connection pool shut down");

    let Some(result) = outcome else {
        warn!("Interrupted, connections closed");
        return Ok(ExitCode::INTERRUPTED);
    };
    let result = result.with_context(|| format!("call to {server}::{tool} failed"))?;

    println!("{}", crate::formatters::format_tool_result(&result, output_format)?);

    if result.get("isError").and_then(Value::as_bool) == Some(true) {
        Ok(ExitCode::ERROR)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir) -> PathBuf {
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
        path
    }

    #[test]
    fn test_parse_input_accepts_any_json() {
        assert_eq!(parse_input(Some("[1, 2]")).unwrap(), serde_json::json!([1, 2]));
        let err = parse_input(Some("not json")).unwrap_err();
        assert!(err.to_string().contains("--input"));
    }

    #[tokio::test]
    async fn test_unknown_server_fails() {
        let dir = TempDir::new().unwrap();
        let err = run(
            "ghost".to_string(),
            "t".to_string(),
            None,
            Some(write_config(&dir)),
            OutputFormat::Json,
        )
        .await
        .unwrap_err();

        let message = format!("{err:#}");
        assert!(message.contains("ghost::t"));
        assert!(message.contains("not found"));
    }

    #[tokio::test]
    async fn test_stdio_gate_applies() {
        let dir = TempDir::new().unwrap();
        let err = run(
            "local".to_string(),
            "t".to_string(),
            Some("{}".to_string()),
            Some(write_config(&dir)),
            OutputFormat::Json,
        )
        .await
        .unwrap_err();

        let core = err.downcast_ref::<mcp_toolbox_core::Error>().unwrap();
        assert!(core.is_security_error());
    }
}
