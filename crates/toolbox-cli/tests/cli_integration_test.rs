//! Runs the `mcp-toolbox` binary end to end.
//!
//! Only paths that need no live MCP server are covered: the stdio security
//! gate, config errors and completions.

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn mcp_toolbox(args: &[&str], cwd: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_mcp-toolbox"))
        .args(args)
        .current_dir(cwd)
        .env_remove("MCP_TOOLBOX_CONFIG")
        .env("RUST_LOG", "warn")
        .output()
        .unwrap()
}

fn write_config(dir: &Path) {
    std::fs::write(
        dir.join("mcp-toolbox.config.json"),
        r#"{
            "servers": [{"name": "Local FS", "transport": {"type": "stdio", "command": "local-mcp"}}],
            "generation": {"outDir": "generated", "language": "ts"},
            "security": {"allowStdioExec": false, "envAllowlist": []}
        }"#,
    )
    .unwrap();
}

#[test]
fn test_check_with_disabled_stdio_exits_nonzero_and_writes_nothing() {
    let dir = TempDir::new().unwrap();
    write_config(dir.path());

    let output = mcp_toolbox(&["sync", "--check", "--format", "json"], dir.path());

    assert_eq!(output.status.code(), Some(1));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["check"], true);
    assert_eq!(report["servers"][0]["status"], "failed");
    assert_eq!(report["servers"][0]["slug"], "local-fs");
    assert!(!dir.path().join("generated").exists());
}

#[test]
fn test_sync_records_failure_but_still_writes_catalog() {
    let dir = TempDir::new().unwrap();
    write_config(dir.path());

    let output = mcp_toolbox(&["sync", "--format", "json"], dir.path());

    assert_eq!(output.status.code(), Some(1));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(
        report["servers"][0]["error"]
            .as_str()
            .unwrap()
            .contains("Security policy violation")
    );

    let catalog: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join("generated/catalog.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(catalog["servers"], serde_json::json!([]));
    assert!(dir.path().join("generated/README.md").is_file());
    assert!(!dir.path().join("generated/servers/local-fs").exists());
}

#[test]
fn test_missing_config_is_a_single_line_error() {
    let dir = TempDir::new().unwrap();

    let output = mcp_toolbox(&["sync"], dir.path());

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    let error_lines: Vec<_> = stderr.lines().filter(|l| l.starts_with("Error: ")).collect();
    assert_eq!(error_lines.len(), 1);
    assert!(error_lines[0].contains("mcp-toolbox.config.json"));
}

#[test]
fn test_invalid_format_is_rejected() {
    let dir = TempDir::new().unwrap();
    write_config(dir.path());

    let output = mcp_toolbox(&["sync", "--check", "--format", "yaml"], dir.path());

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8(output.stderr).unwrap().contains("invalid output format"));
}

#[test]
fn test_completions_print_script() {
    let dir = TempDir::new().unwrap();

    let output = mcp_toolbox(&["completions", "bash"], dir.path());

    assert!(output.status.success());
    let script = String::from_utf8(output.stdout).unwrap();
    assert!(script.contains("mcp-toolbox"));
    assert!(script.contains("sync"));
}
