//! Markdown diff reports.

use crate::diff::{DiffSummary, ToolChange};
use std::fmt::Write;

/// Renders a Markdown report of `diff` for one server.
///
/// `old_version` is `None` on the first sync of a server.
///
/// # Examples
///
/// ```
/// use mcp_toolbox_snapshot::{DiffSummary, ToolChange, render_diff_report};
///
/// let diff = DiffSummary {
///     breaking: false,
///     changes: vec![ToolChange::ToolAdded { tool_name: "search".to_string() }],
/// };
/// let report = render_diff_report("github", Some("1.0.0"), "1.1.0", &diff);
///
/// assert!(report.starts_with("# Schema changes: github\n"));
/// assert!(report.contains("- Breaking: no\n"));
/// assert!(report.contains("- Added tool `search`\n"));
/// ```
#[must_use]
pub fn render_diff_report(
    server_name: &str,
    old_version: Option<&str>,
    new_version: &str,
    diff: &DiffSummary,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Schema changes: {server_name}");
    out.push('\n');
    let _ = writeln!(
        out,
        "- Version: {} -> {new_version}",
        old_version.unwrap_or("(none)")
    );
    let _ = writeln!(out, "- Breaking: {}", if diff.breaking { "yes" } else { "no" });
    let _ = writeln!(out, "- Changes: {}", diff.changes.len());
    out.push('\n');
    out.push_str("## Changes\n\n");

    if diff.is_empty() {
        out.push_str("No changes detected.\n");
        return out;
    }

    for change in &diff.changes {
        match change {
            ToolChange::ToolAdded { tool_name } => {
                let _ = writeln!(out, "- Added tool `{tool_name}`");
            }
            ToolChange::ToolRemoved { tool_name } => {
                let _ = writeln!(out, "- **Removed** tool `{tool_name}`");
            }
            ToolChange::ToolChanged { tool_name, fields } => {
                let _ = writeln!(out, "- **Changed** tool `{tool_name}`:");
                for field in fields {
                    let _ = writeln!(out, "  - `{field}`");
                }
            }
            ToolChange::ToolDescriptionChanged { tool_name } => {
                let _ = writeln!(out, "- Description changed for tool `{tool_name}`");
            }
        }
    }
    out
}
