//! Output formatters for CLI commands.
//!
//! `json` is indented JSON, `text` is single-line JSON for piping, and
//! `pretty` is a colored outline meant for terminals.

use anyhow::Result;
use colored::Colorize;
use mcp_toolbox_core::cli::OutputFormat;
use serde::Serialize;
use serde_json::Value;
use std::fmt::Write;

/// Formats `data` in `format`.
///
/// # Errors
///
/// Returns an error if `data` cannot be serialized.
///
/// # Examples
///
/// ```
/// use mcp_toolbox_cli::formatters::format_output;
/// use mcp_toolbox_core::cli::OutputFormat;
/// use serde_json::json;
///
/// let output = format_output(&json!({"server": "github"}), OutputFormat::Text)?;
/// assert_eq!(output, r#"{"server":"github"}"#);
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn format_output<T: Serialize>(data: &T, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(data)?),
        OutputFormat::Text => Ok(serde_json::to_string(data)?),
        OutputFormat::Pretty => {
            let value = serde_json::to_value(data)?;
            let mut out = String::new();
            outline(&value, 0, &mut out);
            Ok(out.trim_end().to_string())
        }
    }
}

/// Formats a `tools/call` result.
///
/// In `pretty` mode text content is printed verbatim, one block per item,
/// so compacted-output pointers and plain answers read naturally. Other
/// formats behave like [`format_output`].
///
/// # Errors
///
/// Returns an error if the result cannot be serialized.
pub fn format_tool_result(result: &Value, format: OutputFormat) -> Result<String> {
    if format != OutputFormat::Pretty {
        return format_output(result, format);
    }
    let Some(content) = result.get("content").and_then(Value::as_array) else {
        return format_output(result, format);
    };

    let mut blocks = Vec::with_capacity(content.len());
    for item in content {
        match (item.get("type").and_then(Value::as_str), item.get("text").and_then(Value::as_str)) {
            (Some("text"), Some(text)) => blocks.push(text.to_string()),
            _ => blocks.push(format_output(item, format)?),
        }
    }

    let mut out = blocks.join("\n\n");
    if result.get("isError").and_then(Value::as_bool) == Some(true) {
        out = format!("{}\n{out}", "Tool reported an error:".red().bold());
    }
    Ok(out)
}

fn outline(value: &Value, depth: usize, out: &mut String) {
    let pad = "  ".repeat(depth);
    match value {
        Value::Object(map) if map.is_empty() => {
            let _ = writeln!(out, "{pad}{}", "{}".dimmed());
        }
        Value::Object(map) => {
            for (key, child) in map {
                if is_scalar(child) {
                    let _ = writeln!(out, "{pad}{}: {}", key.blue().bold(), scalar(child));
                } else {
                    let _ = writeln!(out, "{pad}{}:", key.blue().bold());
                    outline(child, depth + 1, out);
                }
            }
        }
        Value::Array(items) if items.is_empty() => {
            let _ = writeln!(out, "{pad}{}", "[]".dimmed());
        }
        Value::Array(items) => {
            for item in items {
                if is_scalar(item) {
                    let _ = writeln!(out, "{pad}- {}", scalar(item));
                } else {
                    let _ = writeln!(out, "{pad}-");
                    outline(item, depth + 1, out);
                }
            }
        }
        other => {
            let _ = writeln!(out, "{pad}{}", scalar(other));
        }
    }
}

fn is_scalar(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => true,
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::Null => "null".dimmed().to_string(),
        Value::Bool(b) => b.to_string().yellow().to_string(),
        Value::Number(n) => n.to_string().cyan().to_string(),
        Value::String(s) => s.green().to_string(),
        Value::Array(_) => "[]".dimmed().to_string(),
        Value::Object(_) => "{}".dimmed().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Summary {
        server: String,
        tools: usize,
        breaking: bool,
    }

    fn summary() -> Summary {
        Summary {
            server: "github".to_string(),
            tools: 3,
            breaking: false,
        }
    }

    #[test]
    fn test_json_is_indented() {
        let output = format_output(&summary(), OutputFormat::Json).unwrap();
        assert!(output.contains("\n  \"server\": \"github\""));
    }

    #[test]
    fn test_text_is_single_line() {
        let output = format_output(&summary(), OutputFormat::Text).unwrap();
        assert_eq!(output, r#"{"server":"github","tools":3,"breaking":false}"#);
    }

    #[derive(Serialize)]
    struct Nested {
        server: String,
        changes: Vec<String>,
        paths: Paths,
        failures: Vec<String>,
    }

    #[derive(Serialize)]
    struct Paths {
        catalog: String,
    }

    #[test]
    fn test_pretty_outline() {
        colored::control::set_override(false);
        let value = Nested {
            server: "github".to_string(),
            changes: vec!["added `search`".to_string()],
            paths: Paths {
                catalog: "out/catalog.json".to_string(),
            },
            failures: vec![],
        };

        let output = format_output(&value, OutputFormat::Pretty).unwrap();
        for line in [
            "server: github",
            "changes:\n  - added `search`",
            "paths:\n  catalog: out/catalog.json",
            "failures: []",
        ] {
            assert!(output.contains(line), "missing {line:?} in {output}");
        }
    }

    #[test]
    fn test_tool_result_pretty_prints_text_blocks() {
        colored::control::set_override(false);
        let result = json!({
            "content": [
                {"type": "text", "text": "first"},
                {"type": "image", "mimeType": "image/png", "data": "AAAA"}
            ],
            "isError": false
        });

        let output = format_tool_result(&result, OutputFormat::Pretty).unwrap();
        assert!(output.starts_with("first\n\n"));
        assert!(output.contains("mimeType: image/png"));
    }

    #[test]
    fn test_tool_result_error_is_flagged() {
        colored::control::set_override(false);
        let result = json!({"content": [{"type": "text", "text": "boom"}], "isError": true});

        let output = format_tool_result(&result, OutputFormat::Pretty).unwrap();
        assert_eq!(output, "Tool reported an error:\nboom");
    }

    #[test]
    fn test_tool_result_json_is_untouched() {
        let result = json!({"content": [{"type": "text", "text": "x"}]});
        let output = format_tool_result(&result, OutputFormat::Text).unwrap();
        assert_eq!(output, serde_json::to_string(&result).unwrap());
    }
}
