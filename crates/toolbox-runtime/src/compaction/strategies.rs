//! Compaction strategies.
//!
//! `truncate` and `summarize` rewrite oversized `text` content items in
//! place and leave every other item untouched. `persist_to_file` moves the
//! whole result to disk and returns a pointer to it.
//!
//! Lengths are counted in characters, never bytes, so a cut never lands
//! inside a multi-byte character.

use mcp_toolbox_core::fs::to_pretty_json;
use mcp_toolbox_core::{Error, Result};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Hex characters of the content digest used in persisted file names.
const DIGEST_LEN: usize = 12;

/// Keeps the first `max_chars` characters of `text`.
///
/// Returns `None` when `text` already fits.
///
/// # Examples
///
/// ```
/// use mcp_toolbox_runtime::compaction::truncate_text;
///
/// assert_eq!(
///     truncate_text("0123456789ABCDEF", 10).unwrap(),
///     "0123456789\n\n[... truncated 6 characters. Original: 16 chars]"
/// );
/// assert!(truncate_text("short", 10).is_none());
/// ```
#[must_use]
pub fn truncate_text(text: &str, max_chars: usize) -> Option<String> {
    let len = text.chars().count();
    if len <= max_chars {
        return None;
    }
    let head = &text[..byte_offset(text, max_chars)];
    Some(format!(
        "{head}\n\n[... truncated {} characters. Original: {len} chars]",
        len - max_chars
    ))
}

/// Keeps the first and last `max_chars / 2` characters of `text`.
///
/// Returns `None` when `text` already fits.
///
/// # Examples
///
/// ```
/// use mcp_toolbox_runtime::compaction::summarize_text;
///
/// assert_eq!(
///     summarize_text("abcdefghij", 4).unwrap(),
///     "ab\n\n[... 6 characters omitted ...]\n\nij"
/// );
/// ```
#[must_use]
pub fn summarize_text(text: &str, max_chars: usize) -> Option<String> {
    let len = text.chars().count();
    if len <= max_chars {
        return None;
    }
    let half = max_chars / 2;
    let head = &text[..byte_offset(text, half)];
    let tail = &text[byte_offset(text, len - half)..];
    Some(format!(
        "{head}\n\n[... {} characters omitted ...]\n\n{tail}",
        len - max_chars
    ))
}

/// Applies [`truncate_text`] to every text item of `result`.
///
/// # Errors
///
/// Returns [`Error::CompactionError`] if `result` is not a tool result
/// object.
pub fn truncate(result: &Value, max_chars: usize) -> Result<Value> {
    rewrite_text_items(result, |text| truncate_text(text, max_chars))
}

/// Applies [`summarize_text`] to every text item of `result`.
///
/// # Errors
///
/// Returns [`Error::CompactionError`] if `result` is not a tool result
/// object.
pub fn summarize(result: &Value, max_chars: usize) -> Result<Value> {
    rewrite_text_items(result, |text| summarize_text(text, max_chars))
}

/// Writes `result` to `<dir>/<server>/<tool>/<millis>-<digest>.json` and
/// returns a single-text-item result pointing at the file.
///
/// # Errors
///
/// Returns [`Error::CompactionError`] if serialization or the write fails.
pub fn persist_to_file(result: &Value, dir: &Path, server: &str, tool: &str) -> Result<Value> {
    let body = to_pretty_json(result).map_err(compaction_error)?;
    let digest = blake3::hash(body.as_bytes()).to_hex();
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis());

    let path: PathBuf = dir
        .join(path_segment(server))
        .join(path_segment(tool))
        .join(format!("{millis}-{}.json", &digest[..DIGEST_LEN]));
    mcp_toolbox_core::fs::write_atomic(&path, body.as_bytes()).map_err(compaction_error)?;

    let display = path.display();
    let pointer = format!(
        "[Large output compacted to file]\n\nFile: {display}\nSize: {} bytes\nServer: {server}\nTool: {tool}\n\nTo retrieve: cat {display}",
        body.len()
    );
    let is_error = result
        .get("isError")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    Ok(json!({
        "content": [{"type": "text", "text": pointer}],
        "isError": is_error,
    }))
}

fn rewrite_text_items<F>(result: &Value, rewrite: F) -> Result<Value>
where
    F: Fn(&str) -> Option<String>,
{
    if !result.is_object() {
        return Err(Error::CompactionError {
            message: "tool result is not a JSON object".to_string(),
            source: None,
        });
    }

    let mut compacted = result.clone();
    if let Some(items) = compacted.get_mut("content").and_then(Value::as_array_mut) {
        for item in items {
            if item.get("type").and_then(Value::as_str) != Some("text") {
                continue;
            }
            let replacement = item.get("text").and_then(Value::as_str).and_then(&rewrite);
            if let Some(text) = replacement {
                item["text"] = Value::String(text);
            }
        }
    }
    Ok(compacted)
}

/// Byte offset of the `chars`-th character, or the end of `text`.
fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices().nth(chars).map_or(text.len(), |(i, _)| i)
}

/// Makes a server or tool name safe as a single directory name.
fn path_segment(name: &str) -> String {
    let segment: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if segment.is_empty() {
        "_".to_string()
    } else {
        segment
    }
}

fn compaction_error(e: Error) -> Error {
    Error::CompactionError {
        message: e.to_string(),
        source: Some(Box::new(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let text = "ééééé";
        assert_eq!(
            truncate_text(text, 2).unwrap(),
            "éé\n\n[... truncated 3 characters. Original: 5 chars]"
        );
    }

    #[test]
    fn test_summarize_keeps_head_and_tail() {
        let text: String = "a".repeat(50) + &"b".repeat(50);
        let summary = summarize_text(&text, 10).unwrap();
        assert!(summary.starts_with("aaaaa\n\n[... 90 characters omitted ...]\n\n"));
        assert!(summary.ends_with("bbbbb"));
    }

    #[test]
    fn test_only_text_items_are_rewritten() {
        let result = json!({
            "content": [
                {"type": "text", "text": "0123456789ABCDEF"},
                {"type": "image", "data": "0123456789ABCDEF", "mimeType": "image/png"},
                {"type": "text", "text": "tiny"}
            ],
            "isError": false
        });
        let compacted = truncate(&result, 10).unwrap();

        assert!(compacted["content"][0]["text"]
            .as_str()
            .unwrap()
            .starts_with("0123456789\n\n[... truncated 6"));
        assert_eq!(compacted["content"][1], result["content"][1]);
        assert_eq!(compacted["content"][2]["text"], "tiny");
        assert_eq!(compacted["isError"], false);
    }

    #[test]
    fn test_non_object_result_is_an_error() {
        assert!(truncate(&json!("text"), 10).unwrap_err().is_compaction_error());
        assert!(summarize(&json!([1, 2]), 10).unwrap_err().is_compaction_error());
    }

    #[test]
    fn test_result_without_content_is_unchanged() {
        let result = json!({"structuredContent": {"a": 1}});
        assert_eq!(truncate(&result, 1).unwrap(), result);
    }

    #[test]
    fn test_persist_to_file_writes_pointer() {
        let dir = TempDir::new().unwrap();
        let result = json!({
            "content": [{"type": "text", "text": "x".repeat(100)}],
            "isError": true
        });

        let pointer = persist_to_file(&result, dir.path(), "io.github/fs", "read file").unwrap();
        let text = pointer["content"][0]["text"].as_str().unwrap();
        assert_eq!(pointer["isError"], true);
        assert!(text.starts_with("[Large output compacted to file]\n\nFile: "));
        assert!(text.contains("\nServer: io.github/fs\nTool: read file\n"));

        let file_line = text.lines().find(|l| l.starts_with("File: ")).unwrap();
        let path = PathBuf::from(file_line.trim_start_matches("File: "));
        assert!(path.starts_with(dir.path().join("io_github_fs").join("read_file")));

        let stored: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(stored, result);

        let name = path.file_stem().unwrap().to_string_lossy().to_string();
        let (millis, digest) = name.split_once('-').unwrap();
        assert!(millis.parse::<u128>().is_ok());
        assert_eq!(digest.len(), DIGEST_LEN);
    }

    #[test]
    fn test_persist_to_file_reports_unwritable_dir() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "file, not a directory").unwrap();

        let err = persist_to_file(&json!({"content": []}), &blocker, "s", "t").unwrap_err();
        assert!(err.is_compaction_error());
    }
}
