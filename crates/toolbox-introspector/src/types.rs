//! Snapshot data model.
//!
//! These types are persisted verbatim under `.snapshots/`, so their serde
//! shape is part of the on-disk format: camelCase keys and a `kind` tag for
//! the transport descriptor.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Version recorded when the server does not report one.
pub const FALLBACK_VERSION: &str = "latest";

/// How the server was reached when a snapshot was taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum TransportDescriptor {
    /// Child process over stdio.
    #[serde(rename = "stdio")]
    Stdio {
        /// Executable that was spawned
        command: String,
        /// Arguments it was spawned with
        #[serde(default)]
        args: Vec<String>,
    },
    /// Streamable-HTTP endpoint.
    #[serde(rename = "streamable-http")]
    StreamableHttp {
        /// Normalized endpoint URL
        url: String,
    },
    /// Legacy SSE endpoint, accepted when reading older snapshots.
    #[serde(rename = "sse")]
    Sse {
        /// Endpoint URL
        url: String,
    },
}

impl TransportDescriptor {
    /// Short transport label used in logs and reports.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Stdio { .. } => "stdio",
            Self::StreamableHttp { .. } => "streamable-http",
            Self::Sse { .. } => "sse",
        }
    }
}

/// A tool as advertised by a server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// Tool name, unique within a server
    pub name: String,

    /// Human-readable title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Tool description; empty when the server omits it
    #[serde(default)]
    pub description: String,

    /// JSON Schema of the tool arguments
    #[serde(default = "empty_object_schema")]
    pub input_schema: Value,

    /// JSON Schema of structured results
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Value>,

    /// Behavioural hints such as `readOnlyHint`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<Value>,
}

fn empty_object_schema() -> Value {
    serde_json::json!({ "type": "object" })
}

impl ToolDefinition {
    /// Creates a tool with the given name, description and input schema.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            title: None,
            description: description.into(),
            input_schema,
            output_schema: None,
            annotations: None,
        }
    }
}

/// The tool surface of one server at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Configured server name
    pub server_name: String,
    /// Server-reported version, or [`FALLBACK_VERSION`]
    pub version: String,
    /// ISO-8601 UTC retrieval time
    pub retrieved_at: String,
    /// Transport actually used
    pub transport: TransportDescriptor,
    /// Tools in the order the server listed them
    pub tools: Vec<ToolDefinition>,
}

impl Snapshot {
    /// Looks up a tool by name.
    #[must_use]
    pub fn tool(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.iter().find(|tool| tool.name == name)
    }
}

/// Picks the snapshot version from a handshake-reported value.
///
/// # Examples
///
/// ```
/// use mcp_toolbox_introspector::types::snapshot_version;
///
/// assert_eq!(snapshot_version(Some("1.4.0")), "1.4.0");
/// assert_eq!(snapshot_version(Some("  ")), "latest");
/// assert_eq!(snapshot_version(None), "latest");
/// ```
#[must_use]
pub fn snapshot_version(reported: Option<&str>) -> String {
    reported
        .map(str::trim)
        .filter(|version| !version.is_empty())
        .unwrap_or(FALLBACK_VERSION)
        .to_string()
}
