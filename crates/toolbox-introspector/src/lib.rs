//! MCP server introspection.
//!
//! Connects to configured MCP servers over stdio or streamable HTTP, lists
//! their tools and captures the result as a [`Snapshot`].
//!
//! # Security
//!
//! Stdio servers are only spawned when `security.allowStdioExec` is set, and
//! children receive an explicit environment built from the allowlist rather
//! than inheriting the parent's.

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

pub mod discovery;
pub mod transport;
pub mod types;

pub use discovery::Introspector;
pub use transport::{McpClient, PreparedTransport, close_client, connect, prepare_transport};
pub use types::{FALLBACK_VERSION, Snapshot, ToolDefinition, TransportDescriptor};
