//! Seams between the pool and live MCP connections.
//!
//! The pool only knows how to build a [`ToolClient`] through a
//! [`Connector`] and how to close it, which keeps pool behaviour testable
//! without spawning processes.

use async_trait::async_trait;
use mcp_toolbox_core::{Result, ServerId, ToolName};
use serde_json::Value;
use std::sync::Arc;

/// JSON object passed as tool arguments.
pub type JsonObject = serde_json::Map<String, Value>;

/// A live, initialized connection to one MCP server.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ToolClient: Send + Sync {
    /// Calls `tool` and returns the raw result as JSON.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionFailed`](mcp_toolbox_core::Error::ConnectionFailed)
    ///   when the transport is broken; the connection should be discarded
    /// - [`Error::ProtocolError`](mcp_toolbox_core::Error::ProtocolError)
    ///   when the server rejected the request
    async fn call_tool(&self, tool: &ToolName, arguments: Option<JsonObject>) -> Result<Value>;

    /// Shuts the connection down.
    ///
    /// # Errors
    ///
    /// Returns error if shutdown did not complete cleanly. Callers treat this
    /// as best-effort.
    async fn close(&self) -> Result<()>;
}

/// Builds connections for the pool.
///
/// Called once per construction; the pool guarantees no two constructions
/// for the same server overlap.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connects to `server` and completes the MCP handshake.
    ///
    /// # Errors
    ///
    /// Returns error if the server is unknown, blocked by policy, or
    /// unreachable.
    async fn connect(&self, server: &ServerId) -> Result<Arc<dyn ToolClient>>;
}
