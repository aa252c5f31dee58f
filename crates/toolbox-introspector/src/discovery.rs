//! Tool discovery.
//!
//! [`Introspector`] connects to one server, lists its tools and returns a
//! [`Snapshot`]. The session is always cancelled before returning, whether
//! listing succeeded or not.

use crate::transport::{McpClient, close_client, connect, prepare_transport};
use crate::types::{Snapshot, ToolDefinition, snapshot_version};
use mcp_toolbox_core::{AuthResolver, Error, Result, SecurityConfig, ServerConfig, clock};
use std::sync::Arc;
use tracing::{debug, info};

/// Discovers the tool surface of MCP servers.
///
/// # Examples
///
/// ```no_run
/// use mcp_toolbox_core::{EnvAuthResolver, ToolboxConfig};
/// use mcp_toolbox_introspector::Introspector;
/// use std::path::Path;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ToolboxConfig::load(Path::new("mcp-toolbox.config.json"))?;
/// let introspector = Introspector::new(Arc::new(EnvAuthResolver::new()));
///
/// let snapshot = introspector
///     .introspect(&config.servers[0], &config.security)
///     .await?;
/// println!("{} exposes {} tools", snapshot.server_name, snapshot.tools.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Introspector {
    resolver: Arc<dyn AuthResolver>,
}

impl Introspector {
    /// Creates an introspector that resolves tokens through `resolver`.
    #[must_use]
    pub fn new(resolver: Arc<dyn AuthResolver>) -> Self {
        Self { resolver }
    }

    /// Connects to `server`, lists its tools and disconnects.
    ///
    /// # Errors
    ///
    /// - [`Error::SecurityViolation`] if `server` is stdio and execution is
    ///   disabled; nothing is spawned in that case
    /// - [`Error::ConfigError`] for an unusable transport declaration
    /// - [`Error::ConnectionFailed`] if the connection or handshake fails
    /// - [`Error::ProtocolError`] if tool listing fails
    pub async fn introspect(
        &self,
        server: &ServerConfig,
        security: &SecurityConfig,
    ) -> Result<Snapshot> {
        let prepared = prepare_transport(server, security, self.resolver.as_ref())?;
        let transport = prepared.descriptor();

        info!(server = %server.name, transport = transport.kind(), "introspecting server");
        let client = connect(&server.name, prepared).await?;

        let listed = list_tools(&server.name, &client).await;
        close_client(&server.name, client).await;
        let (version, tools) = listed?;

        info!(server = %server.name, version = %version, tools = tools.len(), "introspection complete");
        Ok(Snapshot {
            server_name: server.name.clone(),
            version,
            retrieved_at: clock::now_iso(),
            transport,
            tools,
        })
    }
}

async fn list_tools(server: &str, client: &McpClient) -> Result<(String, Vec<ToolDefinition>)> {
    let reported = client
        .peer_info()
        .map(|info| info.server_info.version.clone());
    let version = snapshot_version(reported.as_deref());

    let listed = client
        .list_all_tools()
        .await
        .map_err(|e| Error::ProtocolError {
            server: server.to_string(),
            message: format!("tools/list failed: {e}"),
            source: Some(Box::new(e)),
        })?;
    debug!(server, count = listed.len(), "received tool list");

    let tools = listed
        .iter()
        .map(|tool| from_rmcp_tool(server, tool))
        .collect::<Result<Vec<_>>>()?;
    Ok((version, tools))
}

/// Converts an rmcp tool into the persisted [`ToolDefinition`] shape.
///
/// Both types share MCP's camelCase wire format, so conversion goes through
/// JSON and ignores fields the snapshot does not record.
///
/// # Errors
///
/// Returns [`Error::SerializationError`] if the tool cannot be represented.
pub fn from_rmcp_tool(server: &str, tool: &rmcp::model::Tool) -> Result<ToolDefinition> {
    serde_json::to_value(tool)
        .and_then(serde_json::from_value)
        .map_err(|e| Error::SerializationError {
            message: format!("server '{server}': tool '{}' has an unreadable definition", tool.name),
            source: Some(e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_rmcp_tool_keeps_schema_and_description() {
        let schema = json!({
            "type": "object",
            "properties": {"path": {"type": "string"}},
            "required": ["path"]
        });
        let tool = rmcp::model::Tool::new(
            "read_file",
            "Read a file",
            Arc::new(schema.as_object().unwrap().clone()),
        );

        let definition = from_rmcp_tool("fs", &tool).unwrap();
        assert_eq!(definition.name, "read_file");
        assert_eq!(definition.description, "Read a file");
        assert_eq!(definition.input_schema, schema);
        assert!(definition.output_schema.is_none());
    }
}
