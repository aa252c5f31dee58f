//! rmcp-backed connector and client.
//!
//! Transport preparation (security gate, child environment, auth) is shared
//! with introspection, so a server that can be introspected connects here
//! the same way. Auth is resolved once per connection, not per call.

use crate::client::{Connector, JsonObject, ToolClient};
use async_trait::async_trait;
use mcp_toolbox_core::{AuthResolver, Error, Result, ServerId, ToolName, ToolboxConfig};
use mcp_toolbox_introspector::{McpClient, close_client, connect, prepare_transport};
use rmcp::model::CallToolRequestParam;
use rmcp::service::ServiceError;
use rmcp::{Peer, RoleClient};
use serde_json::Value;
use std::borrow::Cow;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Connects to servers declared in a [`ToolboxConfig`].
pub struct McpConnector {
    config: Arc<ToolboxConfig>,
    resolver: Arc<dyn AuthResolver>,
}

impl McpConnector {
    /// Creates a connector for the servers in `config`.
    #[must_use]
    pub fn new(config: Arc<ToolboxConfig>, resolver: Arc<dyn AuthResolver>) -> Self {
        Self { config, resolver }
    }
}

impl std::fmt::Debug for McpConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpConnector")
            .field("servers", &self.config.servers.len())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Connector for McpConnector {
    async fn connect(&self, server: &ServerId) -> Result<Arc<dyn ToolClient>> {
        let server_config = self
            .config
            .server(server)
            .ok_or_else(|| Error::ResourceNotFound {
                resource: format!("server '{server}'"),
            })?;

        let prepared = prepare_transport(
            server_config,
            &self.config.security,
            self.resolver.as_ref(),
        )?;
        let service = connect(server.as_str(), prepared).await?;

        Ok(Arc::new(McpToolClient::new(server.clone(), service)))
    }
}

/// A live rmcp client session.
pub struct McpToolClient {
    server: ServerId,
    peer: Peer<RoleClient>,
    service: Mutex<Option<McpClient>>,
}

impl McpToolClient {
    /// Wraps a running rmcp service.
    #[must_use]
    pub fn new(server: ServerId, service: McpClient) -> Self {
        Self {
            server,
            peer: service.peer().clone(),
            service: Mutex::new(Some(service)),
        }
    }
}

impl std::fmt::Debug for McpToolClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpToolClient")
            .field("server", &self.server)
            .field("service", &"RunningService{..}")
            .finish()
    }
}

#[async_trait]
impl ToolClient for McpToolClient {
    async fn call_tool(&self, tool: &ToolName, arguments: Option<JsonObject>) -> Result<Value> {
        tracing::debug!("Calling tool {}::{}", self.server, tool);

        let result = self
            .peer
            .call_tool(CallToolRequestParam {
                name: Cow::Owned(tool.as_str().to_owned()),
                arguments,
            })
            .await
            .map_err(|e| call_error(&self.server, tool, e))?;

        serde_json::to_value(&result).map_err(|e| Error::SerializationError {
            message: "Failed to serialize tool result".into(),
            source: Some(e),
        })
    }

    async fn close(&self) -> Result<()> {
        if let Some(service) = self.service.lock().await.take() {
            close_client(self.server.as_str(), service).await;
        }
        Ok(())
    }
}

/// Server-reported errors are tool-level; everything else means the
/// session is unusable.
fn call_error(server: &ServerId, tool: &ToolName, error: ServiceError) -> Error {
    match error {
        ServiceError::McpError(data) => Error::ProtocolError {
            server: server.to_string(),
            message: format!("tool '{tool}' failed: {}", data.message),
            source: None,
        },
        other => Error::ConnectionFailed {
            server: server.to_string(),
            source: Box::new(other),
        },
    }
}
