//! Tool invocation through the pool.

use crate::compaction::{CompactionContext, compact_if_needed};
use crate::pool::ConnectionPoolManager;
use mcp_toolbox_core::{Error, Result, ServerId, ToolName, ToolboxConfig};
use serde_json::Value;
use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::Arc;

/// Calls tools on configured servers.
///
/// Every call checks a connection out of the shared pool and always returns
/// it, whatever the outcome. Content-bearing results pass through response
/// compaction when it is configured.
#[derive(Debug, Clone)]
pub struct ToolRuntime {
    config: Arc<ToolboxConfig>,
    pool: Arc<ConnectionPoolManager>,
    out_dir: PathBuf,
}

impl ToolRuntime {
    /// Creates a runtime. Persisted compaction output defaults to
    /// `generation.outDir`; see [`with_out_dir`](Self::with_out_dir).
    #[must_use]
    pub fn new(config: Arc<ToolboxConfig>, pool: Arc<ConnectionPoolManager>) -> Self {
        let out_dir = config.generation.out_dir.clone();
        Self {
            config,
            pool,
            out_dir,
        }
    }

    /// Overrides the output directory used for persisted compaction files.
    #[must_use]
    pub fn with_out_dir(mut self, out_dir: impl Into<PathBuf>) -> Self {
        self.out_dir = out_dir.into();
        self
    }

    /// The shared pool.
    #[must_use]
    pub const fn pool(&self) -> &Arc<ConnectionPoolManager> {
        &self.pool
    }

    /// Calls `tool` on `server` with `input` as arguments.
    ///
    /// A transport-level failure discards the connection so the next call
    /// reconnects. Failures are not retried.
    ///
    /// # Errors
    ///
    /// - [`Error::ResourceNotFound`] if `server` is not configured
    /// - [`Error::ValidationError`] if `input` is neither an object nor null
    /// - Pool errors ([`Error::PoolTimeout`], [`Error::PoolClosed`]) and
    ///   connection errors
    /// - [`Error::ProtocolError`] if the server rejects the call
    pub async fn call_tool(&self, server: &ServerId, tool: &ToolName, input: Value) -> Result<Value> {
        if self.config.server(server).is_none() {
            return Err(Error::ResourceNotFound {
                resource: format!("server '{server}'"),
            });
        }

        let arguments = match input {
            Value::Object(map) => Some(map),
            Value::Null => None,
            other => {
                return Err(Error::ValidationError {
                    field: "input".to_string(),
                    reason: format!("expected a JSON object, got {}", json_kind(&other)),
                });
            }
        };

        let resource = self.pool.acquire(server).await?;
        let result = match resource.call_tool(tool, arguments).await {
            Ok(result) => {
                self.pool.release(resource);
                result
            }
            Err(e) if e.is_transport_failure() => {
                tracing::warn!(server = %server, tool = %tool, error = %e, "transport failed during tool call");
                self.pool.discard(resource).await;
                return Err(e);
            }
            Err(e) => {
                self.pool.release(resource);
                return Err(e);
            }
        };

        if !has_content(&result) {
            return Ok(result);
        }
        Ok(self.compact(server, tool, result))
    }

    /// Applies compaction, falling back to `result` if a strategy fails.
    fn compact(&self, server: &ServerId, tool: &ToolName, result: Value) -> Value {
        let context = CompactionContext::for_out_dir(server.as_str(), tool.as_str(), &self.out_dir);
        let compacted = match compact_if_needed(&result, self.config.compaction.as_ref(), &context) {
            Ok(outcome) => match outcome.result {
                Cow::Owned(value) => Some(value),
                Cow::Borrowed(_) => None,
            },
            Err(e) => {
                tracing::warn!(
                    server = %server,
                    tool = %tool,
                    error = %e,
                    "compaction failed, returning original result"
                );
                None
            }
        };
        compacted.unwrap_or(result)
    }
}

fn has_content(result: &Value) -> bool {
    result.get("content").is_some_and(Value::is_array)
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{Connector, MockToolClient, ToolClient};
    use crate::pool::{PoolOptions, PoolState};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Hands out pre-built mocks in order.
    struct QueueConnector {
        clients: Mutex<Vec<MockToolClient>>,
    }

    #[async_trait]
    impl Connector for QueueConnector {
        async fn connect(&self, server: &ServerId) -> Result<Arc<dyn ToolClient>> {
            let next = self.clients.lock().unwrap().pop();
            next.map(|client| Arc::new(client) as Arc<dyn ToolClient>)
                .ok_or_else(|| Error::ConnectionFailed {
                    server: server.to_string(),
                    source: "no more clients".into(),
                })
        }
    }

    fn config(out_dir: &std::path::Path, compaction: &str) -> Arc<ToolboxConfig> {
        let json = format!(
            r#"{{
                "servers": [{{"name": "fs", "transport": {{"type": "http", "url": "https://example.com/mcp"}}}}],
                "generation": {{"outDir": {out}, "language": "ts"}},
                "security": {{"allowStdioExec": false, "envAllowlist": []}}
                {compaction}
            }}"#,
            out = Value::String(out_dir.display().to_string()),
        );
        Arc::new(ToolboxConfig::from_json_str(&json).unwrap())
    }

    fn runtime(config: Arc<ToolboxConfig>, mut clients: Vec<MockToolClient>) -> ToolRuntime {
        clients.reverse();
        let connector = Arc::new(QueueConnector {
            clients: Mutex::new(clients),
        });
        let pool = Arc::new(ConnectionPoolManager::new(connector, PoolOptions::default()));
        ToolRuntime::new(config, pool)
    }

    fn text_result(text: &str) -> Value {
        json!({"content": [{"type": "text", "text": text}], "isError": false})
    }

    fn client_returning(result: Value) -> MockToolClient {
        let mut client = MockToolClient::new();
        client
            .expect_call_tool()
            .returning(move |_, _| Ok(result.clone()));
        client.expect_close().returning(|| Ok(()));
        client
    }

    #[tokio::test]
    async fn test_call_forwards_arguments_and_releases() {
        let dir = TempDir::new().unwrap();
        let mut client = MockToolClient::new();
        client
            .expect_call_tool()
            .withf(|tool, args| {
                tool.as_str() == "read"
                    && args.as_ref().is_some_and(|a| a.get("path") == Some(&json!("/etc/hosts")))
            })
            .times(1)
            .returning(|_, _| Ok(json!({"content": []})));
        let runtime = runtime(config(dir.path(), ""), vec![client]);
        let server = ServerId::new("fs");

        let result = runtime
            .call_tool(&server, &ToolName::new("read"), json!({"path": "/etc/hosts"}))
            .await
            .unwrap();

        assert_eq!(result, json!({"content": []}));
        assert_eq!(runtime.pool().state(&server).await, PoolState::Ready);
    }

    #[tokio::test]
    async fn test_unknown_server_and_bad_input() {
        let dir = TempDir::new().unwrap();
        let runtime = runtime(config(dir.path(), ""), vec![]);

        let err = runtime
            .call_tool(&ServerId::new("nope"), &ToolName::new("t"), Value::Null)
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let err = runtime
            .call_tool(&ServerId::new("fs"), &ToolName::new("t"), json!([1]))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ValidationError { .. }));
        assert_eq!(runtime.pool().stats().constructions, 0);
    }

    #[tokio::test]
    async fn test_transport_failure_discards_connection() {
        let dir = TempDir::new().unwrap();
        let mut broken = MockToolClient::new();
        broken.expect_call_tool().times(1).returning(|_, _| {
            Err(Error::ConnectionFailed {
                server: "fs".to_string(),
                source: "pipe closed".into(),
            })
        });
        broken.expect_close().times(1).returning(|| Ok(()));
        let healthy = client_returning(json!({"content": []}));

        let runtime = runtime(config(dir.path(), ""), vec![broken, healthy]);
        let server = ServerId::new("fs");
        let tool = ToolName::new("t");

        assert!(runtime.call_tool(&server, &tool, Value::Null).await.unwrap_err().is_connection_error());
        assert_eq!(runtime.pool().state(&server).await, PoolState::Uninitialized);

        assert!(runtime.call_tool(&server, &tool, Value::Null).await.is_ok());
        assert_eq!(runtime.pool().stats().constructions, 2);
    }

    #[tokio::test]
    async fn test_tool_failure_keeps_connection() {
        let dir = TempDir::new().unwrap();
        let mut client = MockToolClient::new();
        client.expect_call_tool().times(2).returning(|_, _| {
            Err(Error::ProtocolError {
                server: "fs".to_string(),
                message: "unknown tool".to_string(),
                source: None,
            })
        });
        let runtime = runtime(config(dir.path(), ""), vec![client]);
        let server = ServerId::new("fs");

        for _ in 0..2 {
            let err = runtime
                .call_tool(&server, &ToolName::new("t"), Value::Null)
                .await
                .unwrap_err();
            assert!(err.is_protocol_error());
        }
        assert_eq!(runtime.pool().stats().constructions, 1);
        assert_eq!(runtime.pool().state(&server).await, PoolState::Ready);
    }

    #[tokio::test]
    async fn test_oversized_result_is_truncated() {
        let dir = TempDir::new().unwrap();
        let compaction = r#", "compaction": {"enabled": true, "strategy": "truncate", "thresholds": {"bytes": 10}, "truncateLength": 10}"#;
        let client = client_returning(text_result("0123456789ABCDEF"));
        let runtime = runtime(config(dir.path(), compaction), vec![client]);

        let result = runtime
            .call_tool(&ServerId::new("fs"), &ToolName::new("t"), Value::Null)
            .await
            .unwrap();
        assert_eq!(
            result["content"][0]["text"],
            "0123456789\n\n[... truncated 6 characters. Original: 16 chars]"
        );
    }

    #[tokio::test]
    async fn test_compaction_failure_returns_original() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();
        let compaction = format!(
            r#", "compaction": {{"enabled": true, "strategy": "persist-to-file", "thresholds": {{"bytes": 1}}, "persistDir": {}}}"#,
            Value::String(blocker.display().to_string())
        );
        let original = text_result(&"x".repeat(64));
        let client = client_returning(original.clone());
        let runtime = runtime(config(dir.path(), &compaction), vec![client]);

        let result = runtime
            .call_tool(&ServerId::new("fs"), &ToolName::new("t"), Value::Null)
            .await
            .unwrap();
        assert_eq!(result, original);
    }

    #[tokio::test]
    async fn test_results_without_content_skip_compaction() {
        let dir = TempDir::new().unwrap();
        let compaction = r#", "compaction": {"enabled": true, "strategy": "truncate", "thresholds": {"bytes": 1}, "truncateLength": 1}"#;
        let raw = json!({"structuredContent": {"long": "x".repeat(100)}});
        let runtime = runtime(config(dir.path(), compaction), vec![client_returning(raw.clone())]);

        let result = runtime
            .call_tool(&ServerId::new("fs"), &ToolName::new("t"), Value::Null)
            .await
            .unwrap();
        assert_eq!(result, raw);
    }
}
