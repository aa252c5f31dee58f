//! Connection-pooled MCP tool invocation.
//!
//! # Architecture
//!
//! - [`pool`]: one connection per server, single-flight construction,
//!   FIFO acquisition with a timeout, idempotent shutdown
//! - [`compaction`]: size estimation and the truncate, summarize and
//!   persist-to-file strategies
//! - [`connector`]: rmcp-backed [`Connector`] for configured servers
//! - [`runtime`]: `call_tool` tying the three together
//!
//! # Examples
//!
//! ```no_run
//! use mcp_toolbox_core::{EnvAuthResolver, ServerId, ToolName, ToolboxConfig};
//! use mcp_toolbox_runtime::{ConnectionPoolManager, McpConnector, PoolOptions, ToolRuntime};
//! use serde_json::json;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Arc::new(ToolboxConfig::load(Path::new("mcp-toolbox.config.json"))?);
//! let connector = McpConnector::new(Arc::clone(&config), Arc::new(EnvAuthResolver));
//! let pool = Arc::new(ConnectionPoolManager::new(Arc::new(connector), PoolOptions::default()));
//! let runtime = ToolRuntime::new(config, Arc::clone(&pool));
//!
//! let result = runtime
//!     .call_tool(&ServerId::new("github"), &ToolName::new("search_issues"), json!({"q": "bug"}))
//!     .await?;
//! println!("{result}");
//!
//! pool.close_all().await;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

mod client;
pub mod compaction;
pub mod connector;
pub mod pool;
pub mod runtime;

pub use client::{Connector, JsonObject, ToolClient};
pub use compaction::{CompactionContext, CompactionOutcome, compact_if_needed};
pub use connector::{McpConnector, McpToolClient};
pub use pool::{ConnectionPoolManager, PoolOptions, PoolState, PoolStats, PooledResource};
pub use runtime::ToolRuntime;
