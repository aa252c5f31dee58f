//! TypeScript wrapper generation for MCP tools.
//!
//! Turns a [`Snapshot`](mcp_toolbox_introspector::Snapshot) into one typed
//! wrapper module per tool plus a server index, and maintains the
//! output-root `catalog.json` and `README.md`.
//!
//! # Architecture
//!
//! - [`typescript`]: JSON Schema to TypeScript mapping and identifier rules
//! - [`template_engine`]: Handlebars with the built-in templates
//! - [`generator`]: per-server rendering and regeneration
//! - [`output`]: whole-directory replacement
//! - [`catalog`]: repository-wide tool listing

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

pub mod catalog;
pub mod generator;
pub mod output;
pub mod template_engine;
pub mod typescript;
mod types;

pub use catalog::{Catalog, CatalogOutcome, CatalogServer, CatalogTool, write_catalog};
pub use generator::{CodeGenerator, INDEX_FILE, RUNTIME_MODULE, SERVERS_DIR, TOOLS_DIR};
pub use template_engine::TemplateEngine;
pub use types::{GeneratedCode, GeneratedFile, IndexContext, ReadmeContext, ToolContext};
