//! Core types, configuration and errors for MCP Toolbox.
//!
//! This crate provides the foundational pieces shared by every other crate
//! in the workspace.
//!
//! # Architecture
//!
//! The core consists of:
//! - Strong domain types (`ServerId`, `ToolName`) and server slugs
//! - The workspace-wide error enum
//! - The configuration model, loader and validation
//! - Auth resolution as an injectable capability
//! - CLI value types (`OutputFormat`, `ExitCode`)
//! - Atomic file writes used by every on-disk artifact

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

mod error;
mod slug;
mod types;

pub mod auth;
pub mod cli;
pub mod clock;
pub mod config;
pub mod fs;

pub use auth::{AuthConfig, AuthResolver, AuthResult, EnvAuthResolver, resolve_auth};
pub use config::{
    CompactionConfig, CompactionStrategy, CompactionThresholds, GenerationConfig, Language,
    SecurityConfig, ServerConfig, ToolboxConfig, TransportConfig,
};
pub use error::{Error, Result};
pub use slug::slugify_server_name;
pub use types::{ServerId, ToolName};
