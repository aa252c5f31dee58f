//! Strong domain types for MCP Toolbox.
//!
//! Newtypes keep server identities and tool names from being mixed up with
//! other strings as they flow from configuration through the pool and
//! the code generator.
//!
//! # Examples
//!
//! ```
//! use mcp_toolbox_core::{ServerId, ToolName};
//!
//! let server = ServerId::new("io.github.acme/files");
//! let tool = ToolName::new("read_file");
//! assert_eq!(server.slug(), "io-github-acme-files");
//! assert_eq!(tool.as_str(), "read_file");
//! ```

use crate::slug::slugify_server_name;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Server identity (newtype over String).
///
/// The declared name of a configured server. Used as the connection pool
/// key; its slug names the snapshot and output directories.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerId(String);

impl ServerId {
    /// Creates a new server identity.
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the server identity as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the filesystem-friendly slug of this identity.
    ///
    /// # Examples
    ///
    /// ```
    /// use mcp_toolbox_core::ServerId;
    ///
    /// assert_eq!(ServerId::new("My Server!").slug(), "my-server");
    /// ```
    #[must_use]
    pub fn slug(&self) -> String {
        slugify_server_name(&self.0)
    }

    /// Consumes the `ServerId` and returns the inner `String`.
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ServerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ServerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Tool name (newtype over String).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolName(String);

impl ToolName {
    /// Creates a new tool name.
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the tool name as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `ToolName` and returns the inner `String`.
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ToolName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ToolName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
