//! Error types for MCP Toolbox.
//!
//! A single error enum is shared by every library crate in the workspace so
//! that per-server failures can be aggregated and reported uniformly.
//!
//! # Examples
//!
//! ```
//! use mcp_toolbox_core::{Error, Result};
//!
//! fn check_out_dir(dir: &str) -> Result<()> {
//!     if dir.is_empty() {
//!         return Err(Error::ConfigError {
//!             message: "generation.outDir cannot be empty".to_string(),
//!         });
//!     }
//!     Ok(())
//! }
//!
//! let err = check_out_dir("").unwrap_err();
//! assert!(err.is_config_error());
//! ```

use thiserror::Error;

/// Main error type for MCP Toolbox.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid or missing configuration.
    ///
    /// Fatal: raised before any network or process I/O happens.
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration problem
        message: String,
    },

    /// Security policy violation.
    ///
    /// Raised when a stdio server is configured but `security.allowStdioExec`
    /// is false. No process is spawned when this error is returned.
    #[error("Security policy violation: {reason}")]
    SecurityViolation {
        /// Description of the security violation
        reason: String,
    },

    /// MCP server connection failed.
    ///
    /// The child process could not be spawned, the endpoint could not be
    /// reached, or the initialize handshake failed.
    #[error("MCP server connection failed: {server}")]
    ConnectionFailed {
        /// Name of the server that failed to connect
        server: String,
        /// Underlying error cause
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A protocol request failed after the connection was established.
    #[error("MCP protocol error from {server}: {message}")]
    ProtocolError {
        /// Name of the server that produced the error
        server: String,
        /// Description of the failed request
        message: String,
        /// Underlying error cause
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Pool acquisition did not complete in time.
    #[error("Timed out after {waited_ms}ms waiting for a connection to {server}")]
    PoolTimeout {
        /// Server whose connection was requested
        server: String,
        /// Time spent waiting, in milliseconds
        waited_ms: u64,
    },

    /// The connection pool has been shut down.
    #[error("Connection pool is closed (requested server: {server})")]
    PoolClosed {
        /// Server whose connection was requested
        server: String,
    },

    /// Response compaction failed.
    ///
    /// Never surfaced by the tool runtime, which falls back to the
    /// uncompacted result.
    #[error("Compaction failed: {message}")]
    CompactionError {
        /// Description of the failure
        message: String,
        /// Underlying error cause
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Resource not found error.
    ///
    /// Occurs when a server, tool or file that was asked for does not exist.
    #[error("Resource not found: {resource}")]
    ResourceNotFound {
        /// Identifier of the missing resource
        resource: String,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {message}")]
    SerializationError {
        /// Description of the serialization failure
        message: String,
        /// Underlying serde error
        #[source]
        source: Option<serde_json::Error>,
    },

    /// Filesystem error.
    #[error("I/O error at {path}: {source}")]
    IoError {
        /// Path involved in the failed operation
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Validation error for domain values.
    #[error("Validation error in {field}: {reason}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Detailed reason for the validation failure
        reason: String,
    },

    /// Code generation failed.
    #[error("Code generation failed for server '{server}': {message}")]
    GenerationError {
        /// Server being generated
        server: String,
        /// Description of the generation failure
        message: String,
    },
}

impl Error {
    /// Returns `true` if this is a connection error.
    ///
    /// # Examples
    ///
    /// ```
    /// use mcp_toolbox_core::Error;
    ///
    /// let err = Error::ConnectionFailed {
    ///     server: "test".to_string(),
    ///     source: "connection refused".into(),
    /// };
    /// assert!(err.is_connection_error());
    /// ```
    #[must_use]
    pub const fn is_connection_error(&self) -> bool {
        matches!(self, Self::ConnectionFailed { .. })
    }

    /// Returns `true` if this is a security violation error.
    ///
    /// # Examples
    ///
    /// ```
    /// use mcp_toolbox_core::Error;
    ///
    /// let err = Error::SecurityViolation {
    ///     reason: "stdio disabled".to_string(),
    /// };
    /// assert!(err.is_security_error());
    /// ```
    #[must_use]
    pub const fn is_security_error(&self) -> bool {
        matches!(self, Self::SecurityViolation { .. })
    }

    /// Returns `true` if this is a configuration error.
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::ConfigError { .. })
    }

    /// Returns `true` if this is a protocol error.
    #[must_use]
    pub const fn is_protocol_error(&self) -> bool {
        matches!(self, Self::ProtocolError { .. })
    }

    /// Returns `true` if pool acquisition timed out.
    ///
    /// # Examples
    ///
    /// ```
    /// use mcp_toolbox_core::Error;
    ///
    /// let err = Error::PoolTimeout {
    ///     server: "github".to_string(),
    ///     waited_ms: 30_000,
    /// };
    /// assert!(err.is_pool_timeout());
    /// ```
    #[must_use]
    pub const fn is_pool_timeout(&self) -> bool {
        matches!(self, Self::PoolTimeout { .. })
    }

    /// Returns `true` if this is a resource not found error.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::ResourceNotFound { .. })
    }

    /// Returns `true` if this is a compaction error.
    #[must_use]
    pub const fn is_compaction_error(&self) -> bool {
        matches!(self, Self::CompactionError { .. })
    }

    /// Returns `true` if the failure happened at the transport level.
    ///
    /// Transport-level failures invalidate a pooled connection; tool-level
    /// failures do not.
    #[must_use]
    pub const fn is_transport_failure(&self) -> bool {
        matches!(self, Self::ConnectionFailed { .. })
    }

    /// Builds an [`Error::IoError`] for `path`.
    #[must_use]
    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Self::IoError {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}

/// Result type alias using the toolbox error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_error() {
        let err = Error::ConnectionFailed {
            server: "github".to_string(),
            source: "refused".into(),
        };
        assert!(err.is_connection_error());
        assert!(err.is_transport_failure());
        assert!(!err.is_security_error());
        assert_eq!(err.to_string(), "MCP server connection failed: github");
    }

    #[test]
    fn test_security_error_display() {
        let err = Error::SecurityViolation {
            reason: "stdio disabled for 'fs'".to_string(),
        };
        assert!(err.is_security_error());
        assert!(err.to_string().contains("stdio disabled"));
    }

    #[test]
    fn test_pool_timeout_display() {
        let err = Error::PoolTimeout {
            server: "fs".to_string(),
            waited_ms: 250,
        };
        assert!(err.is_pool_timeout());
        assert!(err.to_string().contains("250ms"));
    }

    #[test]
    fn test_protocol_error_is_not_transport_failure() {
        let err = Error::ProtocolError {
            server: "fs".to_string(),
            message: "tools/list failed".to_string(),
            source: None,
        };
        assert!(err.is_protocol_error());
        assert!(!err.is_transport_failure());
    }

    #[test]
    fn test_io_helper_keeps_path() {
        let err = Error::io(
            "/tmp/out/catalog.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("/tmp/out/catalog.json"));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
