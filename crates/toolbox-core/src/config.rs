//! Toolbox configuration model and loader.
//!
//! The configuration is a single JSON or TOML document describing the
//! servers to introspect, where generated code goes, the stdio security
//! policy, and optional response compaction.
//!
//! # Examples
//!
//! ```
//! use mcp_toolbox_core::ToolboxConfig;
//!
//! let config = ToolboxConfig::from_json_str(r#"{
//!     "servers": [
//!         {"name": "files", "transport": {"type": "stdio", "command": "mcp-files"}}
//!     ],
//!     "generation": {"outDir": "toolbox", "language": "ts"},
//!     "security": {"allowStdioExec": true, "envAllowlist": ["PATH", "HOME"]}
//! }"#).unwrap();
//!
//! assert_eq!(config.servers.len(), 1);
//! assert!(config.security.allow_stdio_exec);
//! ```

use crate::auth::AuthConfig;
use crate::{Error, Result, ServerId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

/// Environment variable that may point at the config file.
pub const CONFIG_ENV_VAR: &str = "MCP_TOOLBOX_CONFIG";

/// Config file name used when neither a flag nor the env var is given.
pub const DEFAULT_CONFIG_FILE: &str = "mcp-toolbox.config.json";

/// Default `truncateLength` for the truncate strategy.
pub const DEFAULT_TRUNCATE_LENGTH: usize = 5000;

/// Default `summaryMaxLength` for the summarize strategy.
pub const DEFAULT_SUMMARY_MAX_LENGTH: usize = 3000;

/// Root configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ToolboxConfig {
    /// Servers to introspect and call, in processing order.
    pub servers: Vec<ServerConfig>,
    /// Code generation settings.
    pub generation: GenerationConfig,
    /// Stdio execution policy.
    pub security: SecurityConfig,
    /// Optional response compaction for tool calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compaction: Option<CompactionConfig>,
}

/// One configured MCP server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ServerConfig {
    /// Unique server name; the server identity.
    pub name: String,
    /// How to reach the server.
    pub transport: TransportConfig,
}

impl ServerConfig {
    /// Returns the identity of this server.
    #[must_use]
    pub fn id(&self) -> ServerId {
        ServerId::new(self.name.clone())
    }

    /// Returns the auth configuration of the transport, if any.
    #[must_use]
    pub const fn auth(&self) -> Option<&AuthConfig> {
        match &self.transport {
            TransportConfig::Stdio { auth, .. } | TransportConfig::Http { auth, .. } => {
                auth.as_ref()
            }
        }
    }
}

/// Transport declaration for a server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", deny_unknown_fields)]
pub enum TransportConfig {
    /// Spawn the server as a child process speaking MCP over stdio.
    Stdio {
        /// Executable to run
        command: String,
        /// Command-line arguments
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        args: Vec<String>,
        /// Extra environment variables for the child
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        env: BTreeMap<String, String>,
        /// Authentication passed through the child environment
        #[serde(default, skip_serializing_if = "Option::is_none")]
        auth: Option<AuthConfig>,
    },
    /// Connect to a streamable-HTTP endpoint.
    Http {
        /// Endpoint URL
        url: String,
        /// Static request headers
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        headers: BTreeMap<String, String>,
        /// Authentication sent as a bearer header
        #[serde(default, skip_serializing_if = "Option::is_none")]
        auth: Option<AuthConfig>,
    },
}

impl TransportConfig {
    /// Returns `true` for stdio transports.
    #[must_use]
    pub const fn is_stdio(&self) -> bool {
        matches!(self, Self::Stdio { .. })
    }
}

/// Code generation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GenerationConfig {
    /// Output directory for snapshots, reports and generated code.
    pub out_dir: PathBuf,
    /// Target language.
    #[serde(default)]
    pub language: Language,
}

/// Target language for generated wrappers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    /// TypeScript
    #[default]
    #[serde(rename = "ts")]
    TypeScript,
}

/// Stdio execution policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SecurityConfig {
    /// Whether stdio servers may be spawned at all.
    pub allow_stdio_exec: bool,
    /// Parent environment variables copied into stdio children.
    pub env_allowlist: Vec<String>,
}

/// Compaction strategy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompactionStrategy {
    /// Keep a prefix of oversized text items.
    Truncate,
    /// Keep the head and tail of oversized text items.
    Summarize,
    /// Write the whole result to disk and return a pointer.
    PersistToFile,
}

impl CompactionStrategy {
    /// Returns the wire name of the strategy.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Truncate => "truncate",
            Self::Summarize => "summarize",
            Self::PersistToFile => "persist-to-file",
        }
    }
}

impl std::fmt::Display for CompactionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Size thresholds that trigger compaction. At least one is required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompactionThresholds {
    /// Serialized byte length limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes: Option<u64>,
    /// Estimated token limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<u64>,
}

/// Response compaction settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompactionConfig {
    /// Master switch.
    pub enabled: bool,
    /// Strategy applied when a threshold is exceeded.
    pub strategy: CompactionStrategy,
    /// Thresholds.
    pub thresholds: CompactionThresholds,
    /// Directory for the persist-to-file strategy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persist_dir: Option<PathBuf>,
    /// Maximum kept characters for the truncate strategy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truncate_length: Option<usize>,
    /// Maximum kept characters for the summarize strategy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary_max_length: Option<usize>,
}

impl CompactionConfig {
    /// Effective truncate length.
    #[must_use]
    pub fn truncate_length(&self) -> usize {
        self.truncate_length.unwrap_or(DEFAULT_TRUNCATE_LENGTH)
    }

    /// Effective summary length.
    #[must_use]
    pub fn summary_max_length(&self) -> usize {
        self.summary_max_length.unwrap_or(DEFAULT_SUMMARY_MAX_LENGTH)
    }

    /// Validates thresholds and lengths.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` if no threshold is set or any numeric
    /// setting is zero.
    pub fn validate(&self) -> Result<()> {
        let CompactionThresholds { bytes, tokens } = self.thresholds;
        if bytes.is_none() && tokens.is_none() {
            return Err(config_error(
                "compaction.thresholds: at least one threshold (bytes or tokens) required",
            ));
        }
        let checks = [
            ("compaction.thresholds.bytes", bytes.map(|v| v > 0)),
            ("compaction.thresholds.tokens", tokens.map(|v| v > 0)),
            ("compaction.truncateLength", self.truncate_length.map(|v| v > 0)),
            ("compaction.summaryMaxLength", self.summary_max_length.map(|v| v > 0)),
        ];
        for (field, positive) in checks {
            if positive == Some(false) {
                return Err(config_error(format!("{field} must be positive")));
            }
        }
        if self
            .persist_dir
            .as_ref()
            .is_some_and(|dir| dir.as_os_str().is_empty())
        {
            return Err(config_error("compaction.persistDir cannot be empty"));
        }
        Ok(())
    }
}

impl ToolboxConfig {
    /// Parses and validates a JSON config document.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` if the document is malformed or invalid.
    pub fn from_json_str(source: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(source)
            .map_err(|e| config_error(format!("invalid JSON config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates a TOML config document.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` if the document is malformed or invalid.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| config_error(format!("invalid TOML config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a config file, choosing the parser by extension.
    ///
    /// Files ending in `.toml` are parsed as TOML, everything else as JSON.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` if the file is missing, unreadable,
    /// malformed, or fails validation.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(config_error(format!(
                "config file not found at {}",
                path.display()
            )));
        }
        let source = std::fs::read_to_string(path)
            .map_err(|e| config_error(format!("cannot read {}: {e}", path.display())))?;

        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        let config = if is_toml {
            Self::from_toml_str(&source)
        } else {
            Self::from_json_str(&source)
        }?;

        tracing::debug!(
            path = %path.display(),
            servers = config.servers.len(),
            "loaded toolbox config"
        );
        Ok(config)
    }

    /// Checks every invariant of the configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` describing the first violation found.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for (index, server) in self.servers.iter().enumerate() {
            if server.name.trim().is_empty() {
                return Err(config_error(format!("servers[{index}].name cannot be empty")));
            }
            if !seen.insert(server.name.as_str()) {
                return Err(config_error(format!(
                    "duplicate server name '{}'",
                    server.name
                )));
            }
            validate_transport(&server.name, &server.transport)?;
        }

        if self.generation.out_dir.as_os_str().is_empty() {
            return Err(config_error("generation.outDir cannot be empty"));
        }

        if self
            .security
            .env_allowlist
            .iter()
            .any(|name| name.trim().is_empty())
        {
            return Err(config_error("security.envAllowlist entries cannot be empty"));
        }

        if let Some(compaction) = &self.compaction {
            compaction.validate()?;
        }

        Ok(())
    }

    /// Looks up a server by identity.
    #[must_use]
    pub fn server(&self, id: &ServerId) -> Option<&ServerConfig> {
        self.servers.iter().find(|s| s.name == id.as_str())
    }

    /// Resolves `generation.outDir` against the directory of `config_path`.
    #[must_use]
    pub fn resolve_out_dir(&self, config_path: &Path) -> PathBuf {
        let out_dir = &self.generation.out_dir;
        if out_dir.is_absolute() {
            return out_dir.clone();
        }
        config_path
            .parent()
            .map_or_else(|| out_dir.clone(), |dir| dir.join(out_dir))
    }
}

/// Picks the config path: explicit flag, then `MCP_TOOLBOX_CONFIG`, then
/// [`DEFAULT_CONFIG_FILE`] in the working directory.
#[must_use]
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    match std::env::var(CONFIG_ENV_VAR) {
        Ok(value) if !value.trim().is_empty() => PathBuf::from(value),
        _ => PathBuf::from(DEFAULT_CONFIG_FILE),
    }
}

fn validate_transport(server: &str, transport: &TransportConfig) -> Result<()> {
    match transport {
        TransportConfig::Stdio { command, auth, .. } => {
            if command.trim().is_empty() {
                return Err(config_error(format!(
                    "server '{server}': stdio command cannot be empty"
                )));
            }
            if let Some(auth) = auth {
                auth.validate(server)?;
                if auth.is_bearer() && auth.token_name().is_none() {
                    return Err(config_error(format!(
                        "server '{server}': tokenName is required for stdio transports with bearer authentication"
                    )));
                }
            }
        }
        TransportConfig::Http { url, auth, .. } => {
            if !is_http_url(url) {
                return Err(config_error(format!(
                    "server '{server}': url must be an absolute http(s) URL, got '{url}'"
                )));
            }
            if let Some(auth) = auth {
                auth.validate(server)?;
            }
        }
    }
    Ok(())
}

fn is_http_url(url: &str) -> bool {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    rest.is_some_and(|rest| {
        let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
        !host.is_empty() && !host.contains(char::is_whitespace)
    })
}

fn config_error(message: impl Into<String>) -> Error {
    Error::ConfigError {
        message: message.into(),
    }
}
