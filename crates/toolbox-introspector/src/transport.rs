//! Transport preparation and connection.
//!
//! Preparing a transport is synchronous and side-effect free: it applies the
//! stdio security gate, resolves auth and computes the child environment or
//! request headers. Nothing is spawned or dialled until [`connect`].
//!
//! # Examples
//!
//! ```
//! use mcp_toolbox_core::{EnvAuthResolver, SecurityConfig, ServerConfig};
//! use mcp_toolbox_introspector::transport::prepare_transport;
//!
//! let server: ServerConfig = serde_json::from_str(
//!     r#"{"name": "fs", "transport": {"type": "stdio", "command": "fs-server"}}"#,
//! )?;
//! let denied = SecurityConfig { allow_stdio_exec: false, env_allowlist: vec![] };
//!
//! let err = prepare_transport(&server, &denied, &EnvAuthResolver::new()).unwrap_err();
//! assert!(err.is_security_error());
//! # Ok::<(), serde_json::Error>(())
//! ```

use crate::types::TransportDescriptor;
use mcp_toolbox_core::auth::{AuthConfig, AuthResolver, AuthResult, is_auth_error, resolve_auth};
use mcp_toolbox_core::{Error, Result, SecurityConfig, ServerConfig, TransportConfig};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use rmcp::service::RunningService;
use rmcp::transport::streamable_http_client::StreamableHttpClientTransportConfig;
use rmcp::transport::{ConfigureCommandExt, StreamableHttpClientTransport, TokioChildProcess};
use rmcp::{RoleClient, ServiceExt};
use secrecy::{ExposeSecret, SecretString};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

/// A live MCP client session.
pub type McpClient = RunningService<RoleClient, ()>;

/// A transport ready to be connected.
pub enum PreparedTransport {
    /// Child process with an explicit environment.
    Stdio {
        /// Executable to spawn
        command: String,
        /// Arguments
        args: Vec<String>,
        /// Complete child environment; the parent environment is not inherited
        env: BTreeMap<String, String>,
    },
    /// Streamable-HTTP endpoint.
    Http {
        /// Parsed endpoint URL
        url: reqwest::Url,
        /// Default headers, including `Authorization` when a token resolved
        headers: HeaderMap,
    },
}

impl fmt::Debug for PreparedTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdio { command, args, env } => f
                .debug_struct("Stdio")
                .field("command", command)
                .field("args", args)
                .field("env_keys", &env.keys().collect::<Vec<_>>())
                .finish(),
            Self::Http { url, headers } => f
                .debug_struct("Http")
                .field("url", &url.as_str())
                .field("header_names", &headers.keys().collect::<Vec<_>>())
                .finish(),
        }
    }
}

impl PreparedTransport {
    /// Describes the transport for persistence in a snapshot.
    #[must_use]
    pub fn descriptor(&self) -> TransportDescriptor {
        match self {
            Self::Stdio { command, args, .. } => TransportDescriptor::Stdio {
                command: command.clone(),
                args: args.clone(),
            },
            Self::Http { url, .. } => TransportDescriptor::StreamableHttp {
                url: url.to_string(),
            },
        }
    }
}

/// Rejects stdio execution unless `security.allow_stdio_exec` is set.
///
/// # Errors
///
/// Returns [`Error::SecurityViolation`] when stdio execution is disabled.
pub fn ensure_stdio_allowed(server: &str, security: &SecurityConfig) -> Result<()> {
    if security.allow_stdio_exec {
        return Ok(());
    }
    Err(Error::SecurityViolation {
        reason: format!(
            "server '{server}' uses a stdio transport but security.allowStdioExec is false"
        ),
    })
}

/// Builds the environment for a stdio child.
///
/// Only allowlisted parent variables pass through. Transport variables are
/// layered on top, then the auth variable, each overriding the previous.
///
/// # Examples
///
/// ```
/// use mcp_toolbox_introspector::transport::build_stdio_env;
/// use std::collections::BTreeMap;
///
/// let parent = vec![
///     ("PATH".to_string(), "/usr/bin".to_string()),
///     ("AWS_SECRET".to_string(), "nope".to_string()),
/// ];
/// let env = build_stdio_env(&["PATH".to_string()], parent, &BTreeMap::new(), None);
///
/// assert_eq!(env.get("PATH").map(String::as_str), Some("/usr/bin"));
/// assert!(!env.contains_key("AWS_SECRET"));
/// ```
#[must_use]
pub fn build_stdio_env<I>(
    allowlist: &[String],
    parent: I,
    transport_env: &BTreeMap<String, String>,
    auth_env: Option<(String, String)>,
) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut env: BTreeMap<String, String> = parent
        .into_iter()
        .filter(|(key, _)| allowlist.iter().any(|allowed| allowed == key))
        .collect();
    env.extend(transport_env.iter().map(|(k, v)| (k.clone(), v.clone())));
    if let Some((key, value)) = auth_env {
        env.insert(key, value);
    }
    env
}

/// Prepares the transport for `server` without spawning or dialling.
///
/// The stdio security gate is checked first, before auth is resolved.
///
/// # Errors
///
/// - [`Error::SecurityViolation`] for stdio when execution is disabled
/// - [`Error::ConfigError`] for an unparsable URL or header
pub fn prepare_transport(
    server: &ServerConfig,
    security: &SecurityConfig,
    resolver: &dyn AuthResolver,
) -> Result<PreparedTransport> {
    match &server.transport {
        TransportConfig::Stdio {
            command,
            args,
            env,
            auth,
        } => {
            ensure_stdio_allowed(&server.name, security)?;

            let auth_env = resolved_token(&server.name, resolver, auth.as_ref())
                .zip(auth.as_ref().and_then(AuthConfig::token_name))
                .map(|(token, name)| (name.to_string(), token.expose_secret().to_string()));

            let env = build_stdio_env(&security.env_allowlist, parent_env(), env, auth_env);
            Ok(PreparedTransport::Stdio {
                command: command.clone(),
                args: args.clone(),
                env,
            })
        }
        TransportConfig::Http { url, headers, auth } => {
            let url = reqwest::Url::parse(url).map_err(|e| Error::ConfigError {
                message: format!("server '{}': invalid url '{url}': {e}", server.name),
            })?;

            let mut header_map = HeaderMap::with_capacity(headers.len() + 1);
            for (name, value) in headers {
                let header_name =
                    HeaderName::from_bytes(name.as_bytes()).map_err(|e| Error::ConfigError {
                        message: format!("server '{}': invalid header name '{name}': {e}", server.name),
                    })?;
                let header_value = HeaderValue::from_str(value).map_err(|e| Error::ConfigError {
                    message: format!("server '{}': invalid value for header '{name}': {e}", server.name),
                })?;
                header_map.insert(header_name, header_value);
            }

            if let Some(token) = resolved_token(&server.name, resolver, auth.as_ref()) {
                let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                    .map_err(|_| Error::ConfigError {
                        message: format!(
                            "server '{}': bearer token contains invalid header characters",
                            server.name
                        ),
                    })?;
                value.set_sensitive(true);
                header_map.insert(AUTHORIZATION, value);
            }

            Ok(PreparedTransport::Http {
                url,
                headers: header_map,
            })
        }
    }
}

/// Connects and performs the MCP handshake.
///
/// A child whose handshake fails is killed when its transport is dropped.
///
/// # Errors
///
/// Returns [`Error::ConnectionFailed`] if spawning, dialling or the
/// handshake fails.
pub async fn connect(server: &str, transport: PreparedTransport) -> Result<McpClient> {
    match transport {
        PreparedTransport::Stdio { command, args, env } => {
            debug!(server, command = %command, "spawning stdio server");
            let cmd = tokio::process::Command::new(&command).configure(|cmd| {
                cmd.args(&args).env_clear().envs(&env);
            });
            let (child, _stderr) = TokioChildProcess::builder(cmd)
                .stderr(std::process::Stdio::null())
                .spawn()
                .map_err(|e| connection_failed(server, e))?;
            ().serve(child)
                .await
                .map_err(|e| connection_failed(server, e))
        }
        PreparedTransport::Http { url, headers } => {
            debug!(server, url = %url, "connecting to streamable-http server");
            let client = reqwest::Client::builder()
                .default_headers(headers)
                .build()
                .map_err(|e| connection_failed(server, e))?;
            let config = StreamableHttpClientTransportConfig::with_uri(url.as_str());
            let transport = StreamableHttpClientTransport::with_client(client, config);
            ().serve(transport)
                .await
                .map_err(|e| connection_failed(server, e))
        }
    }
}

/// Cancels a client session, logging instead of failing.
pub async fn close_client(server: &str, client: McpClient) {
    if let Err(e) = client.cancel().await {
        debug!(server, error = %e, "client shutdown did not complete cleanly");
    }
}

fn resolved_token(
    server: &str,
    resolver: &dyn AuthResolver,
    auth: Option<&AuthConfig>,
) -> Option<SecretString> {
    match resolve_auth(resolver, auth) {
        AuthResult::Resolved { token } => Some(token),
        AuthResult::Missing { env_var } => {
            warn!(server, env_var = %env_var, "bearer token variable is not set, connecting without auth");
            None
        }
        AuthResult::None => None,
    }
}

fn parent_env() -> impl Iterator<Item = (String, String)> {
    std::env::vars_os()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
}

fn connection_failed<E>(server: &str, source: E) -> Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    if is_auth_error(&source.to_string()) {
        warn!(server, "server rejected the credentials, check the configured token variable");
    }
    Error::ConnectionFailed {
        server: server.to_string(),
        source: Box::new(source),
    }
}
