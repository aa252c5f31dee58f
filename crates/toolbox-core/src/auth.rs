//! Authentication configuration and token resolution.
//!
//! Token lookup is an injected capability: transports ask an
//! [`AuthResolver`] for an [`AuthResult`] instead of reading the process
//! environment themselves, so tests can substitute their own resolver.
//!
//! # Examples
//!
//! ```
//! use mcp_toolbox_core::auth::{
//!     AuthConfig, AuthResolver, AuthResult, EnvAuthResolver, resolve_auth,
//! };
//!
//! let resolver = EnvAuthResolver::new();
//! let auth = AuthConfig::Bearer {
//!     token_env: "SURELY_UNSET_TOOLBOX_TOKEN".to_string(),
//!     token_name: None,
//! };
//!
//! match resolver.resolve(&auth) {
//!     AuthResult::Missing { env_var } => assert_eq!(env_var, "SURELY_UNSET_TOOLBOX_TOKEN"),
//!     other => panic!("unexpected {other:?}"),
//! }
//! assert!(matches!(resolve_auth(&resolver, None), AuthResult::None));
//! ```

use crate::{Error, Result};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Authentication declared for a transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", deny_unknown_fields)]
pub enum AuthConfig {
    /// Bearer token read from an environment variable.
    Bearer {
        /// Environment variable holding the token
        #[serde(rename = "tokenEnv")]
        token_env: String,
        /// Variable name the stdio child expects the token under
        #[serde(rename = "tokenName", default, skip_serializing_if = "Option::is_none")]
        token_name: Option<String>,
    },
    /// No authentication.
    None,
}

impl AuthConfig {
    /// Returns `true` for bearer authentication.
    #[must_use]
    pub const fn is_bearer(&self) -> bool {
        matches!(self, Self::Bearer { .. })
    }

    /// Returns the child-process variable name for stdio transports.
    #[must_use]
    pub fn token_name(&self) -> Option<&str> {
        match self {
            Self::Bearer { token_name, .. } => token_name.as_deref(),
            Self::None => None,
        }
    }

    pub(crate) fn validate(&self, server: &str) -> Result<()> {
        if let Self::Bearer {
            token_env,
            token_name,
        } = self
        {
            if token_env.trim().is_empty() {
                return Err(Error::ConfigError {
                    message: format!("server '{server}': auth.tokenEnv cannot be empty"),
                });
            }
            if token_name.as_deref().is_some_and(|n| n.trim().is_empty()) {
                return Err(Error::ConfigError {
                    message: format!("server '{server}': auth.tokenName cannot be empty"),
                });
            }
        }
        Ok(())
    }
}

/// Outcome of resolving an [`AuthConfig`].
#[derive(Debug, Clone)]
pub enum AuthResult {
    /// A token was found.
    Resolved {
        /// The bearer token
        token: SecretString,
    },
    /// Bearer auth is configured but the variable is unset or blank.
    Missing {
        /// Name of the missing environment variable
        env_var: String,
    },
    /// No authentication is configured.
    None,
}

impl AuthResult {
    /// Returns `true` if a token was resolved.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved { .. })
    }
}

/// Resolves authentication for a transport.
#[cfg_attr(test, mockall::automock)]
pub trait AuthResolver: Send + Sync + std::fmt::Debug {
    /// Resolves `auth` into a token, a missing-variable report, or nothing.
    fn resolve(&self, auth: &AuthConfig) -> AuthResult;
}

/// Resolves optional transport auth; absent auth is [`AuthResult::None`].
#[must_use]
pub fn resolve_auth(resolver: &dyn AuthResolver, auth: Option<&AuthConfig>) -> AuthResult {
    auth.map_or(AuthResult::None, |auth| resolver.resolve(auth))
}

/// Resolver backed by the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvAuthResolver;

impl EnvAuthResolver {
    /// Creates a new environment-backed resolver.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl AuthResolver for EnvAuthResolver {
    fn resolve(&self, auth: &AuthConfig) -> AuthResult {
        match auth {
            AuthConfig::None => AuthResult::None,
            AuthConfig::Bearer { token_env, .. } => match std::env::var(token_env) {
                Ok(token) if !token.trim().is_empty() => AuthResult::Resolved {
                    token: SecretString::from(token),
                },
                _ => AuthResult::Missing {
                    env_var: token_env.clone(),
                },
            },
        }
    }
}

const AUTH_ERROR_MARKERS: &[&str] = &[
    "401",
    "403",
    "unauthorized",
    "forbidden",
    "authentication failed",
    "invalid token",
    "invalid credentials",
    "bearer token",
    "access denied",
];

/// Returns `true` if an error message looks like an authentication failure.
///
/// # Examples
///
/// ```
/// use mcp_toolbox_core::auth::is_auth_error;
///
/// assert!(is_auth_error("HTTP status client error (401 Unauthorized)"));
/// assert!(!is_auth_error("connection refused"));
/// ```
#[must_use]
pub fn is_auth_error(message: &str) -> bool {
    let lower = message.to_lowercase();
    AUTH_ERROR_MARKERS.iter().any(|marker| lower.contains(marker))
}
