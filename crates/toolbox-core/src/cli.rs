//! CLI-specific value types.
//!
//! # Examples
//!
//! ```
//! use mcp_toolbox_core::cli::{ExitCode, OutputFormat};
//!
//! let format: OutputFormat = "json".parse().unwrap();
//! assert_eq!(format.as_str(), "json");
//!
//! assert!(ExitCode::SUCCESS.is_success());
//! assert_eq!(ExitCode::ERROR.as_i32(), 1);
//! ```

use std::fmt;
use std::str::FromStr;

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    Json,
    /// Compact single-line output
    Text,
    /// Colored, human-oriented output
    #[default]
    Pretty,
}

impl OutputFormat {
    /// Returns the flag value for this format.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Text => "text",
            Self::Pretty => "pretty",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" => Ok(Self::Text),
            "pretty" => Ok(Self::Pretty),
            _ => Err(crate::Error::ValidationError {
                field: "format".to_string(),
                reason: format!("invalid output format '{s}' (expected: json, text, or pretty)"),
            }),
        }
    }
}

/// Process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExitCode(i32);

impl ExitCode {
    /// Everything succeeded.
    pub const SUCCESS: Self = Self(0);

    /// A server failed, a check found drift, or a fatal error occurred.
    pub const ERROR: Self = Self(1);

    /// Interrupted by SIGINT/SIGTERM.
    pub const INTERRUPTED: Self = Self(130);

    /// Creates an exit code from a raw value.
    #[must_use]
    pub const fn from_i32(code: i32) -> Self {
        Self(code)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_i32(&self) -> i32 {
        self.0
    }

    /// Returns `true` for a zero status.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.0 == 0
    }
}

impl Default for ExitCode {
    fn default() -> Self {
        Self::SUCCESS
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.0
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parse_is_case_insensitive() {
        assert_eq!("PRETTY".parse::<OutputFormat>().unwrap(), OutputFormat::Pretty);
        assert_eq!("Text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
    }

    #[test]
    fn test_output_format_parse_rejects_unknown() {
        assert!("yaml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_exit_codes() {
        assert!(ExitCode::default().is_success());
        assert!(!ExitCode::ERROR.is_success());
        assert_eq!(i32::from(ExitCode::INTERRUPTED), 130);
        assert_eq!(ExitCode::from_i32(7).to_string(), "7");
    }
}
