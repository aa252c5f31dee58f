//! Server name slugs.

use regex::Regex;
use std::sync::LazyLock;

static NON_ALPHANUMERIC_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9]+").expect("valid regex"));

/// Converts a server name into a stable, filesystem-friendly slug.
///
/// Every run of non-alphanumeric characters collapses into one `-`, leading
/// and trailing hyphens are trimmed, and the result is lowercased.
///
/// # Examples
///
/// ```
/// use mcp_toolbox_core::slugify_server_name;
///
/// assert_eq!(
///     slugify_server_name("io.github.Digital-Defiance/mcp-filesystem"),
///     "io-github-digital-defiance-mcp-filesystem"
/// );
/// assert_eq!(slugify_server_name("  --weird__name--  "), "weird-name");
/// ```
#[must_use]
pub fn slugify_server_name(name: &str) -> String {
    NON_ALPHANUMERIC_RUN
        .replace_all(name, "-")
        .trim_matches('-')
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_collapses_runs() {
        assert_eq!(slugify_server_name("a...b___c"), "a-b-c");
    }

    #[test]
    fn test_slug_lowercases() {
        assert_eq!(slugify_server_name("GitHub"), "github");
    }

    #[test]
    fn test_slug_of_symbols_only_is_empty() {
        assert_eq!(slugify_server_name("@@@"), "");
    }

    #[test]
    fn test_slug_keeps_digits() {
        assert_eq!(slugify_server_name("server 2"), "server-2");
    }
}
