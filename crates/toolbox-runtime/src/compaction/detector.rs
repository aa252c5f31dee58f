//! Size estimation and the compaction decision.

use mcp_toolbox_core::CompactionConfig;
use serde_json::Value;

/// Bytes per estimated token.
pub const BYTES_PER_TOKEN: u64 = 4;

/// Serialized size of a tool result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SizeEstimate {
    /// Byte length of the compact JSON serialization
    pub bytes: u64,
    /// `bytes / 4`, rounded up
    pub tokens: u64,
}

/// Measures `result` as it would go over the wire.
///
/// # Examples
///
/// ```
/// use mcp_toolbox_runtime::compaction::estimate_size;
/// use serde_json::json;
///
/// let size = estimate_size(&json!({"a": "bcd"}));
/// assert_eq!(size.bytes, 11);
/// assert_eq!(size.tokens, 3);
/// ```
#[must_use]
pub fn estimate_size(result: &Value) -> SizeEstimate {
    let bytes = result.to_string().len() as u64;
    SizeEstimate {
        bytes,
        tokens: bytes.div_ceil(BYTES_PER_TOKEN),
    }
}

/// Returns `true` if compaction is enabled and any configured threshold is
/// exceeded.
#[must_use]
pub fn should_compact(size: SizeEstimate, config: &CompactionConfig) -> bool {
    if !config.enabled {
        return false;
    }
    let over_bytes = config.thresholds.bytes.is_some_and(|limit| size.bytes > limit);
    let over_tokens = config
        .thresholds
        .tokens
        .is_some_and(|limit| size.tokens > limit);
    over_bytes || over_tokens
}
