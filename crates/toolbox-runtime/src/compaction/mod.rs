//! Response compaction.
//!
//! Oversized tool results are shrunk before they reach the caller, using
//! the one strategy selected in [`CompactionConfig`]. Compaction is
//! best-effort: [`compact_if_needed`] reports strategy failures as errors
//! and the tool runtime falls back to the original result.
//!
//! # Examples
//!
//! ```
//! use mcp_toolbox_core::{CompactionConfig, CompactionStrategy, CompactionThresholds};
//! use mcp_toolbox_runtime::compaction::{CompactionContext, compact_if_needed};
//! use serde_json::json;
//!
//! let config = CompactionConfig {
//!     enabled: true,
//!     strategy: CompactionStrategy::Truncate,
//!     thresholds: CompactionThresholds { bytes: Some(10), tokens: None },
//!     persist_dir: None,
//!     truncate_length: Some(10),
//!     summary_max_length: None,
//! };
//! let context = CompactionContext::new("fs", "read", "/tmp/compacted");
//! let result = json!({"content": [{"type": "text", "text": "0123456789ABCDEF"}]});
//!
//! let outcome = compact_if_needed(&result, Some(&config), &context)?;
//! assert!(outcome.compacted);
//! assert_eq!(
//!     outcome.result["content"][0]["text"],
//!     "0123456789\n\n[... truncated 6 characters. Original: 16 chars]"
//! );
//! # Ok::<(), mcp_toolbox_core::Error>(())
//! ```

mod detector;
mod strategies;

pub use detector::{BYTES_PER_TOKEN, SizeEstimate, estimate_size, should_compact};
pub use strategies::{persist_to_file, summarize, summarize_text, truncate, truncate_text};

use mcp_toolbox_core::{CompactionConfig, CompactionStrategy, Result};
use serde_json::Value;
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// Subdirectory of the output directory used when `persistDir` is unset.
pub const DEFAULT_PERSIST_SUBDIR: &str = ".cache/compacted";

/// Where a result came from and where persisted results go by default.
#[derive(Debug, Clone)]
pub struct CompactionContext<'a> {
    /// Server that produced the result
    pub server: &'a str,
    /// Tool that produced the result
    pub tool: &'a str,
    /// Directory used when the config has no `persistDir`
    pub default_persist_dir: PathBuf,
}

impl<'a> CompactionContext<'a> {
    /// Creates a context.
    #[must_use]
    pub fn new(server: &'a str, tool: &'a str, default_persist_dir: impl Into<PathBuf>) -> Self {
        Self {
            server,
            tool,
            default_persist_dir: default_persist_dir.into(),
        }
    }

    /// Context whose default persist dir is `<out_dir>/.cache/compacted`.
    #[must_use]
    pub fn for_out_dir(server: &'a str, tool: &'a str, out_dir: &Path) -> Self {
        Self::new(server, tool, out_dir.join(DEFAULT_PERSIST_SUBDIR))
    }
}

/// Outcome of [`compact_if_needed`].
#[derive(Debug, Clone, PartialEq)]
pub struct CompactionOutcome<'a> {
    /// Whether a strategy ran
    pub compacted: bool,
    /// Serialized size before compaction (0 when compaction is off)
    pub original_size: u64,
    /// Serialized size after compaction (0 when compaction is off)
    pub compacted_size: u64,
    /// Strategy applied, if any
    pub strategy: Option<CompactionStrategy>,
    /// The result to hand back; borrowed when nothing changed
    pub result: Cow<'a, Value>,
}

impl CompactionOutcome<'_> {
    /// Percentage of bytes removed, or `None` if nothing was compacted.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn reduction_percent(&self) -> Option<f64> {
        if !self.compacted || self.original_size == 0 {
            return None;
        }
        let saved = self.original_size.saturating_sub(self.compacted_size);
        Some(saved as f64 / self.original_size as f64 * 100.0)
    }
}

/// Compacts `result` when `config` is enabled and a threshold is exceeded.
///
/// # Errors
///
/// Returns [`Error::CompactionError`](mcp_toolbox_core::Error::CompactionError)
/// if the selected strategy fails. Callers are expected to fall back to the
/// original result.
pub fn compact_if_needed<'a>(
    result: &'a Value,
    config: Option<&CompactionConfig>,
    context: &CompactionContext<'_>,
) -> Result<CompactionOutcome<'a>> {
    let Some(config) = config.filter(|c| c.enabled) else {
        return Ok(CompactionOutcome {
            compacted: false,
            original_size: 0,
            compacted_size: 0,
            strategy: None,
            result: Cow::Borrowed(result),
        });
    };

    let original = estimate_size(result);
    if !should_compact(original, config) {
        return Ok(CompactionOutcome {
            compacted: false,
            original_size: original.bytes,
            compacted_size: original.bytes,
            strategy: None,
            result: Cow::Borrowed(result),
        });
    }

    let compacted = match config.strategy {
        CompactionStrategy::Truncate => truncate(result, config.truncate_length())?,
        CompactionStrategy::Summarize => summarize(result, config.summary_max_length())?,
        CompactionStrategy::PersistToFile => {
            let dir = config
                .persist_dir
                .as_deref()
                .unwrap_or(&context.default_persist_dir);
            persist_to_file(result, dir, context.server, context.tool)?
        }
    };

    let outcome = CompactionOutcome {
        compacted: true,
        original_size: original.bytes,
        compacted_size: estimate_size(&compacted).bytes,
        strategy: Some(config.strategy),
        result: Cow::Owned(compacted),
    };
    tracing::debug!(
        server = context.server,
        tool = context.tool,
        strategy = %config.strategy,
        original_bytes = outcome.original_size,
        compacted_bytes = outcome.compacted_size,
        reduction_percent = outcome.reduction_percent().unwrap_or(0.0),
        "compacted tool result"
    );
    Ok(outcome)
}
