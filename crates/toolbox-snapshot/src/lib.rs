//! Snapshot fingerprinting, persistence and diffing.
//!
//! # Architecture
//!
//! - [`fingerprint`]: canonical JSON hashing for cheap change detection
//! - [`SnapshotStore`]: `latest` and historical snapshots under `.snapshots/`
//! - [`diff_snapshots`]: pure classification of tool changes
//! - [`render_diff_report`]: Markdown reports stored under `.reports/`

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

pub mod diff;
pub mod fingerprint;
pub mod report;
pub mod store;

pub use diff::{DiffSummary, ToolChange, diff_snapshots, diff_tools};
pub use fingerprint::{fingerprint, normalize_for_hash, schema_fingerprint, stable_stringify};
pub use report::render_diff_report;
pub use store::{SnapshotMeta, SnapshotStore, WrittenSnapshot};
