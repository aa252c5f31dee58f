//! Command implementations for the `mcp-toolbox` binary.
//!
//! Each command loads what it needs, does its work, prints its result in
//! the requested format and reports an [`ExitCode`](mcp_toolbox_core::cli::ExitCode).

pub mod call;
pub mod common;
pub mod completions;
pub mod introspect;
pub mod sync;
