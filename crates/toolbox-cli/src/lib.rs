//! MCP toolbox CLI library.
//!
//! Command implementations and output formatters, kept out of `main.rs` so
//! they can be tested directly.

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::unused_async)]

pub mod commands;
pub mod formatters;
