//! Types for code generation.
//!
//! Generated output is represented in memory as a list of files relative to
//! a server's output directory, then written in one step.
//!
//! # Examples
//!
//! ```
//! use mcp_toolbox_codegen::{GeneratedCode, GeneratedFile};
//!
//! let mut code = GeneratedCode::new();
//! code.add_file(GeneratedFile {
//!     path: "tools/sendMessage.ts".to_string(),
//!     content: "export async function sendMessage() {}\n".to_string(),
//! });
//!
//! assert_eq!(code.file_count(), 1);
//! ```

use serde::Serialize;

/// Result of code generation containing all generated files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedCode {
    /// Generated files, in generation order
    pub files: Vec<GeneratedFile>,
}

impl GeneratedCode {
    /// Creates an empty container.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self { files: Vec::new() }
    }

    /// Adds a generated file.
    pub fn add_file(&mut self, file: GeneratedFile) {
        self.files.push(file);
    }

    /// Number of generated files.
    #[inline]
    #[must_use]
    pub const fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Iterates over the generated files.
    #[inline]
    pub fn files(&self) -> impl Iterator<Item = &GeneratedFile> {
        self.files.iter()
    }

    /// Looks up a file by its relative path.
    #[must_use]
    pub fn file(&self, path: &str) -> Option<&GeneratedFile> {
        self.files.iter().find(|f| f.path == path)
    }
}

/// A single generated file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// Path relative to the server output directory, `/`-separated
    pub path: String,
    /// File content
    pub content: String,
}

/// Context for the per-tool template.
///
/// Multi-line parts (header comments, input declaration) arrive
/// pre-rendered.
#[derive(Debug, Clone, Serialize)]
pub struct ToolContext {
    /// Module specifier the wrapper imports `callMcpTool` from
    pub runtime_module: String,
    /// `//` comment block naming server, tool and description
    pub header: String,
    /// `export interface ...Input` or `export type ...Input = ...;`
    pub input_declaration: String,
    /// PascalCase prefix for the `Input`/`Output` types
    pub type_name: String,
    /// Exported function name
    pub function_name: String,
    /// Server name as a JSON string literal
    pub server_name_literal: String,
    /// Tool name as a JSON string literal
    pub tool_name_literal: String,
}

/// Context for the per-server index template.
#[derive(Debug, Clone, Serialize)]
pub struct IndexContext {
    /// Configured server name
    pub server_name: String,
    /// Snapshot version
    pub version: String,
    /// Number of tools
    pub tool_count: usize,
    /// One `export * from` line per tool
    pub exports: String,
}

/// Context for the output-root README template.
#[derive(Debug, Clone, Serialize)]
pub struct ReadmeContext {
    /// Name of the output directory
    pub out_dir_name: String,
    /// Import path of an example server module
    pub example_module: String,
    /// Example server slug
    pub example_slug: String,
}
