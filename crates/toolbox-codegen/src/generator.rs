//! TypeScript wrapper generator.
//!
//! Output is a pure function of the snapshot: one module per tool under
//! `tools/`, plus an `index.ts` re-exporting them in snapshot order. The
//! server directory is replaced wholesale on every run.
//!
//! # Examples
//!
//! ```
//! use mcp_toolbox_codegen::CodeGenerator;
//! use mcp_toolbox_introspector::{Snapshot, ToolDefinition, TransportDescriptor};
//! use serde_json::json;
//!
//! let snapshot = Snapshot {
//!     server_name: "fs".to_string(),
//!     version: "1.0.0".to_string(),
//!     retrieved_at: "2025-01-01T00:00:00.000Z".to_string(),
//!     transport: TransportDescriptor::Stdio { command: "fs-server".into(), args: vec![] },
//!     tools: vec![ToolDefinition::new("read_file", "Read a file", json!({"type": "object"}))],
//! };
//!
//! let generator = CodeGenerator::new()?;
//! let code = generator.render_server("fs", &snapshot)?;
//!
//! assert!(code.file("tools/readFile.ts").is_some());
//! assert!(code.file("index.ts").unwrap().content.contains("export * from \"./tools/readFile\";"));
//! # Ok::<(), mcp_toolbox_core::Error>(())
//! ```

use crate::output::replace_dir;
use crate::template_engine::{INDEX_TEMPLATE, README_TEMPLATE, TOOL_TEMPLATE, TemplateEngine};
use crate::types::{GeneratedCode, GeneratedFile, IndexContext, ReadmeContext, ToolContext};
use crate::typescript::{
    capitalize, function_identifier, input_shape, render_input_declaration, to_camel_case,
};
use mcp_toolbox_core::fs::write_atomic;
use mcp_toolbox_core::{Error, Result};
use mcp_toolbox_introspector::{Snapshot, ToolDefinition};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt::Write;
use std::path::{Path, PathBuf};

/// Module specifier generated wrappers import `callMcpTool` from.
pub const RUNTIME_MODULE: &str = "mcp-toolbox/runtime";

/// Directory under the output root holding one directory per server.
pub const SERVERS_DIR: &str = "servers";

/// Directory inside a server directory holding one module per tool.
pub const TOOLS_DIR: &str = "tools";

/// Per-server index module.
pub const INDEX_FILE: &str = "index.ts";

/// README written at the output root.
pub const README_FILE: &str = "README.md";

const DEFAULT_EXAMPLE_SLUG: &str = "io-github-yourorg-yourserver";

/// Generates TypeScript wrappers from snapshots.
#[derive(Debug)]
pub struct CodeGenerator<'a> {
    engine: TemplateEngine<'a>,
}

impl CodeGenerator<'_> {
    /// Creates a generator with the built-in templates.
    ///
    /// # Errors
    ///
    /// Returns error if template registration fails.
    pub fn new() -> Result<Self> {
        Ok(Self {
            engine: TemplateEngine::new()?,
        })
    }

    /// Renders a server's files in memory, paths relative to the server
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns error if template rendering fails.
    pub fn render_server(&self, server_name: &str, snapshot: &Snapshot) -> Result<GeneratedCode> {
        let mut code = GeneratedCode::new();
        let mut taken = HashSet::new();
        let mut exports = String::new();

        for tool in &snapshot.tools {
            let function_name = unique_function_name(&tool.name, &mut taken);
            let context = tool_context(server_name, tool, &function_name);
            let content = self.engine.render(TOOL_TEMPLATE, &context)?;

            code.add_file(GeneratedFile {
                path: format!("{TOOLS_DIR}/{function_name}.ts"),
                content,
            });
            let _ = writeln!(exports, "export * from \"./{TOOLS_DIR}/{function_name}\";");
            tracing::debug!("Rendered {TOOLS_DIR}/{function_name}.ts for tool {}", tool.name);
        }

        if exports.is_empty() {
            exports.push_str("export {};");
        } else {
            exports.truncate(exports.trim_end().len());
        }

        let index = IndexContext {
            server_name: single_line(server_name),
            version: single_line(&snapshot.version),
            tool_count: snapshot.tools.len(),
            exports,
        };
        code.add_file(GeneratedFile {
            path: INDEX_FILE.to_string(),
            content: self.engine.render(INDEX_TEMPLATE, &index)?,
        });

        Ok(code)
    }

    /// Regenerates `out_dir/servers/<server_slug>/` from `snapshot`.
    ///
    /// Returns the server directory.
    ///
    /// # Errors
    ///
    /// - [`Error::GenerationError`] if `server_slug` is empty
    /// - Rendering or filesystem errors; the previous directory is kept
    pub fn generate(
        &self,
        out_dir: &Path,
        server_slug: &str,
        server_name: &str,
        snapshot: &Snapshot,
    ) -> Result<PathBuf> {
        if server_slug.is_empty() {
            return Err(Error::GenerationError {
                server: server_name.to_string(),
                message: "server slug is empty".to_string(),
            });
        }

        let code = self.render_server(server_name, snapshot)?;
        let target = out_dir.join(SERVERS_DIR).join(server_slug);
        replace_dir(&target, &code)?;

        tracing::info!(
            server = %server_name,
            files = code.file_count(),
            "generated wrappers"
        );
        Ok(target)
    }

    /// Renders the output-root README.
    ///
    /// # Errors
    ///
    /// Returns error if template rendering fails.
    pub fn render_readme(&self, out_dir_name: &str, example_slug: Option<&str>) -> Result<String> {
        let example_slug = example_slug.unwrap_or(DEFAULT_EXAMPLE_SLUG);
        let context = ReadmeContext {
            out_dir_name: out_dir_name.to_string(),
            example_module: to_camel_case(example_slug),
            example_slug: example_slug.to_string(),
        };
        self.engine.render(README_TEMPLATE, &context)
    }

    /// Writes `README.md` at the output root.
    ///
    /// # Errors
    ///
    /// Returns error if rendering or writing fails.
    pub fn write_readme(&self, out_dir: &Path, example_slug: Option<&str>) -> Result<PathBuf> {
        let out_dir_name = out_dir
            .file_name()
            .map_or_else(|| "generated".to_string(), |n| n.to_string_lossy().into_owned());
        let content = self.render_readme(&out_dir_name, example_slug)?;
        let path = out_dir.join(README_FILE);
        write_atomic(&path, content.as_bytes())?;
        Ok(path)
    }
}

/// Function name for `tool_name`, suffixed `2`, `3`, ... when an earlier
/// tool already took it. Comparison ignores case so file names stay distinct
/// on case-insensitive filesystems.
fn unique_function_name(tool_name: &str, taken: &mut HashSet<String>) -> String {
    let base = function_identifier(&to_camel_case(tool_name));
    let mut candidate = base.clone();
    let mut n = 2u32;
    while !taken.insert(candidate.to_ascii_lowercase()) {
        candidate = format!("{base}{n}");
        n += 1;
    }
    candidate
}

fn tool_context(server_name: &str, tool: &ToolDefinition, function_name: &str) -> ToolContext {
    let type_name = capitalize(function_name);
    let input_declaration =
        render_input_declaration(&format!("{type_name}Input"), &input_shape(&tool.input_schema));

    ToolContext {
        runtime_module: RUNTIME_MODULE.to_string(),
        header: header_comment(server_name, tool),
        input_declaration,
        type_name,
        function_name: function_name.to_string(),
        server_name_literal: Value::String(server_name.to_string()).to_string(),
        tool_name_literal: Value::String(tool.name.clone()).to_string(),
    }
}

fn header_comment(server_name: &str, tool: &ToolDefinition) -> String {
    let mut header = format!(
        "// server: {}\n// tool: {}",
        single_line(server_name),
        single_line(&tool.name)
    );
    for line in comment_lines(tool.description.trim()) {
        let line = line.trim_end();
        if line.is_empty() {
            header.push_str("\n//");
        } else {
            let _ = write!(header, "\n// {line}");
        }
    }
    header
}

/// Characters that end a `//` comment in TypeScript.
const LINE_TERMINATORS: [char; 4] = ['\r', '\n', '\u{2028}', '\u{2029}'];

fn single_line(text: &str) -> String {
    text.replace(LINE_TERMINATORS, " ")
}

fn comment_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split("\r\n").flat_map(|chunk| chunk.split(LINE_TERMINATORS))
}
