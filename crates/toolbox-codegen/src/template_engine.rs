//! Template engine for code generation using Handlebars.
//!
//! Wraps Handlebars with the built-in tool, index and README templates
//! pre-registered. Output is TypeScript and Markdown, so HTML escaping is
//! disabled.
//!
//! # Examples
//!
//! ```
//! use mcp_toolbox_codegen::template_engine::TemplateEngine;
//!
//! let mut engine = TemplateEngine::new()?;
//! engine.register_template_string("greeting", "// hello {{name}} & co")?;
//! let out = engine.render("greeting", &serde_json::json!({"name": "<world>"}))?;
//! assert_eq!(out, "// hello <world> & co");
//! # Ok::<(), mcp_toolbox_core::Error>(())
//! ```

use handlebars::Handlebars;
use mcp_toolbox_core::{Error, Result};
use serde::Serialize;

/// Name of the per-tool wrapper template.
pub const TOOL_TEMPLATE: &str = "tool";

/// Name of the per-server index template.
pub const INDEX_TEMPLATE: &str = "index";

/// Name of the output-root README template.
pub const README_TEMPLATE: &str = "readme";

/// Template engine for code generation.
///
/// Strict mode is on: rendering fails when a context is missing a field the
/// template uses.
#[derive(Debug)]
pub struct TemplateEngine<'a> {
    handlebars: Handlebars<'a>,
}

impl<'a> TemplateEngine<'a> {
    /// Creates a new template engine with the built-in templates registered.
    ///
    /// # Errors
    ///
    /// Returns error if a built-in template fails to parse.
    pub fn new() -> Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        handlebars.register_escape_fn(handlebars::no_escape);

        Self::register_builtin_templates(&mut handlebars)?;

        Ok(Self { handlebars })
    }

    fn register_builtin_templates(handlebars: &mut Handlebars<'a>) -> Result<()> {
        let builtins = [
            (TOOL_TEMPLATE, include_str!("../templates/tool.ts.hbs")),
            (INDEX_TEMPLATE, include_str!("../templates/index.ts.hbs")),
            (README_TEMPLATE, include_str!("../templates/README.md.hbs")),
        ];

        for (name, source) in builtins {
            handlebars
                .register_template_string(name, source)
                .map_err(|e| Error::SerializationError {
                    message: format!("Failed to register {name} template: {e}"),
                    source: None,
                })?;
        }

        Ok(())
    }

    /// Renders a template with the given context.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Template name is not registered
    /// - Context cannot be serialized
    /// - A field used by the template is missing from the context
    pub fn render<T: Serialize>(&self, template_name: &str, context: &T) -> Result<String> {
        self.handlebars
            .render(template_name, context)
            .map_err(|e| Error::SerializationError {
                message: format!("Template rendering failed: {e}"),
                source: None,
            })
    }

    /// Registers an additional template.
    ///
    /// # Errors
    ///
    /// Returns error if the template string is invalid.
    pub fn register_template_string(&mut self, name: &str, template: &str) -> Result<()> {
        self.handlebars
            .register_template_string(name, template)
            .map_err(|e| Error::SerializationError {
                message: format!("Failed to register template '{name}': {e}"),
                source: None,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builtin_templates_registered() {
        let engine = TemplateEngine::new().unwrap();
        for name in [TOOL_TEMPLATE, INDEX_TEMPLATE, README_TEMPLATE] {
            assert!(engine.handlebars.has_template(name), "missing {name}");
        }
    }

    #[test]
    fn test_strict_mode_rejects_missing_fields() {
        let engine = TemplateEngine::new().unwrap();
        let result = engine.render(INDEX_TEMPLATE, &json!({"server_name": "x"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_template_fails() {
        let engine = TemplateEngine::new().unwrap();
        assert!(engine.render("nope", &json!({})).is_err());
    }

    #[test]
    fn test_output_is_not_html_escaped() {
        let mut engine = TemplateEngine::new().unwrap();
        engine
            .register_template_string("t", "{{value}}")
            .unwrap();
        let out = engine.render("t", &json!({"value": "Record<string, unknown>"})).unwrap();
        assert_eq!(out, "Record<string, unknown>");
    }
}
