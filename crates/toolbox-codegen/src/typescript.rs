//! JSON Schema to TypeScript mapping and identifier helpers.
//!
//! The mapping is deliberately shallow: only the top-level input object
//! becomes an interface, and nested objects collapse to
//! `Record<string, unknown>`.
//!
//! # Examples
//!
//! ```
//! use mcp_toolbox_codegen::typescript::{json_schema_to_ts_type, to_camel_case};
//! use serde_json::json;
//!
//! assert_eq!(json_schema_to_ts_type(&json!({"type": "array", "items": {"type": "integer"}})), "number[]");
//! assert_eq!(to_camel_case("fs_search_files"), "fsSearchFiles");
//! ```

use serde_json::Value;
use std::fmt::Write;

/// Type used for objects and anything with `properties`.
pub const RECORD_TYPE: &str = "Record<string, unknown>";

/// Fallback type for unions and unrecognised schemas.
pub const UNKNOWN_TYPE: &str = "unknown";

const RESERVED_WORDS: &[&str] = &[
    "await", "break", "case", "catch", "class", "const", "continue", "debugger", "default",
    "delete", "do", "else", "enum", "export", "extends", "false", "finally", "for", "function",
    "if", "implements", "import", "in", "instanceof", "interface", "let", "new", "null",
    "package", "private", "protected", "public", "return", "static", "super", "switch", "this",
    "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield",
];

/// Maps a JSON Schema node to a TypeScript type expression.
///
/// # Examples
///
/// ```
/// use mcp_toolbox_codegen::typescript::json_schema_to_ts_type;
/// use serde_json::json;
///
/// assert_eq!(json_schema_to_ts_type(&json!({"type": "integer"})), "number");
/// assert_eq!(json_schema_to_ts_type(&json!({"properties": {}})), "Record<string, unknown>");
/// assert_eq!(json_schema_to_ts_type(&json!({"anyOf": [{"type": "string"}]})), "unknown");
/// assert_eq!(json_schema_to_ts_type(&json!({"type": "array"})), "unknown[]");
/// ```
#[must_use]
pub fn json_schema_to_ts_type(schema: &Value) -> String {
    let Value::Object(obj) = schema else {
        return UNKNOWN_TYPE.to_string();
    };

    match obj.get("type").and_then(Value::as_str) {
        Some("string") => "string".to_string(),
        Some("number" | "integer") => "number".to_string(),
        Some("boolean") => "boolean".to_string(),
        Some("null") => "null".to_string(),
        Some("array") => {
            let items = obj
                .get("items")
                .map_or_else(|| UNKNOWN_TYPE.to_string(), json_schema_to_ts_type);
            format!("{items}[]")
        }
        Some("object") => RECORD_TYPE.to_string(),
        _ if obj.contains_key("properties") => RECORD_TYPE.to_string(),
        _ => UNKNOWN_TYPE.to_string(),
    }
}

/// One property of a generated input interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsProperty {
    /// Property key, quoted when it is not a valid identifier
    pub name: String,
    /// Whether the key is absent from `required`
    pub optional: bool,
    /// TypeScript type expression
    pub ts_type: String,
}

/// Shape of a tool's generated input type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputShape {
    /// `export interface ... { ... }`
    Interface(Vec<TsProperty>),
    /// `export type ... = <expr>;` for non-object schemas
    Alias(String),
}

/// Derives the input declaration for a tool's input schema.
///
/// # Examples
///
/// ```
/// use mcp_toolbox_codegen::typescript::{InputShape, input_shape};
/// use serde_json::json;
///
/// let shape = input_shape(&json!({
///     "type": "object",
///     "properties": {"path": {"type": "string"}, "dry-run": {"type": "boolean"}},
///     "required": ["path"]
/// }));
///
/// let InputShape::Interface(props) = shape else { panic!("expected interface") };
/// let path = props.iter().find(|p| p.name == "path").unwrap();
/// let dry_run = props.iter().find(|p| p.name == "\"dry-run\"").unwrap();
/// assert!(!path.optional);
/// assert!(dry_run.optional);
/// ```
#[must_use]
pub fn input_shape(schema: &Value) -> InputShape {
    let Value::Object(obj) = schema else {
        return InputShape::Alias(UNKNOWN_TYPE.to_string());
    };

    let is_object =
        obj.get("type").and_then(Value::as_str) == Some("object") || obj.contains_key("properties");
    if !is_object {
        return InputShape::Alias(json_schema_to_ts_type(schema));
    }

    let required: Vec<&str> = obj
        .get("required")
        .and_then(Value::as_array)
        .map(|keys| keys.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let properties = obj
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| {
            props
                .iter()
                .map(|(key, prop)| TsProperty {
                    name: safe_prop(key),
                    optional: !required.contains(&key.as_str()),
                    ts_type: json_schema_to_ts_type(prop),
                })
                .collect()
        })
        .unwrap_or_default();

    InputShape::Interface(properties)
}

/// Renders the `export interface` or `export type` declaration for `shape`.
///
/// # Examples
///
/// ```
/// use mcp_toolbox_codegen::typescript::{InputShape, TsProperty, render_input_declaration};
///
/// let shape = InputShape::Interface(vec![TsProperty {
///     name: "path".to_string(),
///     optional: false,
///     ts_type: "string".to_string(),
/// }]);
/// assert_eq!(
///     render_input_declaration("ReadInput", &shape),
///     "export interface ReadInput {\n  path: string;\n}"
/// );
/// assert_eq!(
///     render_input_declaration("EchoInput", &InputShape::Alias("string".to_string())),
///     "export type EchoInput = string;"
/// );
/// ```
#[must_use]
pub fn render_input_declaration(type_name: &str, shape: &InputShape) -> String {
    match shape {
        InputShape::Alias(expr) => format!("export type {type_name} = {expr};"),
        InputShape::Interface(properties) => {
            let mut out = format!("export interface {type_name} {{\n");
            for prop in properties {
                let marker = if prop.optional { "?" } else { "" };
                let _ = writeln!(out, "  {}{marker}: {};", prop.name, prop.ts_type);
            }
            out.push('}');
            out
        }
    }
}

/// Returns `true` if `key` is a plain JavaScript identifier.
#[must_use]
pub fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Renders an object key, JSON-quoting it unless it is an identifier.
///
/// # Examples
///
/// ```
/// use mcp_toolbox_codegen::typescript::safe_prop;
///
/// assert_eq!(safe_prop("chat_id"), "chat_id");
/// assert_eq!(safe_prop("x-api-key"), "\"x-api-key\"");
/// ```
#[must_use]
pub fn safe_prop(key: &str) -> String {
    if is_identifier(key) {
        key.to_string()
    } else {
        Value::String(key.to_string()).to_string()
    }
}

/// Converts a tool name to camelCase.
///
/// The name is split on runs of non-alphanumeric characters; the first part
/// is lowercased and each following part capitalised. A name with no
/// alphanumeric characters becomes `tool`.
///
/// # Examples
///
/// ```
/// use mcp_toolbox_codegen::typescript::to_camel_case;
///
/// assert_eq!(to_camel_case("send_message"), "sendMessage");
/// assert_eq!(to_camel_case("Get-USER.data"), "getUserData");
/// assert_eq!(to_camel_case("---"), "tool");
/// ```
#[must_use]
pub fn to_camel_case(name: &str) -> String {
    let mut parts = name
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty());

    let Some(first) = parts.next() else {
        return "tool".to_string();
    };

    let mut out = first.to_ascii_lowercase();
    for part in parts {
        out.push_str(&capitalize(&part.to_ascii_lowercase()));
    }
    out
}

/// Converts a tool name to PascalCase.
///
/// # Examples
///
/// ```
/// use mcp_toolbox_codegen::typescript::to_pascal_case;
///
/// assert_eq!(to_pascal_case("fs_search_files"), "FsSearchFiles");
/// ```
#[must_use]
pub fn to_pascal_case(name: &str) -> String {
    capitalize(&to_camel_case(name))
}

/// Uppercases the first character.
#[must_use]
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().collect::<String>() + chars.as_str()
    })
}

/// Makes a camelCase name usable as a function identifier.
///
/// Names starting with a digit get a `tool` prefix; reserved words get a
/// `Tool` suffix.
///
/// # Examples
///
/// ```
/// use mcp_toolbox_codegen::typescript::function_identifier;
///
/// assert_eq!(function_identifier("listFiles"), "listFiles");
/// assert_eq!(function_identifier("delete"), "deleteTool");
/// assert_eq!(function_identifier("2faVerify"), "tool2faVerify");
/// ```
#[must_use]
pub fn function_identifier(camel: &str) -> String {
    if camel.starts_with(|c: char| c.is_ascii_digit()) {
        format!("tool{camel}")
    } else if RESERVED_WORDS.contains(&camel) {
        format!("{camel}Tool")
    } else {
        camel.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_primitive_types() {
        assert_eq!(json_schema_to_ts_type(&json!({"type": "string"})), "string");
        assert_eq!(json_schema_to_ts_type(&json!({"type": "number"})), "number");
        assert_eq!(json_schema_to_ts_type(&json!({"type": "boolean"})), "boolean");
        assert_eq!(json_schema_to_ts_type(&json!({"type": "null"})), "null");
    }

    #[test]
    fn test_nested_arrays() {
        let schema = json!({"type": "array", "items": {"type": "array", "items": {"type": "string"}}});
        assert_eq!(json_schema_to_ts_type(&schema), "string[][]");
    }

    #[test]
    fn test_union_and_invalid_schemas_are_unknown() {
        assert_eq!(json_schema_to_ts_type(&json!({"oneOf": []})), "unknown");
        assert_eq!(json_schema_to_ts_type(&json!({"type": ["string", "null"]})), "unknown");
        assert_eq!(json_schema_to_ts_type(&json!(true)), "unknown");
    }

    #[test]
    fn test_nested_object_collapses_to_record() {
        let schema = json!({"type": "object", "properties": {"inner": {"type": "object"}}});
        let InputShape::Interface(props) = input_shape(&schema) else {
            panic!("expected interface");
        };
        assert_eq!(props[0].ts_type, RECORD_TYPE);
    }

    #[test]
    fn test_non_object_schema_is_alias() {
        assert_eq!(
            input_shape(&json!({"type": "string"})),
            InputShape::Alias("string".to_string())
        );
        assert_eq!(input_shape(&json!(null)), InputShape::Alias("unknown".to_string()));
    }

    #[test]
    fn test_object_without_properties_is_empty_interface() {
        assert_eq!(input_shape(&json!({"type": "object"})), InputShape::Interface(vec![]));
    }

    #[test]
    fn test_identifier_rules() {
        assert!(is_identifier("$ref"));
        assert!(is_identifier("_private"));
        assert!(!is_identifier("1st"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("naïve"));
    }

    #[test]
    fn test_camel_case_lowercases_parts() {
        assert_eq!(to_camel_case("HTTP_REQUEST"), "httpRequest");
        assert_eq!(to_camel_case("fsSearchFiles"), "fssearchfiles");
        assert_eq!(to_camel_case("  spaced  out "), "spacedOut");
    }
}
