//! Snapshot diffing.
//!
//! Tools are matched by name. For a tool present in both snapshots every
//! differing JSON leaf is reported as a dotted field path, for example
//! `inputSchema.properties.path.type`. A change whose paths are all
//! documentation (descriptions, titles, examples, comments, annotations) is
//! reported as [`ToolChange::ToolDescriptionChanged`]; anything else is a
//! [`ToolChange::ToolChanged`] and makes the diff breaking.
//!
//! Arrays of equal length are compared element by element, with the index as
//! a path segment (`inputSchema.anyOf.1.description`). Arrays whose length
//! changed are reported as a whole.

use mcp_toolbox_introspector::{Snapshot, ToolDefinition};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Keys whose values never affect a tool's call shape.
const DOCUMENTATION_KEYS: &[&str] = &["description", "title", "examples", "$comment"];

/// Keys whose children are names chosen by the schema author, not keywords.
const NAMED_CHILDREN_KEYS: &[&str] = &["properties", "patternProperties", "$defs", "definitions"];

/// One change between two snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ToolChange {
    /// The tool only exists in the new snapshot.
    ToolAdded {
        /// Tool name
        tool_name: String,
    },
    /// The tool only exists in the old snapshot.
    ToolRemoved {
        /// Tool name
        tool_name: String,
    },
    /// The tool's call shape changed.
    ToolChanged {
        /// Tool name
        tool_name: String,
        /// Every differing field path, sorted
        fields: Vec<String>,
    },
    /// Only documentation changed.
    ToolDescriptionChanged {
        /// Tool name
        tool_name: String,
    },
}

impl ToolChange {
    /// Name of the affected tool.
    #[must_use]
    pub fn tool_name(&self) -> &str {
        match self {
            Self::ToolAdded { tool_name }
            | Self::ToolRemoved { tool_name }
            | Self::ToolChanged { tool_name, .. }
            | Self::ToolDescriptionChanged { tool_name } => tool_name,
        }
    }

    /// Returns `true` for removals and shape changes.
    #[must_use]
    pub const fn is_breaking(&self) -> bool {
        matches!(self, Self::ToolRemoved { .. } | Self::ToolChanged { .. })
    }
}

/// Result of comparing two snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary {
    /// `true` iff `changes` holds a removal or a shape change
    pub breaking: bool,
    /// Changes in reporting order
    pub changes: Vec<ToolChange>,
}

impl DiffSummary {
    /// Returns `true` when nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// The breaking changes only.
    pub fn breaking_changes(&self) -> impl Iterator<Item = &ToolChange> {
        self.changes.iter().filter(|change| change.is_breaking())
    }
}

/// Compares two snapshots.
///
/// # Examples
///
/// ```
/// use mcp_toolbox_introspector::{Snapshot, ToolDefinition, TransportDescriptor};
/// use mcp_toolbox_snapshot::{ToolChange, diff_snapshots};
/// use serde_json::json;
///
/// let snapshot = |tools| Snapshot {
///     server_name: "demo".to_string(),
///     version: "latest".to_string(),
///     retrieved_at: "2025-01-01T00:00:00.000Z".to_string(),
///     transport: TransportDescriptor::Stdio { command: "demo".to_string(), args: vec![] },
///     tools,
/// };
/// let old = snapshot(vec![ToolDefinition::new("a", "d", json!({}))]);
/// let new = snapshot(vec![]);
///
/// let diff = diff_snapshots(&old, &new);
/// assert!(diff.breaking);
/// assert_eq!(diff.changes, vec![ToolChange::ToolRemoved { tool_name: "a".to_string() }]);
/// ```
#[must_use]
pub fn diff_snapshots(old: &Snapshot, new: &Snapshot) -> DiffSummary {
    diff_tools(&old.tools, &new.tools)
}

/// Compares two tool lists.
///
/// Shape and documentation changes come first, in new-list order, followed
/// by additions in new-list order and removals in old-list order.
#[must_use]
pub fn diff_tools(old: &[ToolDefinition], new: &[ToolDefinition]) -> DiffSummary {
    let old_by_name = index_by_name(old);
    let new_by_name = index_by_name(new);

    let mut changes = Vec::new();
    let mut added = Vec::new();
    let mut seen = HashSet::new();

    for tool in new {
        if !seen.insert(tool.name.as_str()) {
            continue;
        }
        match old_by_name.get(tool.name.as_str()) {
            Some(previous) => changes.extend(compare_tool(previous, tool)),
            None => added.push(ToolChange::ToolAdded {
                tool_name: tool.name.clone(),
            }),
        }
    }
    changes.append(&mut added);

    let mut seen = HashSet::new();
    for tool in old {
        if seen.insert(tool.name.as_str()) && !new_by_name.contains_key(tool.name.as_str()) {
            changes.push(ToolChange::ToolRemoved {
                tool_name: tool.name.clone(),
            });
        }
    }

    DiffSummary {
        breaking: changes.iter().any(ToolChange::is_breaking),
        changes,
    }
}

fn index_by_name(tools: &[ToolDefinition]) -> HashMap<&str, &ToolDefinition> {
    let mut index = HashMap::with_capacity(tools.len());
    for tool in tools {
        index.entry(tool.name.as_str()).or_insert(tool);
    }
    index
}

fn compare_tool(old: &ToolDefinition, new: &ToolDefinition) -> Option<ToolChange> {
    let old_value = serde_json::to_value(old).unwrap_or(Value::Null);
    let new_value = serde_json::to_value(new).unwrap_or(Value::Null);

    let mut paths = BTreeSet::new();
    collect_changed_paths(&mut Vec::new(), Some(&old_value), Some(&new_value), &mut paths);
    if paths.is_empty() {
        return None;
    }

    let tool_name = new.name.clone();
    if paths.iter().all(|path| is_documentation_path(path)) {
        Some(ToolChange::ToolDescriptionChanged { tool_name })
    } else {
        Some(ToolChange::ToolChanged {
            tool_name,
            fields: paths.into_iter().map(|path| path.join(".")).collect(),
        })
    }
}

fn collect_changed_paths<'a>(
    prefix: &mut Vec<Cow<'a, str>>,
    old: Option<&'a Value>,
    new: Option<&'a Value>,
    out: &mut BTreeSet<Vec<Cow<'a, str>>>,
) {
    if old == new {
        return;
    }
    match (old, new) {
        (Some(Value::Object(old_map)), Some(Value::Object(new_map))) => {
            let keys: BTreeSet<&str> = old_map
                .keys()
                .chain(new_map.keys())
                .map(String::as_str)
                .collect();
            for key in keys {
                prefix.push(Cow::Borrowed(key));
                collect_changed_paths(prefix, old_map.get(key), new_map.get(key), out);
                prefix.pop();
            }
        }
        (Some(Value::Array(old_items)), Some(Value::Array(new_items)))
            if old_items.len() == new_items.len() =>
        {
            for (index, (old_item, new_item)) in old_items.iter().zip(new_items).enumerate() {
                prefix.push(Cow::Owned(index.to_string()));
                collect_changed_paths(prefix, Some(old_item), Some(new_item), out);
                prefix.pop();
            }
        }
        _ => {
            out.insert(prefix.clone());
        }
    }
}

fn is_documentation_path(path: &[Cow<'_, str>]) -> bool {
    if path.first().is_some_and(|first| first == "annotations") {
        return true;
    }
    path.iter().enumerate().any(|(i, segment)| {
        DOCUMENTATION_KEYS.contains(&segment.as_ref())
            && (i == 0 || !NAMED_CHILDREN_KEYS.contains(&path[i - 1].as_ref()))
    })
}
