use serde::{Deserialize, Serialize};

/// A JSON path segment used by the renderer to refer to a node.
///
/// This is intentionally "untagged" so the payload can be a simple
/// array like `["foo", 0, "bar"]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(untagged)]
pub enum JsonPathSegment {
  Key(String),
  Index(usize),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
  Object,
  Array,
  String,
  Number,
  Bool,
  Null,
}

impl NodeKind {
  pub fn of(value: &serde_json::Value) -> Self {
    use serde_json::Value;
    match value {
      Value::Object(_) => NodeKind::Object,
      Value::Array(_) => NodeKind::Array,
      Value::String(_) => NodeKind::String,
      Value::Number(_) => NodeKind::Number,
      Value::Bool(_) => NodeKind::Bool,
      Value::Null => NodeKind::Null,
    }
  }

  pub fn is_container(self) -> bool {
    matches!(self, NodeKind::Object | NodeKind::Array)
  }
}

/// Everything the renderer needs to draw one node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeView {
  /// Canonical textual path (`""` for the root).
  pub path: String,
  /// `key` for object members, `[i]` for array items, `None` for the root.
  pub label: Option<String>,
  pub kind: NodeKind,
  /// Canonical JSON text for primitives, a short summary for containers.
  pub display: String,
  pub child_count: usize,
  /// The node's own value differs from the original document.
  pub edited: bool,
  /// The node or something below it differs from the original document.
  pub contains_edits: bool,
  pub direct_match: bool,
  pub subtree_match: bool,
  /// Only direct children of the root are ever hidden by a search.
  pub hidden: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeChildrenPage {
  pub items: Vec<NodeView>,
  pub next_cursor: Option<u64>,
  pub reached_end: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
  pub kind: NodeKind,
  pub child_count: usize,
  pub dirty_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportOutcome {
  pub summary: DocumentSummary,
  /// Pretty-printed text to echo back into the input field.
  pub echo: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportResult {
  pub output_path: String,
  pub bytes_written: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
  Import,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskInfo {
  pub id: String,
  pub kind: TaskKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
  pub id: String,
  pub kind: TaskKind,
  pub started_at_ms: i64,
  pub finished: bool,
  /// The result replaced the engine state. False for failures and superseded imports.
  pub applied: bool,
  pub error: Option<String>,
  pub outcome: Option<ImportOutcome>,
}
