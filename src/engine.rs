use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use parking_lot::Mutex;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
  access,
  dirty::DirtySet,
  export as export_impl,
  models::{
    DocumentSummary, ExportResult, ImportOutcome, JsonPathSegment, NodeChildrenPage, NodeKind,
    NodeView, Task, TaskInfo,
  },
  ops,
  path::JsonPath,
  search_match::{self, PreparedSearch},
  tasks::TaskManager,
};

const INVALID_INPUT_MESSAGE: &str = "Invalid JSON format. Please check your input.";
pub(crate) const INVALID_FILE_MESSAGE: &str = "Invalid JSON file. Please check the file content.";

#[derive(Debug, Error)]
pub enum CoreError {
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
  /// Top-level input that failed to parse. Carries the user-facing message.
  #[error("{0}")]
  InvalidJson(String),
  #[error("no document loaded")]
  NoDocument,
  #[error("path not found: {0}")]
  PathNotFound(String),
  #[error("index {index} out of bounds (len: {len}) at {path}")]
  IndexOutOfBounds {
    path: String,
    index: usize,
    len: usize,
  },
  #[error("type mismatch at {path}: expected {expected}, found {found}")]
  TypeMismatch {
    path: String,
    expected: &'static str,
    found: &'static str,
  },
  #[error("invalid argument: {0}")]
  InvalidArg(String),
  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
  #[error("task error: {0}")]
  Task(String),
}

#[derive(Debug, Clone)]
pub struct CoreOptions {
  pub export_file_name: String,
  pub export_indent: usize,
  pub preview_max_chars: usize,
  pub default_page_size: usize,
  pub max_import_bytes: u64,
}

impl Default for CoreOptions {
  fn default() -> Self {
    Self {
      export_file_name: "edited-data.json".into(),
      export_indent: 2,
      preview_max_chars: 300,
      default_page_size: 100,
      max_import_bytes: 64 * 1024 * 1024,
    }
  }
}

/// Document, pinned original and dirty set. They only ever change together under one lock.
#[derive(Debug, Default)]
pub(crate) struct SessionState {
  pub(crate) document: Option<Arc<Value>>,
  pub(crate) original: Option<Arc<Value>>,
  pub(crate) dirty: DirtySet,
  pub(crate) error: Option<String>,
  /// Bumped by every load, import and clear.
  pub(crate) generation: u64,
}

#[derive(Clone)]
pub struct CoreEngine {
  options: CoreOptions,
  session: Arc<Mutex<SessionState>>,
  tasks: TaskManager,
}

impl Default for CoreEngine {
  fn default() -> Self {
    Self::new(CoreOptions::default())
  }
}

impl CoreEngine {
  pub fn new(options: CoreOptions) -> Self {
    Self {
      options,
      session: Arc::new(Mutex::new(SessionState::default())),
      tasks: TaskManager::new(),
    }
  }

  pub fn options(&self) -> &CoreOptions {
    &self.options
  }

  /// Parse pasted text and make it both the document and the original.
  ///
  /// On failure the previous state is kept and the error indicator is set.
  pub fn load_text(&self, text: &str) -> Result<DocumentSummary, CoreError> {
    let mut s = self.session.lock();
    match serde_json::from_str::<Value>(text) {
      Ok(value) => {
        info!(bytes = text.len(), "document loaded");
        Ok(install_document(&mut s, value))
      }
      Err(e) => {
        warn!(error = %e, "rejected input");
        s.error = Some(INVALID_INPUT_MESSAGE.into());
        Err(CoreError::InvalidJson(INVALID_INPUT_MESSAGE.into()))
      }
    }
  }

  /// Synchronous import. The outcome carries the pretty-printed text for the input field.
  pub fn import_file(&self, path: impl AsRef<Path>) -> Result<ImportOutcome, CoreError> {
    let path = path.as_ref();
    let parsed = read_import_file(path, self.options.max_import_bytes)
      .and_then(|text| parse_import_text(&text, self.options.export_indent));

    let mut s = self.session.lock();
    match parsed {
      Ok((value, echo)) => {
        info!(path = %path.display(), "document imported");
        let summary = install_document(&mut s, value);
        Ok(ImportOutcome { summary, echo })
      }
      Err(e) => {
        warn!(path = %path.display(), error = %e, "import rejected");
        s.error = Some(INVALID_FILE_MESSAGE.into());
        Err(e)
      }
    }
  }

  /// Import on a worker thread. Poll with [`CoreEngine::get_task`].
  pub fn start_import(&self, path: impl AsRef<Path>) -> TaskInfo {
    let path: PathBuf = path.as_ref().to_path_buf();
    self
      .tasks
      .start_import(path, self.session.clone(), self.options.clone())
  }

  pub fn get_task(&self, task_id: &str) -> Result<Task, CoreError> {
    self.tasks.get_task(task_id).map_err(CoreError::Task)
  }

  /// Drop the document, the original and every dirty path.
  pub fn clear(&self) {
    let mut s = self.session.lock();
    s.document = None;
    s.original = None;
    s.dirty = DirtySet::default();
    s.error = None;
    s.generation += 1;
    debug!("session cleared");
  }

  pub fn document(&self) -> Option<Arc<Value>> {
    self.session.lock().document.clone()
  }

  pub fn original(&self) -> Option<Arc<Value>> {
    self.session.lock().original.clone()
  }

  pub fn dirty_set(&self) -> DirtySet {
    self.session.lock().dirty.clone()
  }

  /// Encoded dirty paths, sorted.
  pub fn dirty_paths(&self) -> Vec<String> {
    self.session.lock().dirty.encoded()
  }

  pub fn last_error(&self) -> Option<String> {
    self.session.lock().error.clone()
  }

  pub fn summary(&self) -> Option<DocumentSummary> {
    let s = self.session.lock();
    s.document.as_deref().map(|doc| summarize(doc, &s.dirty))
  }

  pub fn update_value(&self, path: &str, raw: &str) -> Result<Option<DocumentSummary>, CoreError> {
    self.apply_edit("update", path, |doc, path, original, dirty| {
      let next = ops::update_value(doc, path, raw)?;
      let dirty = dirty.recompute(path, access::get(&next, path), original);
      Ok((Some(next), dirty))
    })
  }

  pub fn delete_value(&self, path: &str) -> Result<Option<DocumentSummary>, CoreError> {
    self.apply_edit("delete", path, |doc, path, original, dirty| {
      let next = ops::delete_value(doc, path)?;
      let dirty = dirty.recompute_delete(path, doc, next.as_ref(), original);
      Ok((next, dirty))
    })
  }

  pub fn add_object_child(
    &self,
    path: &str,
    key: &str,
    raw: &str,
  ) -> Result<Option<DocumentSummary>, CoreError> {
    self.apply_edit("add_child", path, |doc, path, original, dirty| {
      let (next, child) = ops::add_object_child(doc, path, key, raw)?;
      let dirty = dirty.recompute(&child, access::get(&next, &child), original);
      Ok((Some(next), dirty))
    })
  }

  pub fn append_array_item(
    &self,
    path: &str,
    raw: &str,
  ) -> Result<Option<DocumentSummary>, CoreError> {
    self.apply_edit("append", path, |doc, path, original, dirty| {
      let (next, child) = ops::append_array_item(doc, path, raw)?;
      let dirty = dirty.recompute(&child, access::get(&next, &child), original);
      Ok((Some(next), dirty))
    })
  }

  /// Put the original value back at `path`, or remove the node if the original never had it.
  pub fn reset_value(&self, path: &str) -> Result<Option<DocumentSummary>, CoreError> {
    self.apply_edit("reset", path, |doc, path, original, dirty| {
      let restored = original.is_some_and(|o| access::get(o, path).is_some());
      let next = ops::reset_value(doc, path, original)?;
      let dirty = match (&next, restored) {
        (Some(next), true) => dirty.recompute(path, access::get(next, path), original),
        _ => dirty.recompute_delete(path, doc, next.as_ref(), original),
      };
      Ok((next, dirty))
    })
  }

  /// Renderer view of a single node.
  pub fn node_view(&self, path: &str, query: &str) -> Result<NodeView, CoreError> {
    let s = self.session.lock();
    let doc = s.document.as_deref().ok_or(CoreError::NoDocument)?;
    let path = access::resolve(doc, &JsonPath::parse(path));
    let value = access::get(doc, &path).ok_or_else(|| CoreError::PathNotFound(path.encode()))?;

    let (label, key_name) = match path.last() {
      None => (None, None),
      Some(JsonPathSegment::Key(k)) => (Some(k.clone()), Some(k.as_str())),
      Some(JsonPathSegment::Index(i)) => (Some(format!("[{i}]")), None),
    };

    Ok(self.build_view(value, &path, label, key_name, &s.dirty, query))
  }

  /// Direct children of the node at `path`, `limit` at a time starting from `cursor`.
  ///
  /// Hidden children are still listed (with `hidden = true`) so paging stays stable while the
  /// query changes.
  pub fn list_children(
    &self,
    path: &str,
    query: &str,
    cursor: Option<u64>,
    limit: usize,
  ) -> Result<NodeChildrenPage, CoreError> {
    let s = self.session.lock();
    let doc = s.document.as_deref().ok_or(CoreError::NoDocument)?;
    let path = access::resolve(doc, &JsonPath::parse(path));
    let value = access::get(doc, &path).ok_or_else(|| CoreError::PathNotFound(path.encode()))?;

    let cursor = cursor.unwrap_or(0) as usize;
    let limit = if limit == 0 {
      self.options.default_page_size
    } else {
      limit
    };
    let (items, total) = match value {
      Value::Object(map) => {
        let items = map
          .iter()
          .skip(cursor)
          .take(limit)
          .map(|(k, v)| {
            let child = path.key(k.clone());
            self.build_view(v, &child, Some(k.clone()), Some(k.as_str()), &s.dirty, query)
          })
          .collect::<Vec<_>>();
        (items, map.len())
      }
      Value::Array(arr) => {
        let items = arr
          .iter()
          .enumerate()
          .skip(cursor)
          .take(limit)
          .map(|(i, v)| {
            let child = path.index(i);
            self.build_view(v, &child, Some(format!("[{i}]")), None, &s.dirty, query)
          })
          .collect::<Vec<_>>();
        (items, arr.len())
      }
      Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => (vec![], 0),
    };

    let next = cursor + items.len();
    let reached_end = next >= total;
    Ok(NodeChildrenPage {
      items,
      next_cursor: if reached_end { None } else { Some(next as u64) },
      reached_end,
    })
  }

  /// The current document pretty-printed, as shown in the output preview.
  pub fn current_output(&self) -> Result<Option<String>, CoreError> {
    let doc = self.document();
    doc
      .as_deref()
      .map(|d| export_impl::render_pretty(d, self.options.export_indent))
      .transpose()
  }

  /// Write the current document to `<output_dir>/<export_file_name>`. No-op without a document.
  pub fn export(&self, output_dir: impl AsRef<Path>) -> Result<Option<ExportResult>, CoreError> {
    let Some(doc) = self.document() else {
      debug!("export skipped: no document");
      return Ok(None);
    };
    let res = export_impl::export(
      &doc,
      output_dir.as_ref(),
      &self.options.export_file_name,
      self.options.export_indent,
    )?;
    info!(output = %res.output_path, bytes = res.bytes_written, "document exported");
    Ok(Some(res))
  }

  fn apply_edit<F>(
    &self,
    op: &'static str,
    path: &str,
    edit: F,
  ) -> Result<Option<DocumentSummary>, CoreError>
  where
    F: FnOnce(
      &Value,
      &JsonPath,
      Option<&Value>,
      &DirtySet,
    ) -> Result<(Option<Value>, DirtySet), CoreError>,
  {
    let mut s = self.session.lock();
    let doc = s.document.clone().ok_or(CoreError::NoDocument)?;
    let original = s.original.clone();
    // One structured path per node, so `o.1` and a member added as key "1" share dirty entries.
    let path = access::resolve(&doc, &JsonPath::parse(path));

    let (next, dirty) = match edit(&doc, &path, original.as_deref(), &s.dirty) {
      Ok(res) => res,
      Err(e) => {
        warn!(op, path = %path, error = %e, "edit rejected");
        return Err(e);
      }
    };

    s.document = next.map(Arc::new);
    s.dirty = if s.document.is_some() { dirty } else { DirtySet::default() };
    debug!(op, path = %path, dirty = s.dirty.len(), "edit applied");
    Ok(s.document.as_deref().map(|d| summarize(d, &s.dirty)))
  }

  fn build_view(
    &self,
    value: &Value,
    path: &JsonPath,
    label: Option<String>,
    key_name: Option<&str>,
    dirty: &DirtySet,
    query: &str,
  ) -> NodeView {
    let (direct_match, subtree_match) = match PreparedSearch::new(query) {
      Some(q) => (q.direct(key_name, value), q.subtree(key_name, value)),
      None => (false, true),
    };
    let hidden = search_match::is_hidden(query, path, subtree_match);

    NodeView {
      path: path.encode(),
      label,
      kind: NodeKind::of(value),
      display: display_value(value, self.options.preview_max_chars),
      child_count: child_count(value),
      edited: dirty.contains(path),
      contains_edits: dirty.contains_edits(path),
      direct_match,
      subtree_match,
      hidden,
    }
  }
}

/// Replace document, original and dirty set together.
pub(crate) fn install_document(s: &mut SessionState, value: Value) -> DocumentSummary {
  s.dirty = DirtySet::default();
  let summary = summarize(&value, &s.dirty);
  s.original = Some(Arc::new(value.clone()));
  s.document = Some(Arc::new(value));
  s.error = None;
  s.generation += 1;
  summary
}

pub(crate) fn read_import_file(path: &Path, max_bytes: u64) -> Result<String, CoreError> {
  let len = std::fs::metadata(path)?.len();
  if len > max_bytes {
    return Err(CoreError::InvalidArg(format!(
      "file too large: {} bytes (max {})",
      len, max_bytes
    )));
  }
  let bytes = std::fs::read(path)?;
  Ok(String::from_utf8_lossy(&bytes).to_string())
}

/// Parsed value plus its pretty-printed echo.
pub(crate) fn parse_import_text(text: &str, indent: usize) -> Result<(Value, String), CoreError> {
  let value: Value =
    serde_json::from_str(text).map_err(|_| CoreError::InvalidJson(INVALID_FILE_MESSAGE.into()))?;
  let echo = export_impl::render_pretty(&value, indent)?;
  Ok((value, echo))
}

fn summarize(doc: &Value, dirty: &DirtySet) -> DocumentSummary {
  DocumentSummary {
    kind: NodeKind::of(doc),
    child_count: child_count(doc),
    dirty_count: dirty.len(),
  }
}

fn child_count(value: &Value) -> usize {
  match value {
    Value::Object(map) => map.len(),
    Value::Array(arr) => arr.len(),
    Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => 0,
  }
}

fn display_value(value: &Value, max_chars: usize) -> String {
  match value {
    Value::Object(map) => match map.len() {
      0 => "Object".to_string(),
      1 => "Object (1 property)".to_string(),
      n => format!("Object ({n} properties)"),
    },
    Value::Array(arr) => format!("Array [{} items]", arr.len()),
    Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
      truncate_chars(&value.to_string(), max_chars)
    }
  }
}

fn truncate_chars(s: &str, max: usize) -> String {
  if max == 0 {
    return String::new();
  }
  let mut out = String::new();
  for (i, ch) in s.chars().enumerate() {
    if i >= max {
      out.push('…');
      break;
    }
    out.push(ch);
  }
  out
}
