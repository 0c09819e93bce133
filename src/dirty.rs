use std::collections::HashSet;

use serde_json::Value;

use crate::{access, models::JsonPathSegment, path::JsonPath};

/// Paths whose value differs from the pinned original, plus every ancestor of such a path.
///
/// Values are immutable: each `recompute*` call returns the next set and leaves `self` alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirtySet {
  paths: HashSet<JsonPath>,
}

impl DirtySet {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.paths.len()
  }

  pub fn is_empty(&self) -> bool {
    self.paths.is_empty()
  }

  pub fn contains(&self, path: &JsonPath) -> bool {
    self.paths.contains(path)
  }

  pub fn has_dirty_descendant(&self, path: &JsonPath) -> bool {
    self.paths.iter().any(|p| path.is_strict_ancestor_of(p))
  }

  /// The ancestor highlight: the node itself or anything below it is dirty.
  pub fn contains_edits(&self, path: &JsonPath) -> bool {
    self.contains(path) || self.has_dirty_descendant(path)
  }

  pub fn iter(&self) -> impl Iterator<Item = &JsonPath> {
    self.paths.iter()
  }

  /// Encoded paths, sorted for stable output.
  pub fn encoded(&self) -> Vec<String> {
    let mut out: Vec<String> = self.paths.iter().map(JsonPath::encode).collect();
    out.sort();
    out
  }

  /// Next set after `new_value` was written at `path` (`None` when nothing lives there now).
  ///
  /// The edited path is kept iff it no longer matches the original under canonical
  /// serialization. The subtree below `path` is diffed afresh against the original, so entries
  /// there reflect the new value. Ancestors are then resolved closest first: present iff a dirty
  /// descendant remains.
  pub fn recompute(
    &self,
    path: &JsonPath,
    new_value: Option<&Value>,
    original_doc: Option<&Value>,
  ) -> DirtySet {
    let mut next = self.clone();
    next.record(path, new_value, original_doc);
    next
  }

  /// Next set after the value at `path` was removed. `before` is the document prior to the
  /// delete, `after` the result (`None` when the whole document was cleared).
  ///
  /// Removing an array element shifts its successors, so every slot from the removed index to
  /// the old end is re-recorded against the original.
  pub fn recompute_delete(
    &self,
    path: &JsonPath,
    before: &Value,
    after: Option<&Value>,
    original_doc: Option<&Value>,
  ) -> DirtySet {
    let (Some(parent), Some(after)) = (path.parent(), after) else {
      return DirtySet::default();
    };

    let mut next = self.clone();
    match (access::get(before, &parent), path.last()) {
      (Some(Value::Array(items)), Some(JsonPathSegment::Index(i))) => {
        for slot in *i..items.len() {
          let slot_path = parent.index(slot);
          next.record(&slot_path, access::get(after, &slot_path), original_doc);
        }
      }
      _ => next.record(path, None, original_doc),
    }
    next
  }

  fn record(&mut self, path: &JsonPath, new_value: Option<&Value>, original_doc: Option<&Value>) {
    let original_value = original_doc.and_then(|doc| access::get(doc, path));

    self.paths.retain(|p| p != path && !path.is_strict_ancestor_of(p));
    self.diff_subtree(path, new_value, original_value);

    for ancestor in path.ancestors() {
      if self.has_dirty_descendant(&ancestor) {
        self.paths.insert(ancestor);
      } else {
        self.paths.remove(&ancestor);
      }
    }

    tracing::debug!(path = %path, dirty = self.paths.len(), "dirty set recomputed");
  }

  /// Inserts `path` and every differing path below it. Members on either side are visited, so a
  /// key the original had and the current value lacks is recorded as well.
  fn diff_subtree(&mut self, path: &JsonPath, current: Option<&Value>, original: Option<&Value>) {
    if same_value(current, original) {
      return;
    }
    self.paths.insert(path.clone());

    let mut seen = HashSet::new();
    for seg in child_segments(current).into_iter().chain(child_segments(original)) {
      if !seen.insert(seg.clone()) {
        continue;
      }
      let cur = current.and_then(|v| access::child(v, &seg));
      let orig = original.and_then(|v| access::child(v, &seg));
      self.diff_subtree(&path.child(seg), cur, orig);
    }
  }
}

/// Member keys of an object or slot indices of an array; nothing for primitives.
fn child_segments(value: Option<&Value>) -> Vec<JsonPathSegment> {
  match value {
    Some(Value::Object(map)) => map.keys().map(|k| JsonPathSegment::Key(k.clone())).collect(),
    Some(Value::Array(items)) => (0..items.len()).map(JsonPathSegment::Index).collect(),
    Some(Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_)) | None => vec![],
  }
}

/// Canonical serialization used for equality. Object key order is significant.
pub fn canonical(value: &Value) -> String {
  value.to_string()
}

/// Missing on either side only equals missing on the other.
pub fn same_value(a: Option<&Value>, b: Option<&Value>) -> bool {
  match (a, b) {
    (Some(a), Some(b)) => canonical(a) == canonical(b),
    (None, None) => true,
    _ => false,
  }
}
