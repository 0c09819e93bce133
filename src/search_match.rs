use serde_json::Value;

use crate::path::JsonPath;

/// Case-insensitive substring query, lowercased once up front.
#[derive(Debug, Clone)]
pub(crate) struct PreparedSearch {
  q: String,
}

impl PreparedSearch {
  /// `None` for an empty query, which matches everything.
  pub(crate) fn new(query: &str) -> Option<Self> {
    if query.is_empty() {
      return None;
    }
    Some(Self {
      q: query.to_lowercase(),
    })
  }

  pub(crate) fn matches_in_hay(&self, hay: &str) -> bool {
    hay.to_lowercase().contains(&self.q)
  }

  /// The node's own key, or its own string value, contains the query.
  pub(crate) fn direct(&self, key_name: Option<&str>, value: &Value) -> bool {
    if key_name.is_some_and(|k| self.matches_in_hay(k)) {
      return true;
    }
    match value {
      Value::String(s) => self.matches_in_hay(s),
      Value::Null | Value::Bool(_) | Value::Number(_) | Value::Array(_) | Value::Object(_) => false,
    }
  }

  pub(crate) fn subtree(&self, key_name: Option<&str>, value: &Value) -> bool {
    if self.direct(key_name, value) {
      return true;
    }
    match value {
      Value::Object(map) => map.iter().any(|(k, v)| self.subtree(Some(k), v)),
      Value::Array(items) => items.iter().any(|v| self.subtree(None, v)),
      Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => false,
    }
  }
}

/// True if `query` is non-empty and occurs (ignoring case) in `key_name` or in a string `value`.
pub fn direct_match(query: &str, key_name: Option<&str>, value: &Value) -> bool {
  PreparedSearch::new(query).is_some_and(|s| s.direct(key_name, value))
}

/// True if `query` is empty, or the node or any descendant directly matches.
pub fn subtree_match(query: &str, key_name: Option<&str>, value: &Value) -> bool {
  match PreparedSearch::new(query) {
    None => true,
    Some(s) => s.subtree(key_name, value),
  }
}

/// Search filtering only ever hides direct children of the root; deeper nodes are highlighted
/// but stay visible.
pub fn is_hidden(query: &str, path: &JsonPath, subtree_matched: bool) -> bool {
  !query.is_empty() && path.depth() == 1 && !subtree_matched
}
