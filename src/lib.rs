mod access;
mod dirty;
mod engine;
mod export;
mod models;
mod ops;
mod path;
mod search_match;
mod tasks;

pub use crate::engine::{CoreEngine, CoreOptions};
pub use crate::models::{
  DocumentSummary, ExportResult, ImportOutcome, JsonPathSegment, NodeChildrenPage, NodeKind,
  NodeView, Task, TaskInfo, TaskKind,
};
pub use crate::path::{decode, encode, JsonPath};
pub use crate::dirty::{canonical, same_value, DirtySet};
pub use crate::search_match::{direct_match, is_hidden, subtree_match};

pub use crate::engine::CoreError;

/// Pure tree access: read, copy-on-write set, copy-on-write delete.
pub mod tree {
  pub use crate::access::{delete, get, set};
}

/// Document-level edits built on [`tree`]. Each returns a new document.
pub mod mutation {
  pub use crate::ops::{
    add_object_child, append_array_item, delete_value, parse_or_string, reset_value, update_value,
  };
}
