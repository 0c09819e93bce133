use serde_json::Value;

use crate::{engine::CoreError, models::JsonPathSegment, path::JsonPath};

/// Value at `path`, or `None` when the path runs through a missing key, past the end of an
/// array, or into a primitive. A present `null` comes back as `Some(&Value::Null)`.
pub fn get<'a>(doc: &'a Value, path: &JsonPath) -> Option<&'a Value> {
  let mut current = doc;
  for seg in path.segments() {
    current = child(current, seg)?;
  }
  Some(current)
}

/// `path` with every numeric segment that lands on an object turned back into a member key.
///
/// The textual form writes `o.1` and `o[1]` alike as an index; resolving against `doc` gives the
/// one structured path per node that dirty tracking and views key on. Segments past the first
/// missing node are left as they are.
pub fn resolve(doc: &Value, path: &JsonPath) -> JsonPath {
  let mut current = Some(doc);
  let segments = path
    .segments()
    .iter()
    .map(|seg| {
      let seg = match (current, seg) {
        (Some(Value::Object(_)), JsonPathSegment::Index(i)) => JsonPathSegment::Key(i.to_string()),
        _ => seg.clone(),
      };
      current = current.and_then(|v| child(v, &seg));
      seg
    })
    .collect();
  JsonPath::from_segments(segments)
}

/// Copy of `doc` with `value` stored at `path`. The root path replaces the whole document.
///
/// The parent chain must already exist; no intermediate containers are created. Writing at
/// `len` of an array appends, anything past that is rejected.
pub fn set(doc: &Value, path: &JsonPath, value: Value) -> Result<Value, CoreError> {
  let Some((last, parent_segments)) = path.segments().split_last() else {
    return Ok(value);
  };

  let mut out = doc.clone();
  let parent = get_mut(&mut out, parent_segments)
    .ok_or_else(|| CoreError::PathNotFound(crate::path::encode(parent_segments)))?;

  match (parent, last) {
    (Value::Object(map), JsonPathSegment::Key(k)) => {
      map.insert(k.clone(), value);
    }
    // A numeric key decodes as an index; on an object it still names a member.
    (Value::Object(map), JsonPathSegment::Index(i)) => {
      map.insert(i.to_string(), value);
    }
    (Value::Array(items), JsonPathSegment::Index(i)) => {
      let len = items.len();
      if *i < len {
        items[*i] = value;
      } else if *i == len {
        items.push(value);
      } else {
        return Err(CoreError::IndexOutOfBounds {
          path: path.encode(),
          index: *i,
          len,
        });
      }
    }
    (other, seg) => return Err(mismatch(path, seg, other)),
  }
  Ok(out)
}

/// Copy of `doc` without the value at `path`, or `None` when the root itself is deleted.
///
/// Array elements after the removed one shift left. A missing key or out-of-range index is a
/// no-op, but the parent must exist.
pub fn delete(doc: &Value, path: &JsonPath) -> Result<Option<Value>, CoreError> {
  let Some((last, parent_segments)) = path.segments().split_last() else {
    return Ok(None);
  };

  let mut out = doc.clone();
  let parent = get_mut(&mut out, parent_segments)
    .ok_or_else(|| CoreError::PathNotFound(crate::path::encode(parent_segments)))?;

  match (parent, last) {
    (Value::Object(map), JsonPathSegment::Key(k)) => {
      map.shift_remove(k);
    }
    (Value::Object(map), JsonPathSegment::Index(i)) => {
      map.shift_remove(&i.to_string());
    }
    (Value::Array(items), JsonPathSegment::Index(i)) => {
      if *i < items.len() {
        items.remove(*i);
      }
    }
    (other, seg) => return Err(mismatch(path, seg, other)),
  }
  Ok(Some(out))
}

pub(crate) fn value_type_name(v: &Value) -> &'static str {
  match v {
    Value::Null => "null",
    Value::Bool(_) => "boolean",
    Value::Number(_) => "number",
    Value::String(_) => "string",
    Value::Array(_) => "array",
    Value::Object(_) => "object",
  }
}

pub(crate) fn child<'a>(value: &'a Value, seg: &JsonPathSegment) -> Option<&'a Value> {
  match (value, seg) {
    (Value::Object(map), JsonPathSegment::Key(k)) => map.get(k),
    (Value::Object(map), JsonPathSegment::Index(i)) => map.get(&i.to_string()),
    (Value::Array(items), JsonPathSegment::Index(i)) => items.get(*i),
    (Value::Array(_), JsonPathSegment::Key(_)) => None,
    (Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_), _) => None,
  }
}

fn get_mut<'a>(current: &'a mut Value, segments: &[JsonPathSegment]) -> Option<&'a mut Value> {
  match segments {
    [] => Some(current),
    [seg, rest @ ..] => {
      let next = match (current, seg) {
        (Value::Object(map), JsonPathSegment::Key(k)) => map.get_mut(k)?,
        (Value::Object(map), JsonPathSegment::Index(i)) => map.get_mut(&i.to_string())?,
        (Value::Array(items), JsonPathSegment::Index(i)) => items.get_mut(*i)?,
        _ => return None,
      };
      get_mut(next, rest)
    }
  }
}

fn mismatch(path: &JsonPath, seg: &JsonPathSegment, found: &Value) -> CoreError {
  let expected = match seg {
    JsonPathSegment::Key(_) => "object",
    JsonPathSegment::Index(_) => "array",
  };
  CoreError::TypeMismatch {
    path: path.encode(),
    expected,
    found: value_type_name(found),
  }
}
