use serde_json::Value;

use crate::{
  access::{self, value_type_name},
  engine::CoreError,
  path::JsonPath,
};

/// Editor input is JSON when it parses, otherwise the raw text becomes a string value.
pub fn parse_or_string(raw: &str) -> Value {
  serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

pub fn update_value(doc: &Value, path: &JsonPath, raw: &str) -> Result<Value, CoreError> {
  access::set(doc, path, parse_or_string(raw))
}

pub fn delete_value(doc: &Value, path: &JsonPath) -> Result<Option<Value>, CoreError> {
  access::delete(doc, path)
}

/// Sets `key` on the object at `path`; an existing key is overwritten in place.
/// Returns the new document and the child's path.
pub fn add_object_child(
  doc: &Value,
  path: &JsonPath,
  key: &str,
  raw: &str,
) -> Result<(Value, JsonPath), CoreError> {
  if key.is_empty() {
    return Err(CoreError::InvalidArg("key must not be empty".into()));
  }
  expect_container(doc, path, "object")?;
  let child = path.key(key);
  let out = access::set(doc, &child, parse_or_string(raw))?;
  Ok((out, child))
}

/// Appends to the array at `path`. Returns the new document and the new item's path.
pub fn append_array_item(
  doc: &Value,
  path: &JsonPath,
  raw: &str,
) -> Result<(Value, JsonPath), CoreError> {
  let len = match expect_container(doc, path, "array")? {
    Value::Array(items) => items.len(),
    _ => 0,
  };
  let child = path.index(len);
  let out = access::set(doc, &child, parse_or_string(raw))?;
  Ok((out, child))
}

/// Puts the original value back at `path`. A node that did not exist in the original is
/// removed instead, so `None` means the document itself was cleared.
pub fn reset_value(
  doc: &Value,
  path: &JsonPath,
  original_doc: Option<&Value>,
) -> Result<Option<Value>, CoreError> {
  match original_doc.and_then(|o| access::get(o, path)) {
    Some(original) => access::set(doc, path, original.clone()).map(Some),
    None => access::delete(doc, path),
  }
}

fn expect_container<'a>(
  doc: &'a Value,
  path: &JsonPath,
  expected: &'static str,
) -> Result<&'a Value, CoreError> {
  let target = access::get(doc, path).ok_or_else(|| CoreError::PathNotFound(path.encode()))?;
  let ok = match target {
    Value::Object(_) => expected == "object",
    Value::Array(_) => expected == "array",
    Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => false,
  };
  if !ok {
    return Err(CoreError::TypeMismatch {
      path: path.encode(),
      expected,
      found: value_type_name(target),
    });
  }
  Ok(target)
}
