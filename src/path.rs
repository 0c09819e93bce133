use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::JsonPathSegment;

/// Structured address of a value inside a document.
///
/// The empty path is the document root. The textual form (`users[0].name`) is only produced at
/// the renderer boundary via [`encode`]; everything inside the crate compares segments directly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JsonPath(Vec<JsonPathSegment>);

impl JsonPath {
  pub fn root() -> Self {
    Self(Vec::new())
  }

  pub fn from_segments(segments: Vec<JsonPathSegment>) -> Self {
    Self(segments)
  }

  /// Lenient parse of a textual path. See [`decode`].
  pub fn parse(text: &str) -> Self {
    Self(decode(text))
  }

  pub fn segments(&self) -> &[JsonPathSegment] {
    &self.0
  }

  pub fn is_root(&self) -> bool {
    self.0.is_empty()
  }

  pub fn depth(&self) -> usize {
    self.0.len()
  }

  pub fn last(&self) -> Option<&JsonPathSegment> {
    self.0.last()
  }

  pub fn key(&self, k: impl Into<String>) -> Self {
    self.child(JsonPathSegment::Key(k.into()))
  }

  pub fn index(&self, i: usize) -> Self {
    self.child(JsonPathSegment::Index(i))
  }

  pub fn child(&self, seg: JsonPathSegment) -> Self {
    let mut segments = Vec::with_capacity(self.0.len() + 1);
    segments.extend(self.0.iter().cloned());
    segments.push(seg);
    Self(segments)
  }

  pub fn parent(&self) -> Option<Self> {
    if self.0.is_empty() {
      return None;
    }
    Some(Self(self.0[..self.0.len() - 1].to_vec()))
  }

  /// Strict proper ancestors, closest first. The root is not included.
  pub fn ancestors(&self) -> impl Iterator<Item = JsonPath> + '_ {
    (1..self.0.len()).rev().map(move |n| Self(self.0[..n].to_vec()))
  }

  /// True when `other` lies strictly below `self`.
  ///
  /// Segment-wise equivalent of the textual rule "`other` starts with `self.` or `self[`".
  pub fn is_strict_ancestor_of(&self, other: &JsonPath) -> bool {
    other.0.len() > self.0.len() && other.0.starts_with(&self.0)
  }

  pub fn encode(&self) -> String {
    encode(&self.0)
  }
}

impl fmt::Display for JsonPath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.encode())
  }
}

impl From<Vec<JsonPathSegment>> for JsonPath {
  fn from(segments: Vec<JsonPathSegment>) -> Self {
    Self(segments)
  }
}

/// Canonical textual form: a leading key is bare, later keys get a `.` prefix, indices are
/// always written as `[N]`.
pub fn encode(segments: &[JsonPathSegment]) -> String {
  let mut out = String::new();
  for (i, seg) in segments.iter().enumerate() {
    match seg {
      JsonPathSegment::Key(k) => {
        if i > 0 {
          out.push('.');
        }
        out.push_str(k);
      }
      JsonPathSegment::Index(idx) => {
        out.push('[');
        out.push_str(&idx.to_string());
        out.push(']');
      }
    }
  }
  out
}

/// Splits on `.`, `[` and `]`, dropping empty tokens. All-digit tokens become indices.
///
/// Never fails: stray delimiters are skipped, and keys that are purely numeric come back as
/// `Index` (the textual form cannot tell them apart).
pub fn decode(text: &str) -> Vec<JsonPathSegment> {
  text
    .split(['.', '[', ']'])
    .filter(|t| !t.is_empty())
    .map(|t| {
      if t.bytes().all(|b| b.is_ascii_digit()) {
        // Too many digits for usize: keep it addressable as a key.
        t.parse::<usize>()
          .map(JsonPathSegment::Index)
          .unwrap_or_else(|_| JsonPathSegment::Key(t.to_string()))
      } else {
        JsonPathSegment::Key(t.to_string())
      }
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn key(k: &str) -> JsonPathSegment {
    JsonPathSegment::Key(k.into())
  }

  #[test]
  fn encode_follows_canonical_rules() {
    assert_eq!(encode(&[]), "");
    assert_eq!(encode(&[key("a"), key("b")]), "a.b");
    assert_eq!(encode(&[key("list"), JsonPathSegment::Index(1)]), "list[1]");
    assert_eq!(encode(&[JsonPathSegment::Index(0), key("x")]), "[0].x");
    assert_eq!(
      encode(&[key("m"), JsonPathSegment::Index(2), JsonPathSegment::Index(3)]),
      "m[2][3]"
    );
  }

  #[test]
  fn decode_inverts_encode_for_non_numeric_keys() {
    let samples = vec![
      vec![],
      vec![key("a")],
      vec![key("users"), JsonPathSegment::Index(10), key("name")],
      vec![JsonPathSegment::Index(0), JsonPathSegment::Index(4), key("z")],
    ];
    for s in samples {
      assert_eq!(decode(&encode(&s)), s);
    }
  }

  #[test]
  fn decode_is_lenient() {
    assert_eq!(decode("a..b"), vec![key("a"), key("b")]);
    assert_eq!(decode("[[1]]"), vec![JsonPathSegment::Index(1)]);
    assert_eq!(decode("a]2"), vec![key("a"), JsonPathSegment::Index(2)]);
    assert_eq!(decode("..."), vec![]);
  }

  #[test]
  fn numeric_keys_decode_as_indices() {
    let p = vec![key("obj"), key("42")];
    assert_eq!(encode(&p), "obj.42");
    assert_eq!(decode("obj.42"), vec![key("obj"), JsonPathSegment::Index(42)]);
  }

  #[test]
  fn oversized_index_token_stays_a_key() {
    let huge = "99999999999999999999999999";
    assert_eq!(decode(huge), vec![key(huge)]);
  }

  #[test]
  fn ancestors_are_closest_first_without_root() {
    let p = JsonPath::parse("a.b[2].c");
    let got: Vec<String> = p.ancestors().map(|a| a.encode()).collect();
    assert_eq!(got, vec!["a.b[2]", "a.b", "a"]);
    assert_eq!(JsonPath::root().ancestors().count(), 0);
    assert_eq!(JsonPath::parse("a").ancestors().count(), 0);
  }

  #[test]
  fn strict_ancestor_is_segment_based() {
    let a = JsonPath::parse("a");
    assert!(a.is_strict_ancestor_of(&JsonPath::parse("a.b")));
    assert!(a.is_strict_ancestor_of(&JsonPath::parse("a[0]")));
    assert!(!a.is_strict_ancestor_of(&a));
    // "ab" starts with "a" as text but is a sibling.
    assert!(!a.is_strict_ancestor_of(&JsonPath::parse("ab")));
    assert!(JsonPath::root().is_strict_ancestor_of(&a));
  }
}
