//! Nested attribute addressing
//!
//! Attributes may live below the top level of a record. A [`Path`] addresses
//! them with dotted and bracket notation:
//!
//! - `name` → top-level key
//! - `address.city` → nested object key
//! - `tags[0]` / `tags.0` → array element
//! - `meta["content-type"]` → quoted key containing separators
//!
//! Reads never allocate and return `None` for any missing step. Writes create
//! intermediate containers on demand: a missing step followed by an index
//! becomes an array (padded with `null`), anything else becomes an object.
//! A write that would pad an array with more than [`MAX_ARRAY_PADDING`]
//! placeholders is refused before anything is touched.

use crate::error::PathError;
use serde_json::{Map, Value};
use std::fmt;

/// Most `null` placeholders a single write may append to an array.
pub const MAX_ARRAY_PADDING: usize = 1024;

// ============================================================================
// SEGMENT
// ============================================================================

/// One step of a [`Path`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Object key.
    Key(String),
    /// Array index (from bracket notation).
    Index(usize),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(key) => f.write_str(key),
            Segment::Index(index) => write!(f, "[{index}]"),
        }
    }
}

// ============================================================================
// PATH
// ============================================================================

/// A parsed attribute path.
///
/// # Examples
///
/// ```
/// use tessera_validator::path::Path;
/// use serde_json::json;
///
/// let path = Path::parse("address.lines[1]");
/// let mut record = json!({});
/// path.set(&mut record, json!("Flat 2"))?;
///
/// assert_eq!(record, json!({ "address": { "lines": [null, "Flat 2"] } }));
/// assert_eq!(path.get(&record), Some(&json!("Flat 2")));
/// # Ok::<(), tessera_validator::PathError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path {
    raw: String,
    segments: Vec<Segment>,
}

impl Path {
    /// Parses a dotted/bracket path. Parsing is total: any string is a path.
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let segments = parse_segments(&raw);
        Self { raw, segments }
    }

    /// The path as it was written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The parsed steps.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The top-level key this path starts at, if it starts at a key.
    pub fn root(&self) -> Option<&str> {
        match self.segments.first() {
            Some(Segment::Key(key)) => Some(key.as_str()),
            _ => None,
        }
    }

    /// Whether the path addresses something below the top level.
    pub fn is_nested(&self) -> bool {
        self.segments.len() > 1
    }

    /// Reads the value at this path.
    pub fn get<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.segments.iter().try_fold(root, step)
    }

    /// Mutable access to an existing value at this path. Never allocates.
    pub fn get_mut<'a>(&self, root: &'a mut Value) -> Option<&'a mut Value> {
        self.segments
            .iter()
            .try_fold(root, |node, segment| match (segment, node) {
                (Segment::Key(key), Value::Object(map)) => map.get_mut(key),
                (Segment::Key(key), Value::Array(items)) => key
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| items.get_mut(index)),
                (Segment::Index(index), Value::Array(items)) => items.get_mut(*index),
                (Segment::Index(index), Value::Object(map)) => map.get_mut(&index.to_string()),
                _ => None,
            })
    }

    /// Writes `value` at this path, creating intermediate containers.
    ///
    /// An empty path replaces the root. `root` is left untouched when the
    /// write is refused.
    pub fn set(&self, root: &mut Value, value: Value) -> Result<(), PathError> {
        self.check_padding(root)?;
        let mut node = root;
        for segment in &self.segments {
            node = slot_mut(node, segment);
        }
        *node = value;
        Ok(())
    }

    // Walks the existing part of the record the way `slot_mut` would and
    // rejects any array step that needs too much padding.
    fn check_padding(&self, root: &Value) -> Result<(), PathError> {
        let mut node = Some(root);
        for segment in &self.segments {
            let index = match (segment, node) {
                (Segment::Index(_), Some(Value::Object(_))) => None,
                (Segment::Index(index), _) => Some(*index),
                (Segment::Key(key), Some(Value::Array(_))) => key.parse::<usize>().ok(),
                (Segment::Key(_), _) => None,
            };
            if let Some(index) = index {
                let len = node.and_then(Value::as_array).map_or(0, Vec::len);
                if index.saturating_sub(len) > MAX_ARRAY_PADDING {
                    return Err(PathError::IndexOutOfRange {
                        path: self.raw.clone(),
                        index,
                        len,
                    });
                }
            }
            node = node.and_then(|node| step(node, segment));
        }
        Ok(())
    }
}

fn step<'a>(node: &'a Value, segment: &Segment) -> Option<&'a Value> {
    match (segment, node) {
        (Segment::Key(key), Value::Object(map)) => map.get(key),
        (Segment::Key(key), Value::Array(items)) => {
            key.parse::<usize>().ok().and_then(|index| items.get(index))
        }
        (Segment::Index(index), Value::Array(items)) => items.get(*index),
        (Segment::Index(index), Value::Object(map)) => map.get(&index.to_string()),
        _ => None,
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for Path {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<String> for Path {
    fn from(raw: String) -> Self {
        Self::parse(raw)
    }
}

/// Reads `path` from `root`. Shorthand for `Path::parse(path).get(root)`.
pub fn get<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    Path::parse(path).get(root)
}

/// Writes `value` at `path` in `root`. Shorthand for `Path::parse(path).set(..)`.
pub fn set(root: &mut Value, path: &str, value: Value) -> Result<(), PathError> {
    Path::parse(path).set(root, value)
}

// ============================================================================
// PARSING
// ============================================================================

fn parse_segments(raw: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut key = String::new();
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        match c {
            '.' => flush_key(&mut key, &mut segments),
            '[' => {
                flush_key(&mut key, &mut segments);
                let inner: String = chars.by_ref().take_while(|c| *c != ']').collect();
                segments.push(bracket_segment(&inner));
            }
            _ => key.push(c),
        }
    }
    flush_key(&mut key, &mut segments);
    segments
}

fn flush_key(key: &mut String, segments: &mut Vec<Segment>) {
    if !key.is_empty() {
        segments.push(Segment::Key(std::mem::take(key)));
    }
}

fn bracket_segment(inner: &str) -> Segment {
    let inner = inner.trim();
    if let Ok(index) = inner.parse::<usize>() {
        return Segment::Index(index);
    }
    let unquoted = strip_quotes(inner, '"')
        .or_else(|| strip_quotes(inner, '\''))
        .unwrap_or(inner);
    Segment::Key(unquoted.to_string())
}

fn strip_quotes(s: &str, quote: char) -> Option<&str> {
    s.strip_prefix(quote).and_then(|s| s.strip_suffix(quote))
}

// ============================================================================
// WRITING
// ============================================================================

fn slot_mut<'a>(node: &'a mut Value, segment: &Segment) -> &'a mut Value {
    match segment {
        Segment::Key(key) => {
            if let (true, Ok(index)) = (node.is_array(), key.parse::<usize>()) {
                return array_slot(node, index);
            }
            ensure_object(node)
                .entry(key.clone())
                .or_insert(Value::Null)
        }
        Segment::Index(index) => {
            if node.is_object() {
                return ensure_object(node)
                    .entry(index.to_string())
                    .or_insert(Value::Null);
            }
            array_slot(node, *index)
        }
    }
}

fn ensure_object(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was just made an object"),
    }
}

fn array_slot(node: &mut Value, index: usize) -> &mut Value {
    if !node.is_array() {
        *node = Value::Array(Vec::new());
    }
    let Value::Array(items) = node else {
        unreachable!("node was just made an array")
    };
    // `check_padding` bounds `index` to a few placeholders past the end.
    if items.len() <= index {
        items.resize(index.saturating_add(1), Value::Null);
    }
    &mut items[index]
}
