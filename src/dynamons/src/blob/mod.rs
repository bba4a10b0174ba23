//! Blob save container.
//!
//! The alternate save variant is a whole file of standard base64 wrapping a
//! UTF-8 JSON object. Decoding produces a [`BlobNode`] tree that keeps key
//! order; encoding writes the tree back as 4-space indented JSON before
//! base64-encoding it again.
//!
//! ## Example
//!
//! ```
//! use dynamons::blob::{BlobNode, BlobValue};
//!
//! # fn main() -> Result<(), dynamons::BlobError> {
//! let mut node = BlobNode::new();
//! node.insert("coins", BlobValue::Integer(10));
//!
//! let bytes = node.encode()?;
//! let mut decoded = BlobNode::decode(&bytes)?;
//! decoded.set_text(&["coins"], "9999")?;
//!
//! assert_eq!(decoded.get("coins"), Some(&BlobValue::Integer(9999)));
//! # Ok(())
//! # }
//! ```

mod coerce;
mod flatten;

pub use coerce::coerce_leaf;
pub use flatten::{FlatRow, RowKind};

use base64::prelude::*;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::session::{AtomicFileWriter, SaveWriter};

const INDENT: &[u8] = b"    ";

#[derive(Error, Debug)]
pub enum BlobError {
    #[error("Invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Blob is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Top-level blob value is not an object")]
    NotAnObject,

    #[error("Path not found: {0}")]
    PathNotFound(String),

    #[error("Path does not name a leaf: {0}")]
    NotALeaf(String),

    #[error("Path does not name an object: {0}")]
    NotABranch(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A value in a blob tree.
#[derive(Debug, Clone, PartialEq)]
pub enum BlobValue {
    Node(BlobNode),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    /// `null`, arrays and integers outside `i64`, carried through untouched.
    Raw(Value),
}

impl BlobValue {
    pub fn is_leaf(&self) -> bool {
        !matches!(self, BlobValue::Node(_))
    }

    pub fn as_node(&self) -> Option<&BlobNode> {
        match self {
            BlobValue::Node(node) => Some(node),
            _ => None,
        }
    }

    /// Kind label shown next to leaf values.
    pub fn kind(&self) -> &'static str {
        match self {
            BlobValue::Node(_) => "object",
            BlobValue::Integer(_) => "integer",
            BlobValue::Float(_) => "float",
            BlobValue::Bool(_) => "boolean",
            BlobValue::Text(_) => "string",
            BlobValue::Raw(_) => "raw",
        }
    }

    fn from_json(value: Value) -> Self {
        match value {
            Value::Object(map) => BlobValue::Node(BlobNode::from_map(map)),
            Value::Bool(b) => BlobValue::Bool(b),
            Value::String(s) => BlobValue::Text(s),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    BlobValue::Integer(i)
                } else if let (true, Some(f)) = (n.is_f64(), n.as_f64()) {
                    BlobValue::Float(f)
                } else {
                    BlobValue::Raw(Value::Number(n))
                }
            }
            other => BlobValue::Raw(other),
        }
    }

    fn to_json(&self) -> Value {
        match self {
            BlobValue::Node(node) => Value::Object(node.to_map()),
            BlobValue::Integer(i) => Value::Number((*i).into()),
            BlobValue::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
            BlobValue::Bool(b) => Value::Bool(*b),
            BlobValue::Text(s) => Value::String(s.clone()),
            BlobValue::Raw(v) => v.clone(),
        }
    }
}

/// Display text of a value; [`coerce_leaf`] maps it back to the same leaf.
impl fmt::Display for BlobValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlobValue::Node(_) => Ok(()),
            BlobValue::Integer(i) => write!(f, "{}", i),
            // Number keeps the fractional part ("1.0"), plain f64 Display does not.
            BlobValue::Float(x) => match Number::from_f64(*x) {
                Some(n) => write!(f, "{}", n),
                None => write!(f, "{}", x),
            },
            BlobValue::Bool(b) => write!(f, "{}", b),
            BlobValue::Text(s) => f.write_str(s),
            BlobValue::Raw(v) => write!(f, "{}", v),
        }
    }
}

/// An ordered key/value mapping; the root of a blob save.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BlobNode {
    entries: IndexMap<String, BlobValue>,
}

impl BlobNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode base64-wrapped JSON. ASCII whitespace in the input is ignored.
    pub fn decode(bytes: &[u8]) -> Result<Self, BlobError> {
        let compact: Vec<u8> = bytes
            .iter()
            .copied()
            .filter(|b| !b.is_ascii_whitespace())
            .collect();
        let json = String::from_utf8(BASE64_STANDARD.decode(compact)?)?;

        match serde_json::from_str::<Value>(&json)? {
            Value::Object(map) => Ok(Self::from_map(map)),
            _ => Err(BlobError::NotAnObject),
        }
    }

    /// Encode as indented JSON wrapped in base64.
    pub fn encode(&self) -> Result<Vec<u8>, BlobError> {
        let json = self.to_json_pretty()?;
        Ok(BASE64_STANDARD.encode(json).into_bytes())
    }

    /// The JSON text that [`BlobNode::encode`] wraps.
    pub fn to_json_pretty(&self) -> Result<String, BlobError> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(INDENT);
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        Value::Object(self.to_map()).serialize(&mut serializer)?;
        Ok(String::from_utf8(buf)?)
    }

    /// Parse a plain JSON object (no base64 envelope).
    pub fn from_json_str(json: &str) -> Result<Self, BlobError> {
        match serde_json::from_str::<Value>(json)? {
            Value::Object(map) => Ok(Self::from_map(map)),
            _ => Err(BlobError::NotAnObject),
        }
    }

    pub fn read_file(path: &Path) -> Result<Self, BlobError> {
        Self::decode(&fs::read(path)?)
    }

    /// Encode and write through [`AtomicFileWriter`], so a failed write
    /// never leaves a truncated blob behind.
    pub fn write_file(&self, path: &Path) -> Result<(), BlobError> {
        AtomicFileWriter.write(path, &self.encode()?)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&BlobValue> {
        self.entries.get(key)
    }

    /// Follow `path` through nested nodes.
    pub fn get_path<S: AsRef<str>>(&self, path: &[S]) -> Option<&BlobValue> {
        let (last, parents) = path.split_last()?;
        let mut node = self;
        for key in parents {
            node = node.get(key.as_ref())?.as_node()?;
        }
        node.get(last.as_ref())
    }

    /// Insert or replace `key`, keeping its position when it already exists.
    pub fn insert(&mut self, key: impl Into<String>, value: BlobValue) -> Option<BlobValue> {
        self.entries.insert(key.into(), value)
    }

    /// Replace the leaf at `path` with the coerced form of `text`.
    pub fn set_text<S: AsRef<str>>(&mut self, path: &[S], text: &str) -> Result<(), BlobError> {
        let display = join_path(path);
        let (last, parents) = path
            .split_last()
            .ok_or_else(|| BlobError::PathNotFound(display.clone()))?;

        let mut node = self;
        for key in parents {
            node = match node.entries.get_mut(key.as_ref()) {
                Some(BlobValue::Node(child)) => child,
                Some(_) => return Err(BlobError::NotABranch(display)),
                None => return Err(BlobError::PathNotFound(display)),
            };
        }

        match node.entries.get_mut(last.as_ref()) {
            Some(BlobValue::Node(_)) => Err(BlobError::NotALeaf(display)),
            Some(leaf) => {
                *leaf = coerce_leaf(text);
                Ok(())
            }
            None => Err(BlobError::PathNotFound(display)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, BlobValue> {
        self.entries.iter()
    }

    fn from_map(map: Map<String, Value>) -> Self {
        let entries = map
            .into_iter()
            .map(|(k, v)| (k, BlobValue::from_json(v)))
            .collect();
        BlobNode { entries }
    }

    fn to_map(&self) -> Map<String, Value> {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect()
    }
}

pub(crate) fn join_path<S: AsRef<str>>(path: &[S]) -> String {
    path.iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAVE_JSON: &str = r#"{
        "player": {"name": "Kenzie", "coins": 9185, "speed": 1.5, "tutorial": true},
        "version": "2.1",
        "ratio": 2.0,
        "slots": [1, 2, {"x": null}],
        "empty": {},
        "huge": 18446744073709551615
    }"#;

    fn blob() -> Vec<u8> {
        BASE64_STANDARD.encode(SAVE_JSON).into_bytes()
    }

    #[test]
    fn test_decode_types() {
        let node = BlobNode::decode(&blob()).unwrap();
        let player = node.get("player").unwrap().as_node().unwrap();

        assert_eq!(player.get("name"), Some(&BlobValue::Text("Kenzie".into())));
        assert_eq!(player.get("coins"), Some(&BlobValue::Integer(9185)));
        assert_eq!(player.get("speed"), Some(&BlobValue::Float(1.5)));
        assert_eq!(player.get("tutorial"), Some(&BlobValue::Bool(true)));
        assert_eq!(node.get("version"), Some(&BlobValue::Text("2.1".into())));
        assert_eq!(node.get("ratio"), Some(&BlobValue::Float(2.0)));
        assert!(matches!(node.get("slots"), Some(BlobValue::Raw(Value::Array(_)))));
        assert!(matches!(node.get("huge"), Some(BlobValue::Raw(Value::Number(_)))));
    }

    #[test]
    fn test_decode_preserves_key_order() {
        let node = BlobNode::decode(&blob()).unwrap();
        let keys: Vec<&str> = node.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["player", "version", "ratio", "slots", "empty", "huge"]);
    }

    #[test]
    fn test_reencode_is_stable() {
        let decoded = BlobNode::decode(&blob()).unwrap();
        let again = BlobNode::decode(&decoded.encode().unwrap()).unwrap();
        assert_eq!(again, decoded);
    }

    #[test]
    fn test_encode_indentation() {
        let mut node = BlobNode::new();
        node.insert("a", BlobValue::Integer(1));
        node.insert("b", BlobValue::Float(1.0));

        assert_eq!(
            node.to_json_pretty().unwrap(),
            "{\n    \"a\": 1,\n    \"b\": 1.0\n}"
        );
    }

    #[test]
    fn test_decode_ignores_line_breaks() {
        let mut wrapped = blob();
        wrapped.insert(8, b'\n');
        wrapped.extend_from_slice(b"\r\n");
        assert!(BlobNode::decode(&wrapped).is_ok());
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(BlobNode::decode(b"%%%"), Err(BlobError::Base64(_))));

        let not_utf8 = BASE64_STANDARD.encode([0xffu8, 0xfe]);
        assert!(matches!(
            BlobNode::decode(not_utf8.as_bytes()),
            Err(BlobError::Utf8(_))
        ));

        let not_json = BASE64_STANDARD.encode("{nope");
        assert!(matches!(
            BlobNode::decode(not_json.as_bytes()),
            Err(BlobError::Json(_))
        ));

        let array = BASE64_STANDARD.encode("[1, 2]");
        assert!(matches!(
            BlobNode::decode(array.as_bytes()),
            Err(BlobError::NotAnObject)
        ));
    }

    #[test]
    fn test_get_path() {
        let node = BlobNode::decode(&blob()).unwrap();
        assert_eq!(
            node.get_path(&["player", "coins"]),
            Some(&BlobValue::Integer(9185))
        );
        assert_eq!(node.get_path(&["player", "missing"]), None);
        assert_eq!(node.get_path(&["version", "deeper"]), None);
        assert_eq!(node.get_path::<&str>(&[]), None);
    }

    #[test]
    fn test_set_text_coerces() {
        let mut node = BlobNode::decode(&blob()).unwrap();
        node.set_text(&["player", "coins"], "999999").unwrap();
        node.set_text(&["player", "speed"], ".25").unwrap();
        node.set_text(&["player", "tutorial"], "FALSE").unwrap();
        node.set_text(&["version"], "-3").unwrap();

        assert_eq!(node.get_path(&["player", "coins"]), Some(&BlobValue::Integer(999999)));
        assert_eq!(node.get_path(&["player", "speed"]), Some(&BlobValue::Float(0.25)));
        assert_eq!(node.get_path(&["player", "tutorial"]), Some(&BlobValue::Bool(false)));
        assert_eq!(node.get("version"), Some(&BlobValue::Text("-3".into())));
    }

    #[test]
    fn test_set_text_errors() {
        let mut node = BlobNode::decode(&blob()).unwrap();
        assert!(matches!(
            node.set_text(&["player"], "1"),
            Err(BlobError::NotALeaf(p)) if p == "player"
        ));
        assert!(matches!(
            node.set_text(&["player", "nope"], "1"),
            Err(BlobError::PathNotFound(p)) if p == "player.nope"
        ));
        assert!(matches!(
            node.set_text(&["version", "x"], "1"),
            Err(BlobError::NotABranch(_))
        ));
    }

    #[test]
    fn test_float_display_keeps_fraction() {
        assert_eq!(BlobValue::Float(2.0).to_string(), "2.0");
        assert_eq!(coerce_leaf(&BlobValue::Float(2.0).to_string()), BlobValue::Float(2.0));
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("save.dat");

        let node = BlobNode::decode(&blob()).unwrap();
        node.write_file(&path).unwrap();
        assert_eq!(BlobNode::read_file(&path).unwrap(), node);

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec!["save.dat"]);
    }

    #[test]
    fn test_write_file_to_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("save.dat");
        assert!(matches!(
            BlobNode::new().write_file(&path),
            Err(BlobError::Io(_))
        ));
    }
}
