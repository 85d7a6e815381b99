//! # Frame Model
//!
//! Typed, read-only views over a loaded graph frame.
//!
//! A frame arrives as an untyped `serde_json::Value` (YAML and JSON sources
//! both land here). Structural validation (`gf0`) runs on the untyped value;
//! everything above it works on the typed `Frame` built from it.
//!
//! ## Attribute Resolution
//!
//! A node's effective value for a key is resolved in exactly one place,
//! [`Node::resolve`]: the node's own top-level field wins, otherwise the first
//! `attrs[]` entry with that key wins.

use crate::formats::sha256_hex;
use crate::primitives::CONTAINS;
use crate::types::FrameError;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

// =============================================================================
// FRAME DOCUMENT (source bytes + untyped value)
// =============================================================================

/// A frame as loaded from its source: the raw bytes and the parsed value.
#[derive(Debug, Clone)]
pub struct FrameDocument {
    /// Source identifier used in every violation (`Violation::path`).
    pub path: String,
    /// Raw source bytes, hashed verbatim.
    pub bytes: Vec<u8>,
    /// Parsed untyped value.
    pub value: Value,
}

impl FrameDocument {
    /// Parse a frame from raw bytes. YAML is accepted, and so is JSON since
    /// it is a YAML subset.
    pub fn from_bytes(path: impl Into<String>, bytes: Vec<u8>) -> Result<Self, FrameError> {
        let path = path.into();
        let value: Value =
            serde_yaml::from_slice(&bytes).map_err(|e| FrameError::ParseError {
                path: path.clone(),
                message: e.to_string(),
            })?;
        tracing::debug!(path = %path, bytes = bytes.len(), "frame loaded");
        Ok(Self { path, bytes, value })
    }

    /// Read and parse a frame file.
    pub fn load(path: &Path) -> Result<Self, FrameError> {
        let bytes = std::fs::read(path)
            .map_err(|e| FrameError::IoError(format!("{}: {}", path.display(), e)))?;
        Self::from_bytes(path.display().to_string(), bytes)
    }

    /// Hex SHA-256 of the source bytes.
    #[must_use]
    pub fn sha256(&self) -> String {
        sha256_hex(&self.bytes)
    }

    /// Build the typed view. Fails only if the top level is not a mapping.
    pub fn frame(&self) -> Result<Frame, FrameError> {
        Frame::from_value(&self.value).map_err(|_| FrameError::NotAMapping(self.path.clone()))
    }
}

// =============================================================================
// ATTR
// =============================================================================

/// One `{key, value, vtype?}` entry of an `attrs[]` list.
#[derive(Debug, Clone, PartialEq)]
pub struct Attr {
    pub key: String,
    pub value: Value,
    pub vtype: Option<String>,
}

impl Attr {
    /// Entries without a string `key` are not attributes and are skipped.
    fn from_value(raw: &Value) -> Option<Self> {
        let obj = raw.as_object()?;
        let key = obj.get("key")?.as_str()?.to_string();
        Some(Self {
            key,
            value: obj.get("value").cloned().unwrap_or(Value::Null),
            vtype: obj.get("vtype").and_then(Value::as_str).map(str::to_string),
        })
    }

    /// The value as a string slice, if it is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.value.as_str()
    }
}

fn attrs_of(value: Option<&Value>) -> Vec<Attr> {
    value
        .and_then(Value::as_array)
        .map(|list| list.iter().filter_map(Attr::from_value).collect())
        .unwrap_or_default()
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

// =============================================================================
// NODE
// =============================================================================

/// A node of a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Unique id within the frame.
    pub id: String,
    fields: Map<String, Value>,
    attrs: Vec<Attr>,
}

impl Node {
    fn from_value(raw: &Value) -> Option<Self> {
        let fields = raw.as_object()?.clone();
        let id = non_empty_str(fields.get("id"))?;
        let attrs = attrs_of(fields.get("attrs"));
        Some(Self { id, fields, attrs })
    }

    /// Effective value for `key`: own field first, then first matching attr.
    #[must_use]
    pub fn resolve(&self, key: &str) -> Option<&Value> {
        self.fields
            .get(key)
            .or_else(|| self.attrs.iter().find(|a| a.key == key).map(|a| &a.value))
    }

    /// [`resolve`](Self::resolve) narrowed to strings.
    #[must_use]
    pub fn resolve_str(&self, key: &str) -> Option<&str> {
        self.resolve(key).and_then(Value::as_str)
    }

    /// [`resolve_str`](Self::resolve_str) narrowed to non-empty strings.
    #[must_use]
    pub fn resolve_text(&self, key: &str) -> Option<&str> {
        self.resolve_str(key).filter(|s| !s.is_empty())
    }

    /// First `attrs[]` entry with `key`, ignoring top-level fields.
    #[must_use]
    pub fn attr(&self, key: &str) -> Option<&Attr> {
        self.attrs.iter().find(|a| a.key == key)
    }

    /// All attribute entries, in input order.
    #[must_use]
    pub fn attrs(&self) -> &[Attr] {
        &self.attrs
    }

    /// Resolved `kind`, or `""` when absent.
    #[must_use]
    pub fn kind(&self) -> &str {
        self.resolve_str("kind").unwrap_or("")
    }

    /// Resolved `status`, or `""` when absent.
    #[must_use]
    pub fn status(&self) -> &str {
        self.resolve_str("status").unwrap_or("")
    }

    /// Explicit sibling order; non-integers count as absent.
    #[must_use]
    pub fn order(&self) -> Option<i64> {
        self.resolve("order").and_then(Value::as_i64)
    }

    /// `symbols[]` carried verbatim (property nodes).
    #[must_use]
    pub fn symbols(&self) -> Vec<Value> {
        self.resolve("symbols")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default()
    }

    /// First non-empty string among `keys`, falling back to the node id.
    #[must_use]
    pub fn display_name(&self, keys: &[&str]) -> &str {
        keys.iter()
            .find_map(|k| self.resolve_text(k))
            .unwrap_or(&self.id)
    }
}

// =============================================================================
// EDGE
// =============================================================================

/// A directed, typed edge between two node ids.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub id: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub edge_type: Option<String>,
    pub attrs: Vec<Attr>,
    pub metrics: Vec<Value>,
}

impl Edge {
    fn from_value(raw: &Value) -> Option<Self> {
        let obj = raw.as_object()?;
        Some(Self {
            id: non_empty_str(obj.get("id")),
            from: non_empty_str(obj.get("from")),
            to: non_empty_str(obj.get("to")),
            edge_type: obj.get("type").and_then(Value::as_str).map(str::to_string),
            attrs: attrs_of(obj.get("attrs")),
            metrics: obj
                .get("metrics")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default(),
        })
    }

    /// True if the edge has the given type.
    #[must_use]
    pub fn is(&self, edge_type: &str) -> bool {
        self.edge_type.as_deref() == Some(edge_type)
    }
}

// =============================================================================
// FRAME
// =============================================================================

/// Typed view over a frame mapping.
///
/// Entries that are not mappings, nodes without a non-empty string id, and
/// attrs without a string key are left out of the view; reporting them is the
/// structural validator's job.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub graph_id: String,
    pub version: String,
    pub attrs: Vec<Attr>,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    /// Nested frames, kept untyped; `gf0` validates them recursively.
    pub meta: Vec<Value>,
    index: BTreeMap<String, usize>,
}

impl Frame {
    /// Build the typed view over an untyped frame value.
    pub fn from_value(value: &Value) -> Result<Self, FrameError> {
        let obj = value
            .as_object()
            .ok_or_else(|| FrameError::NotAMapping("<value>".to_string()))?;

        let list = |key: &str| obj.get(key).and_then(Value::as_array);

        let nodes: Vec<Node> = list("nodes")
            .map(|l| l.iter().filter_map(Node::from_value).collect())
            .unwrap_or_default();

        // First occurrence of an id wins.
        let mut index = BTreeMap::new();
        for (i, node) in nodes.iter().enumerate() {
            index.entry(node.id.clone()).or_insert(i);
        }

        Ok(Self {
            graph_id: obj.get("graph_id").and_then(Value::as_str).unwrap_or("").to_string(),
            version: obj.get("version").and_then(Value::as_str).unwrap_or("").to_string(),
            attrs: attrs_of(obj.get("attrs")),
            nodes,
            edges: list("edges")
                .map(|l| l.iter().filter_map(Edge::from_value).collect())
                .unwrap_or_default(),
            meta: list("meta").cloned().unwrap_or_default(),
            index,
        })
    }

    /// Node by id.
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index.get(id).and_then(|&i| self.nodes.get(i))
    }

    /// The root node: the node whose id equals `graph_id`.
    #[must_use]
    pub fn root(&self) -> Option<&Node> {
        if self.graph_id.is_empty() {
            return None;
        }
        self.node(&self.graph_id)
    }

    /// Edges of one type, in input order.
    pub fn edges_of_type<'a>(&'a self, edge_type: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.is(edge_type))
    }

    /// True if any `contains` edge exists.
    #[must_use]
    pub fn has_contains_edges(&self) -> bool {
        self.edges_of_type(CONTAINS).next().is_some()
    }

    /// `contains` children per parent: deduplicated, lexicographic.
    ///
    /// Independent of edge input order.
    #[must_use]
    pub fn contains_children(&self) -> BTreeMap<String, Vec<String>> {
        let mut children: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for edge in self.edges_of_type(CONTAINS) {
            if let (Some(from), Some(to)) = (&edge.from, &edge.to) {
                children.entry(from.clone()).or_default().insert(to.clone());
            }
        }
        children
            .into_iter()
            .map(|(parent, kids)| (parent, kids.into_iter().collect()))
            .collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================
