//! Schema graph node types.
//!
//! These are immutable, tagged values representing classified schema shapes.
//! Built once by the loader and shared read-only by the validator and the
//! type emitter. References are kept as identifiers and resolved by lookup,
//! never by inlining, so circular schemas stay finite.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde_json::Value;

/// Identifier of a schema document: its slash-normalized path relative to
/// the schema root, e.g. `rooms.schema.json` or
/// `gates/coherence_gate.schema.json`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
pub struct SchemaId(String);

impl SchemaId {
    pub fn new(path: impl Into<String>) -> Self {
        SchemaId(path.into().replace('\\', "/"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name component of the identifier.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Resolve a relative document reference against this identifier.
    /// `..` segments above the schema root are dropped, which produces an
    /// identifier that simply fails the later existence check.
    pub fn resolve(&self, reference: &str) -> SchemaId {
        let mut segments: Vec<&str> = self.0.split('/').collect();
        segments.pop(); // drop our own file name
        for part in reference.split('/') {
            match part {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                other => segments.push(other),
            }
        }
        SchemaId(segments.join("/"))
    }
}

impl fmt::Display for SchemaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Target of a `$ref`: a document plus an optional named definition
/// (`#/definitions/Name` or `#/$defs/Name`) inside it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct RefTarget {
    pub document: SchemaId,
    pub definition: Option<String>,
}

impl RefTarget {
    /// Parse a `$ref` string relative to the referring document.
    ///
    /// Supported spellings:
    /// - `#/definitions/Name`, `#/$defs/Name` -- same-document definition
    /// - `other.schema.json` -- another document's root
    /// - `other.schema.json#/definitions/Name` -- definition elsewhere
    /// - `../shared/base.schema.json` -- relative path traversal
    ///
    /// Returns `None` for fragment shapes the pipeline does not model
    /// (e.g. `#/properties/x`); the loader classifies those as unknown.
    pub fn parse(raw: &str, base: &SchemaId) -> Option<RefTarget> {
        let (doc_part, fragment) = match raw.split_once('#') {
            Some((d, f)) => (d, Some(f)),
            None => (raw, None),
        };
        let document = if doc_part.is_empty() {
            base.clone()
        } else {
            base.resolve(doc_part)
        };
        let definition = match fragment {
            None | Some("") => None,
            Some(f) => {
                let name = f
                    .strip_prefix("/definitions/")
                    .or_else(|| f.strip_prefix("/$defs/"))?;
                if name.is_empty() || name.contains('/') {
                    return None;
                }
                Some(pointer_unescape(name))
            }
        };
        Some(RefTarget {
            document,
            definition,
        })
    }
}

impl fmt::Display for RefTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.definition {
            Some(name) => write!(f, "{}#/definitions/{}", self.document, name),
            None => write!(f, "{}", self.document),
        }
    }
}

/// Undo JSON-pointer escaping: `~1` is `/`, `~0` is `~`.
pub fn pointer_unescape(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

/// Apply JSON-pointer escaping to one path segment.
pub fn pointer_escape(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// One classified schema node.
///
/// The emitter's mapping rules are an exhaustive match over these variants,
/// so any schema construct the pipeline cannot represent must land in
/// `Unknown` rather than being silently approximated.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    /// `{"type": "object", "properties": ...}` -- structured record.
    /// Properties keep the declaration order of the schema file.
    Object {
        properties: Vec<(String, SchemaNode)>,
        required: Vec<String>,
        /// Whether members beyond `properties` are accepted
        /// (`additionalProperties` defaulting to true).
        additional: bool,
    },
    /// `{"type": "array", "items": ...}` -- ordered sequence.
    Array { items: Box<SchemaNode> },
    /// `{"type": "string"}`
    String,
    /// `{"type": "number"}` or `{"type": "integer"}`
    Number { integer: bool },
    /// `{"type": "boolean"}`
    Boolean,
    /// `{"enum": [...]}` -- closed set of literal values.
    Enum { values: Vec<Value> },
    /// `{"$ref": "..."}` -- resolved by graph lookup at use time.
    Reference { target: RefTarget },
    /// `{}` or annotation-only schema: accepts any value.
    Any,
    /// A construct the pipeline does not model (combinators, type unions,
    /// `null` type, ...). The validator treats it as permissive; the
    /// emitter refuses it.
    Unknown { construct: String },
}

impl SchemaNode {
    /// Collect every outgoing reference reachable from this node.
    pub fn collect_refs(&self, out: &mut BTreeSet<RefTarget>) {
        match self {
            SchemaNode::Reference { target } => {
                out.insert(target.clone());
            }
            SchemaNode::Object { properties, .. } => {
                for (_, node) in properties {
                    node.collect_refs(out);
                }
            }
            SchemaNode::Array { items } => items.collect_refs(out),
            SchemaNode::String
            | SchemaNode::Number { .. }
            | SchemaNode::Boolean
            | SchemaNode::Enum { .. }
            | SchemaNode::Any
            | SchemaNode::Unknown { .. } => {}
        }
    }
}

/// One loaded schema file: root node plus named definitions.
/// Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDocument {
    pub id: SchemaId,
    pub root: SchemaNode,
    pub definitions: BTreeMap<String, SchemaNode>,
    /// Every `$ref` target appearing anywhere in the document.
    pub refs: BTreeSet<RefTarget>,
    /// Non-fatal observations made while loading (e.g. a non-draft-07
    /// `$schema` declaration). Surfaced on validation results.
    pub warnings: Vec<String>,
}

/// The resolved schema graph: every identifier maps to a loaded document
/// and every reference in every document resolves (checked at load time).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaGraph {
    documents: BTreeMap<SchemaId, SchemaDocument>,
}

impl SchemaGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, document: SchemaDocument) {
        self.documents.insert(document.id.clone(), document);
    }

    pub fn get(&self, id: &SchemaId) -> Option<&SchemaDocument> {
        self.documents.get(id)
    }

    pub fn contains(&self, id: &SchemaId) -> bool {
        self.documents.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Documents in identifier order.
    pub fn documents(&self) -> impl Iterator<Item = &SchemaDocument> {
        self.documents.values()
    }

    /// Look up the node a reference points at, one hop only.
    /// Chains of references are followed by the caller so that pure
    /// ref-to-ref cycles can be detected.
    pub fn resolve(&self, target: &RefTarget) -> Option<&SchemaNode> {
        let doc = self.documents.get(&target.document)?;
        match &target.definition {
            None => Some(&doc.root),
            Some(name) => doc.definitions.get(name),
        }
    }
}
