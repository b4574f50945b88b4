//! Schema loader: discovers schema files under a root directory, classifies
//! each into the tagged node representation, and builds a fully resolved
//! [`SchemaGraph`].
//!
//! Resolution works on a graph of identifiers: references are recorded and
//! checked for existence after every document is loaded, never inlined, so
//! circular schemas load in bounded time. Any parse failure or dangling
//! reference aborts the whole load; no partial graph is exposed downstream.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde_json::Value;
use walkdir::WalkDir;

use crate::node::{RefTarget, SchemaDocument, SchemaGraph, SchemaId, SchemaNode};

/// Fatal load-time failures. Each aborts the run before any contract is
/// validated or any type is emitted.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("schema {id} is not valid JSON: {reason}")]
    SchemaParse { id: String, reason: String },
    #[error("schema {id} references `{reference}` which does not resolve")]
    UnresolvedReference { id: String, reference: String },
}

/// Keywords that never influence classification on their own.
const ANNOTATION_KEYS: &[&str] = &[
    "$schema",
    "$id",
    "$comment",
    "title",
    "description",
    "default",
    "examples",
    "format",
    "definitions",
    "$defs",
];

/// Constructs the pipeline deliberately does not model. Their presence
/// makes a node `Unknown` so the emitter fails loudly instead of emitting
/// an approximate type.
const UNSUPPORTED_KEYS: &[&str] = &[
    "oneOf",
    "anyOf",
    "allOf",
    "not",
    "if",
    "then",
    "else",
    "const",
    "patternProperties",
    "propertyNames",
    "dependencies",
    "dependentSchemas",
];

/// Load every `.json` file under `schema_dir` into a resolved graph.
///
/// Fails fast: the first malformed file or dangling reference aborts the
/// whole load.
pub fn load_graph(schema_dir: &Path) -> Result<SchemaGraph, LoadError> {
    let mut graph = SchemaGraph::new();

    for entry in WalkDir::new(schema_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| LoadError::Io {
            path: schema_dir.display().to_string(),
            source: e.into(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }

        let id = schema_id_for(path, schema_dir);
        let content = std::fs::read_to_string(path).map_err(|e| LoadError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let value: Value =
            serde_json::from_str(&content).map_err(|e| LoadError::SchemaParse {
                id: id.to_string(),
                reason: e.to_string(),
            })?;

        graph.insert(load_document(id, &value));
    }

    check_references(&graph)?;
    tracing::debug!(schemas = graph.len(), "schema graph loaded");
    Ok(graph)
}

/// Derive the graph identifier for a schema file path.
fn schema_id_for(path: &Path, schema_dir: &Path) -> SchemaId {
    let relative = path.strip_prefix(schema_dir).unwrap_or(path);
    SchemaId::new(relative.to_string_lossy().into_owned())
}

/// Classify one parsed schema file into an immutable document.
pub fn load_document(id: SchemaId, value: &Value) -> SchemaDocument {
    let mut warnings = Vec::new();
    let mut definitions = BTreeMap::new();

    if let Some(obj) = value.as_object() {
        if let Some(declared) = obj.get("$schema").and_then(|v| v.as_str()) {
            if !declared.contains("draft-07") {
                warnings.push(format!("non-draft-07 $schema: {declared}"));
            }
        }
        for defs_key in ["definitions", "$defs"] {
            if let Some(defs) = obj.get(defs_key).and_then(|v| v.as_object()) {
                for (name, schema) in defs {
                    definitions.insert(name.clone(), classify(schema, &id));
                }
            }
        }
    }

    let root = classify(value, &id);

    let mut refs = BTreeSet::new();
    root.collect_refs(&mut refs);
    for node in definitions.values() {
        node.collect_refs(&mut refs);
    }

    SchemaDocument {
        id,
        root,
        definitions,
        refs,
        warnings,
    }
}

/// Classify one schema value into a tagged node. References are recorded,
/// not followed, so recursion here is bounded by the document's own depth.
pub fn classify(value: &Value, base: &SchemaId) -> SchemaNode {
    let obj = match value {
        // Boolean schemas per draft-07: `true` accepts anything.
        Value::Bool(true) => return SchemaNode::Any,
        Value::Bool(false) => {
            return SchemaNode::Unknown {
                construct: "boolean schema `false`".into(),
            }
        }
        Value::Object(obj) => obj,
        other => {
            return SchemaNode::Unknown {
                construct: format!("non-object schema ({})", json_kind(other)),
            }
        }
    };

    if let Some(raw) = obj.get("$ref") {
        return match raw.as_str().and_then(|s| RefTarget::parse(s, base)) {
            Some(target) => SchemaNode::Reference { target },
            None => SchemaNode::Unknown {
                construct: format!("unsupported $ref {raw}"),
            },
        };
    }

    for key in UNSUPPORTED_KEYS {
        if obj.contains_key(*key) {
            return SchemaNode::Unknown {
                construct: format!("`{key}` keyword"),
            };
        }
    }

    if let Some(values) = obj.get("enum") {
        return match values.as_array() {
            Some(items) if !items.is_empty() => SchemaNode::Enum {
                values: items.clone(),
            },
            _ => SchemaNode::Unknown {
                construct: "`enum` must be a non-empty array".into(),
            },
        };
    }

    match obj.get("type") {
        Some(Value::String(t)) => match t.as_str() {
            "object" => classify_object(obj, base),
            "array" => classify_array(obj, base),
            "string" => SchemaNode::String,
            "number" => SchemaNode::Number { integer: false },
            "integer" => SchemaNode::Number { integer: true },
            "boolean" => SchemaNode::Boolean,
            "null" => SchemaNode::Unknown {
                construct: "`null` type".into(),
            },
            other => SchemaNode::Unknown {
                construct: format!("unknown type keyword `{other}`"),
            },
        },
        Some(Value::Array(_)) => SchemaNode::Unknown {
            construct: "union `type` array".into(),
        },
        Some(_) => SchemaNode::Unknown {
            construct: "non-string `type`".into(),
        },
        None => {
            if obj.contains_key("properties")
                || obj.contains_key("required")
                || obj.contains_key("additionalProperties")
            {
                classify_object(obj, base)
            } else if obj.contains_key("items") {
                classify_array(obj, base)
            } else if obj.keys().all(|k| ANNOTATION_KEYS.contains(&k.as_str())) {
                SchemaNode::Any
            } else {
                let first = obj
                    .keys()
                    .find(|k| !ANNOTATION_KEYS.contains(&k.as_str()))
                    .cloned()
                    .unwrap_or_default();
                SchemaNode::Unknown {
                    construct: format!("unrecognized keyword `{first}`"),
                }
            }
        }
    }
}

fn classify_object(obj: &serde_json::Map<String, Value>, base: &SchemaId) -> SchemaNode {
    let mut properties = Vec::new();
    if let Some(props) = obj.get("properties").and_then(|v| v.as_object()) {
        for (key, schema) in props {
            properties.push((key.clone(), classify(schema, base)));
        }
    }

    let required = obj
        .get("required")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    // JSON Schema default: members beyond `properties` are accepted.
    // A non-boolean `additionalProperties` schema is treated as permissive.
    let additional = obj
        .get("additionalProperties")
        .and_then(|v| v.as_bool())
        .unwrap_or(true);

    SchemaNode::Object {
        properties,
        required,
        additional,
    }
}

fn classify_array(obj: &serde_json::Map<String, Value>, base: &SchemaId) -> SchemaNode {
    let items = match obj.get("items") {
        None => SchemaNode::Any,
        Some(Value::Array(_)) => SchemaNode::Unknown {
            construct: "tuple-form `items`".into(),
        },
        Some(schema) => classify(schema, base),
    };
    SchemaNode::Array {
        items: Box::new(items),
    }
}

/// Verify the graph invariant: every recorded reference resolves to a
/// loaded document (and, for definition refs, to an existing definition).
fn check_references(graph: &SchemaGraph) -> Result<(), LoadError> {
    for doc in graph.documents() {
        for target in &doc.refs {
            if graph.resolve(target).is_none() {
                return Err(LoadError::UnresolvedReference {
                    id: doc.id.to_string(),
                    reference: target.to_string(),
                });
            }
        }
    }
    Ok(())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
