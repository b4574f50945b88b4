//! Contract validator: pure evaluation of one contract against the
//! resolved schema graph.
//!
//! Errors are accumulated in depth-first document traversal order --
//! object members in insertion order, array elements by index -- so a
//! given contract always produces the same error sequence. Missing
//! required members are reported at the enclosing object's path, before
//! the per-member descent.

use serde_json::Value;

use crate::contract::{ContractBody, ContractDocument};
use crate::node::{pointer_escape, RefTarget, SchemaGraph, SchemaNode};
use crate::report::{ValidationError, ValidationResult};

/// Validate one contract. Pure: no IO, no mutation of the graph.
///
/// Structural problems (unparseable contract, missing schema binding,
/// degenerate `$ref` cycles) fail the contract closed rather than
/// aborting the batch.
pub fn validate_contract(
    graph: &SchemaGraph,
    contract: &ContractDocument,
) -> ValidationResult {
    let value = match &contract.body {
        ContractBody::Malformed(reason) => {
            return ValidationResult::fail(
                contract.id.clone(),
                vec![ValidationError::new("", "parse", reason.clone())],
                Vec::new(),
            );
        }
        ContractBody::Parsed(value) => value,
    };

    let schema_id = match &contract.schema {
        None => {
            return ValidationResult::fail(
                contract.id.clone(),
                vec![ValidationError::new(
                    "",
                    "binding",
                    "no schema binding resolved for this contract",
                )],
                Vec::new(),
            );
        }
        Some(id) => id,
    };

    let doc = match graph.get(schema_id) {
        None => {
            return ValidationResult::fail(
                contract.id.clone(),
                vec![ValidationError::new(
                    "",
                    "binding",
                    format!("schema {schema_id} is not in the loaded graph"),
                )],
                Vec::new(),
            );
        }
        Some(doc) => doc,
    };

    let mut errors = Vec::new();
    walk(graph, &doc.root, value, "", &mut errors);
    if errors.is_empty() {
        ValidationResult::pass(contract.id.clone(), doc.warnings.clone())
    } else {
        ValidationResult::fail(contract.id.clone(), errors, doc.warnings.clone())
    }
}

/// Recursive evaluation of one node against one value. Recursion depth is
/// bounded by the contract's own depth: references are resolved by lookup,
/// and each object/array step consumes one level of the instance.
fn walk(
    graph: &SchemaGraph,
    node: &SchemaNode,
    value: &Value,
    path: &str,
    errors: &mut Vec<ValidationError>,
) {
    match node {
        SchemaNode::Any | SchemaNode::Unknown { .. } => {}

        SchemaNode::Reference { target } => match deref(graph, target) {
            Ok(resolved) => walk(graph, resolved, value, path, errors),
            Err(message) => errors.push(ValidationError::new(path, "$ref", message)),
        },

        SchemaNode::String => {
            if !value.is_string() {
                errors.push(type_error(path, "string", value));
            }
        }

        SchemaNode::Boolean => {
            if !value.is_boolean() {
                errors.push(type_error(path, "boolean", value));
            }
        }

        SchemaNode::Number { integer } => {
            let ok = if *integer {
                value.is_i64()
                    || value.is_u64()
                    || value.as_f64().is_some_and(|n| n.fract() == 0.0)
            } else {
                value.is_number()
            };
            if !ok {
                let expected = if *integer { "integer" } else { "number" };
                errors.push(type_error(path, expected, value));
            }
        }

        SchemaNode::Enum { values } => {
            if !values.iter().any(|v| json_equal(v, value)) {
                errors.push(ValidationError::new(
                    path,
                    "enum",
                    format!("{value} is not one of the permitted values"),
                ));
            }
        }

        SchemaNode::Array { items } => match value.as_array() {
            None => errors.push(type_error(path, "array", value)),
            Some(elements) => {
                for (index, element) in elements.iter().enumerate() {
                    let child = format!("{path}/{index}");
                    walk(graph, items, element, &child, errors);
                }
            }
        },

        SchemaNode::Object {
            properties,
            required,
            additional,
        } => match value.as_object() {
            None => errors.push(type_error(path, "object", value)),
            Some(members) => {
                for name in required {
                    if !members.contains_key(name) {
                        errors.push(ValidationError::new(
                            path,
                            "required",
                            format!("missing required member \"{name}\""),
                        ));
                    }
                }
                // Members in the contract's own insertion order.
                for (key, member) in members {
                    let child = format!("{path}/{}", pointer_escape(key));
                    match properties.iter().find(|(name, _)| name == key) {
                        Some((_, schema)) => {
                            walk(graph, schema, member, &child, errors);
                        }
                        None if !additional => {
                            errors.push(ValidationError::new(
                                child,
                                "additionalProperties",
                                format!("unexpected member \"{key}\""),
                            ));
                        }
                        None => {}
                    }
                }
            }
        },
    }
}

/// Follow a `$ref` chain to a concrete node. A chain that revisits a
/// target without consuming instance depth is degenerate and reported as
/// an error instead of recursing forever.
fn deref<'a>(graph: &'a SchemaGraph, target: &RefTarget) -> Result<&'a SchemaNode, String> {
    let mut seen: Vec<RefTarget> = Vec::new();
    let mut current = target.clone();
    loop {
        if seen.contains(&current) {
            return Err(format!("circular $ref chain through {current}"));
        }
        seen.push(current.clone());
        match graph.resolve(&current) {
            // Unreachable after a successful load; kept for direct API use.
            None => return Err(format!("unresolved $ref {current}")),
            Some(SchemaNode::Reference { target }) => current = target.clone(),
            Some(node) => return Ok(node),
        }
    }
}

/// Draft-07 instance equality: numbers compare by mathematical value, so
/// `1` and `1.0` are the same enum member.
fn json_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            x == y || x.as_f64().zip(y.as_f64()).is_some_and(|(x, y)| x == y)
        }
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| json_equal(a, b))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter().all(|(k, a)| y.get(k).is_some_and(|b| json_equal(a, b)))
        }
        _ => a == b,
    }
}

fn type_error(path: &str, expected: &str, value: &Value) -> ValidationError {
    ValidationError::new(
        path,
        "type",
        format!("expected {expected}, found {}", json_kind(value)),
    )
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_document;
    use crate::node::SchemaId;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn graph_of(schemas: &[(&str, Value)]) -> SchemaGraph {
        let mut graph = SchemaGraph::new();
        for (id, schema) in schemas {
            graph.insert(load_document(SchemaId::new(*id), schema));
        }
        graph
    }

    fn contract(id: &str, schema: &str, body: Value) -> ContractDocument {
        ContractDocument {
            id: id.into(),
            schema: Some(SchemaId::new(schema)),
            body: ContractBody::Parsed(body),
        }
    }

    fn room_schema() -> Value {
        json!({
            "type": "object",
            "properties": {"name": {"type": "string"}},
            "required": ["name"]
        })
    }

    #[test]
    fn test_matching_contract_passes() {
        let graph = graph_of(&[("rooms.schema.json", room_schema())]);
        let doc = contract("rooms/a.json", "rooms.schema.json", json!({"name": "Room A"}));
        let result = validate_contract(&graph, &doc);
        assert!(result.ok, "{:?}", result.errors);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_missing_required_points_at_parent() {
        let graph = graph_of(&[("rooms.schema.json", room_schema())]);
        let doc = contract("rooms/a.json", "rooms.schema.json", json!({}));
        let result = validate_contract(&graph, &doc);
        assert!(!result.ok);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].path, "");
        assert_eq!(result.errors[0].rule, "required");
        assert!(result.errors[0].message.contains("name"));
    }

    #[test]
    fn test_nested_error_paths_and_order() {
        let graph = graph_of(&[(
            "rooms.schema.json",
            json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string"},
                    "steps": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {"title": {"type": "string"}},
                            "required": ["title"]
                        }
                    }
                }
            }),
        )]);
        let doc = contract(
            "rooms/a.json",
            "rooms.schema.json",
            json!({"name": 7, "steps": [{"title": "ok"}, {}, {"title": 3}]}),
        );
        let result = validate_contract(&graph, &doc);
        let paths: Vec<&str> = result.errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["/name", "/steps/1", "/steps/2/title"]);
    }

    #[test]
    fn test_enum_membership() {
        let graph = graph_of(&[(
            "gates.schema.json",
            json!({
                "type": "object",
                "properties": {"pace": {"enum": ["NOW", "HOLD", "LATER"]}}
            }),
        )]);
        let ok = contract("g.json", "gates.schema.json", json!({"pace": "HOLD"}));
        assert!(validate_contract(&graph, &ok).ok);

        let bad = contract("g.json", "gates.schema.json", json!({"pace": "NEVER"}));
        let result = validate_contract(&graph, &bad);
        assert_eq!(result.errors[0].rule, "enum");
        assert_eq!(result.errors[0].path, "/pace");
    }

    #[test]
    fn test_enum_numbers_compare_by_value() {
        let graph = graph_of(&[(
            "s.schema.json",
            json!({
                "type": "object",
                "properties": {"level": {"enum": [1, 2]}}
            }),
        )]);
        let whole = contract("c.json", "s.schema.json", json!({"level": 1.0}));
        assert!(validate_contract(&graph, &whole).ok);

        let out = contract("c.json", "s.schema.json", json!({"level": 3}));
        let result = validate_contract(&graph, &out);
        assert_eq!(result.errors[0].rule, "enum");
    }

    #[test]
    fn test_additional_properties_rejected() {
        let graph = graph_of(&[(
            "rooms.schema.json",
            json!({
                "type": "object",
                "properties": {"name": {"type": "string"}},
                "additionalProperties": false
            }),
        )]);
        let doc = contract(
            "rooms/a.json",
            "rooms.schema.json",
            json!({"name": "A", "extra": 1}),
        );
        let result = validate_contract(&graph, &doc);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].rule, "additionalProperties");
        assert_eq!(result.errors[0].path, "/extra");
    }

    #[test]
    fn test_integer_accepts_whole_numbers_only() {
        let graph = graph_of(&[(
            "s.schema.json",
            json!({"type": "object", "properties": {"n": {"type": "integer"}}}),
        )]);
        assert!(validate_contract(&graph, &contract("c.json", "s.schema.json", json!({"n": 3}))).ok);
        let result =
            validate_contract(&graph, &contract("c.json", "s.schema.json", json!({"n": 3.5})));
        assert_eq!(result.errors[0].rule, "type");
    }

    #[test]
    fn test_recursive_schema_terminates_on_instance_depth() {
        let graph = graph_of(&[(
            "rooms.schema.json",
            json!({
                "$ref": "#/definitions/Room",
                "definitions": {
                    "Room": {
                        "type": "object",
                        "properties": {
                            "name": {"type": "string"},
                            "child": {"$ref": "#/definitions/Room"}
                        },
                        "required": ["name"]
                    }
                }
            }),
        )]);
        let doc = contract(
            "rooms/a.json",
            "rooms.schema.json",
            json!({"name": "outer", "child": {"name": "inner", "child": {}}}),
        );
        let result = validate_contract(&graph, &doc);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].path, "/child/child");
        assert_eq!(result.errors[0].rule, "required");
    }

    #[test]
    fn test_pure_ref_cycle_is_structural_error() {
        let graph = graph_of(&[(
            "loop.schema.json",
            json!({
                "$ref": "#/definitions/A",
                "definitions": {
                    "A": {"$ref": "#/definitions/B"},
                    "B": {"$ref": "#/definitions/A"}
                }
            }),
        )]);
        let doc = contract("c.json", "loop.schema.json", json!("anything"));
        let result = validate_contract(&graph, &doc);
        assert!(!result.ok);
        assert_eq!(result.errors[0].rule, "$ref");
        assert!(result.errors[0].message.contains("circular"));
    }

    #[test]
    fn test_missing_binding_fails_closed() {
        let graph = graph_of(&[("rooms.schema.json", room_schema())]);
        let doc = ContractDocument {
            id: "orphan.json".into(),
            schema: None,
            body: ContractBody::Parsed(json!({})),
        };
        let result = validate_contract(&graph, &doc);
        assert!(!result.ok);
        assert_eq!(result.errors[0].rule, "binding");
    }

    #[test]
    fn test_binding_to_missing_schema_fails_closed() {
        let graph = graph_of(&[("rooms.schema.json", room_schema())]);
        let doc = contract("c.json", "gone.schema.json", json!({}));
        let result = validate_contract(&graph, &doc);
        assert_eq!(result.errors[0].rule, "binding");
    }

    #[test]
    fn test_malformed_contract_fails_with_parse_error() {
        let graph = graph_of(&[("rooms.schema.json", room_schema())]);
        let doc = ContractDocument {
            id: "bad.json".into(),
            schema: Some(SchemaId::new("rooms.schema.json")),
            body: ContractBody::Malformed("invalid JSON: expected value".into()),
        };
        let result = validate_contract(&graph, &doc);
        assert_eq!(result.errors[0].rule, "parse");
    }

    #[test]
    fn test_schema_warnings_surface_on_result() {
        let graph = graph_of(&[(
            "rooms.schema.json",
            json!({
                "$schema": "https://json-schema.org/draft/2020-12/schema",
                "type": "object"
            }),
        )]);
        let doc = contract("rooms/a.json", "rooms.schema.json", json!({}));
        let result = validate_contract(&graph, &doc);
        assert!(result.ok);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_stable_error_order_across_runs() {
        let graph = graph_of(&[(
            "s.schema.json",
            json!({
                "type": "object",
                "properties": {
                    "a": {"type": "string"},
                    "b": {"type": "string"}
                },
                "required": ["a", "b"]
            }),
        )]);
        let doc = contract("c.json", "s.schema.json", json!({"b": 1}));
        let first = validate_contract(&graph, &doc);
        let second = validate_contract(&graph, &doc);
        assert_eq!(first.errors, second.errors);
        // Missing-required first (schema order), then member traversal.
        assert_eq!(first.errors[0].rule, "required");
        assert_eq!(first.errors[1].path, "/b");
    }
}
