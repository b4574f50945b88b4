//! Contract documents and their schema bindings.
//!
//! A contract is a plain JSON file that must conform to exactly one schema
//! in the graph. The binding comes from the contract's own top-level
//! `"$schema"` member when it names a loaded schema file, and otherwise
//! from the directory convention the Lichen tree uses:
//! `rooms/entry_room.json` binds to `rooms.schema.json`, and
//! `gates/coherence_gate.json` prefers `gates/coherence_gate.schema.json`
//! when a per-file schema exists.

use std::path::Path;

use serde_json::Value;
use walkdir::WalkDir;

use crate::node::{SchemaGraph, SchemaId};

/// One contract file, read-only input to the validator.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractDocument {
    /// Slash-normalized path relative to the contracts root.
    pub id: String,
    /// The schema this contract must conform to, when a binding resolved.
    pub schema: Option<SchemaId>,
    pub body: ContractBody,
}

/// Parsed contract content, or the reason parsing failed. A malformed
/// contract still produces a (failed) validation result; it never aborts
/// the batch.
#[derive(Debug, Clone, PartialEq)]
pub enum ContractBody {
    Parsed(Value),
    Malformed(String),
}

/// Discover every contract file under `contracts_dir`, in path order.
///
/// Files under `schema_dir` and files named `*.schema.json` are skipped so
/// a schema tree nested inside the contracts tree is not validated against
/// itself.
pub fn discover_contracts(
    contracts_dir: &Path,
    schema_dir: &Path,
    graph: &SchemaGraph,
) -> Vec<ContractDocument> {
    let mut contracts = Vec::new();
    for entry in WalkDir::new(contracts_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.starts_with(schema_dir) {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(".schema.json"))
        {
            continue;
        }
        contracts.push(load_contract(path, contracts_dir, graph));
    }
    tracing::debug!(contracts = contracts.len(), "contracts discovered");
    contracts
}

/// Read one contract file and bind it to a schema in the graph.
pub fn load_contract(
    path: &Path,
    contracts_dir: &Path,
    graph: &SchemaGraph,
) -> ContractDocument {
    let relative = path.strip_prefix(contracts_dir).unwrap_or(path);
    let id = relative.to_string_lossy().replace('\\', "/");

    let body = match std::fs::read_to_string(path) {
        Err(e) => ContractBody::Malformed(format!("cannot read file: {e}")),
        Ok(content) => match serde_json::from_str::<Value>(&content) {
            Err(e) => ContractBody::Malformed(format!("invalid JSON: {e}")),
            Ok(value) => ContractBody::Parsed(value),
        },
    };

    let schema = bind_schema(&id, &body, graph);
    ContractDocument { id, schema, body }
}

/// Resolve the schema binding for a contract.
///
/// Order of precedence:
/// 1. a top-level `"$schema"` string naming a loaded schema file,
/// 2. `<dir>/<stem>.schema.json` (per-file schema next to the group),
/// 3. `<first path component>.schema.json` (the group schema),
/// 4. `<stem>.schema.json` for contracts at the root.
pub fn bind_schema(
    contract_id: &str,
    body: &ContractBody,
    graph: &SchemaGraph,
) -> Option<SchemaId> {
    if let ContractBody::Parsed(value) = body {
        if let Some(declared) = value.get("$schema").and_then(|v| v.as_str()) {
            if let Some(id) = match_declared_schema(declared, graph) {
                return Some(id);
            }
        }
    }

    let (dir, file) = match contract_id.rsplit_once('/') {
        Some((dir, file)) => (Some(dir), file),
        None => (None, contract_id),
    };
    let stem = file.strip_suffix(".json").unwrap_or(file);

    let mut candidates = Vec::new();
    if let Some(dir) = dir {
        candidates.push(format!("{dir}/{stem}.schema.json"));
        let group = dir.split('/').next().unwrap_or(dir);
        candidates.push(format!("{group}.schema.json"));
    } else {
        candidates.push(format!("{stem}.schema.json"));
    }

    candidates
        .into_iter()
        .map(SchemaId::new)
        .find(|id| graph.contains(id))
}

/// Match a `"$schema"` declaration against loaded schema identifiers.
/// Accepts an exact identifier or any identifier with the same file name,
/// so both `"rooms.schema.json"` and a canonical URI ending in
/// `/rooms.schema.json` bind. Meta-schema URIs never match because no
/// loaded identifier carries their file name.
fn match_declared_schema(declared: &str, graph: &SchemaGraph) -> Option<SchemaId> {
    let exact = SchemaId::new(declared);
    if graph.contains(&exact) {
        return Some(exact);
    }
    let file_name = declared.rsplit('/').next().unwrap_or(declared);
    if !file_name.ends_with(".json") {
        return None;
    }
    graph
        .documents()
        .map(|doc| &doc.id)
        .find(|id| id.file_name() == file_name)
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_document;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn graph_with(ids: &[&str]) -> SchemaGraph {
        let mut graph = SchemaGraph::new();
        for id in ids {
            graph.insert(load_document(SchemaId::new(*id), &json!({})));
        }
        graph
    }

    #[test]
    fn test_bind_group_convention() {
        let graph = graph_with(&["rooms.schema.json", "gates.schema.json"]);
        let body = ContractBody::Parsed(json!({}));
        assert_eq!(
            bind_schema("rooms/entry_room.json", &body, &graph),
            Some(SchemaId::new("rooms.schema.json"))
        );
    }

    #[test]
    fn test_bind_per_file_schema_wins_over_group() {
        let graph = graph_with(&[
            "gates.schema.json",
            "gates/coherence_gate.schema.json",
        ]);
        let body = ContractBody::Parsed(json!({}));
        assert_eq!(
            bind_schema("gates/coherence_gate.json", &body, &graph),
            Some(SchemaId::new("gates/coherence_gate.schema.json"))
        );
        assert_eq!(
            bind_schema("gates/other_gate.json", &body, &graph),
            Some(SchemaId::new("gates.schema.json"))
        );
    }

    #[test]
    fn test_bind_root_level_by_stem() {
        let graph = graph_with(&["hallway.schema.json"]);
        let body = ContractBody::Parsed(json!({}));
        assert_eq!(
            bind_schema("hallway.json", &body, &graph),
            Some(SchemaId::new("hallway.schema.json"))
        );
    }

    #[test]
    fn test_bind_declared_schema_overrides_convention() {
        let graph = graph_with(&["rooms.schema.json", "gates.schema.json"]);
        let body = ContractBody::Parsed(json!({"$schema": "gates.schema.json"}));
        assert_eq!(
            bind_schema("rooms/entry_room.json", &body, &graph),
            Some(SchemaId::new("gates.schema.json"))
        );
    }

    #[test]
    fn test_bind_declared_schema_by_uri_file_name() {
        let graph = graph_with(&["rooms.schema.json"]);
        let body = ContractBody::Parsed(json!({
            "$schema": "https://lichen.example/contracts/rooms.schema.json"
        }));
        assert_eq!(
            bind_schema("anything.json", &body, &graph),
            Some(SchemaId::new("rooms.schema.json"))
        );
    }

    #[test]
    fn test_bind_meta_schema_uri_falls_back_to_convention() {
        let graph = graph_with(&["rooms.schema.json"]);
        let body = ContractBody::Parsed(json!({
            "$schema": "http://json-schema.org/draft-07/schema#"
        }));
        assert_eq!(
            bind_schema("rooms/entry_room.json", &body, &graph),
            Some(SchemaId::new("rooms.schema.json"))
        );
    }

    #[test]
    fn test_bind_unmatched_is_none() {
        let graph = graph_with(&["rooms.schema.json"]);
        let body = ContractBody::Parsed(json!({}));
        assert_eq!(bind_schema("services/memory.json", &body, &graph), None);
    }

    #[test]
    fn test_discover_skips_schema_tree_and_schema_files() {
        let dir = tempfile::tempdir().unwrap();
        let contracts = dir.path().join("contracts");
        let schemas = contracts.join("schema");
        std::fs::create_dir_all(contracts.join("rooms")).unwrap();
        std::fs::create_dir_all(&schemas).unwrap();
        std::fs::write(schemas.join("rooms.schema.json"), "{}").unwrap();
        std::fs::write(
            contracts.join("rooms/entry_room.json"),
            r#"{"name": "Entry"}"#,
        )
        .unwrap();
        std::fs::write(contracts.join("rooms/stray.schema.json"), "{}").unwrap();
        std::fs::write(contracts.join("notes.txt"), "not json").unwrap();

        let graph = graph_with(&["rooms.schema.json"]);
        let found = discover_contracts(&contracts, &schemas, &graph);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "rooms/entry_room.json");
        assert_eq!(found[0].schema, Some(SchemaId::new("rooms.schema.json")));
    }

    #[test]
    fn test_load_contract_malformed_is_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ nope").unwrap();
        let graph = graph_with(&["bad.schema.json"]);
        let doc = load_contract(&path, dir.path(), &graph);
        assert!(matches!(doc.body, ContractBody::Malformed(_)));
        // Binding still resolves from the path convention.
        assert_eq!(doc.schema, Some(SchemaId::new("bad.schema.json")));
    }
}
