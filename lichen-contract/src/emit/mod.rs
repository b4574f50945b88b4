//! Type emitter: walks the resolved schema graph and renders one set of
//! Rust type declarations per schema document.
//!
//! The mapping is an exhaustive match over [`SchemaNode`]: object becomes a
//! struct, array a `Vec`, enum a closed Rust enum, and anything the
//! pipeline cannot represent fails with [`EmitError::UnsupportedConstruct`]
//! instead of emitting an approximate type. Output depends only on the
//! graph, so regeneration is byte-identical.

mod names;
mod writer;

pub use names::{field_ident, module_name, pascal_case, root_type_name};
pub use writer::{escape_rust, CodeWriter};

use std::collections::{BTreeMap, BTreeSet};

use crate::node::{RefTarget, SchemaDocument, SchemaGraph, SchemaId, SchemaNode};

/// Emission failure for one schema. Other schemas are unaffected.
#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    #[error("schema {schema}: unsupported construct at {path}: {construct}")]
    UnsupportedConstruct {
        schema: SchemaId,
        path: String,
        construct: String,
    },
}

/// Rendered declarations for one schema, ready to be written to
/// `<module>.rs`. Not retained after the pipeline writes it out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDeclarationSet {
    pub schema: SchemaId,
    pub module: String,
    pub source: String,
}

/// Emit every schema in the graph, in identifier order. Failures are
/// isolated per schema; callers decide whether any failure fails the run.
pub fn emit_graph(
    graph: &SchemaGraph,
) -> Vec<(SchemaId, Result<TypeDeclarationSet, EmitError>)> {
    graph
        .documents()
        .map(|doc| (doc.id.clone(), emit_schema(graph, doc)))
        .collect()
}

/// Emit the declaration set for one schema document. The graph is needed
/// to render cross-document references under the names their target
/// module actually declares.
pub fn emit_schema(
    graph: &SchemaGraph,
    doc: &SchemaDocument,
) -> Result<TypeDeclarationSet, EmitError> {
    let mut emitter = Emitter::new(graph, doc);
    emitter.run()?;
    Ok(TypeDeclarationSet {
        schema: doc.id.clone(),
        module: module_name(&doc.id),
        source: emitter.render(),
    })
}

struct Emitter<'a> {
    graph: &'a SchemaGraph,
    doc: &'a SchemaDocument,
    /// Rendered declarations in emission order. Auxiliary types for
    /// anonymous nested shapes land before the type that uses them.
    decls: Vec<String>,
    used_names: BTreeSet<String>,
    /// Names fixed up front so references always agree with declarations.
    root_name: String,
    def_names: BTreeMap<String, String>,
    uses_serde: bool,
}

impl<'a> Emitter<'a> {
    fn new(graph: &'a SchemaGraph, doc: &'a SchemaDocument) -> Self {
        let (root_name, def_names) = document_names(doc);
        let mut used_names: BTreeSet<String> = def_names.values().cloned().collect();
        used_names.insert(root_name.clone());
        Self {
            graph,
            doc,
            decls: Vec::new(),
            used_names,
            root_name,
            def_names,
            uses_serde: false,
        }
    }

    fn run(&mut self) -> Result<(), EmitError> {
        let doc = self.doc;
        let root_name = self.root_name.clone();
        self.named_decl(&root_name, &doc.root, "#")?;
        for (def, node) in &doc.definitions {
            let name = self.def_names[def.as_str()].clone();
            self.named_decl(&name, node, &format!("#/definitions/{def}"))?;
        }
        Ok(())
    }

    fn render(&self) -> String {
        let mut out = format!(
            "// Generated by lichen-contract from {}. Do not edit by hand.\n\n",
            self.doc.id
        );
        if self.uses_serde {
            out.push_str("use serde::{Deserialize, Serialize};\n\n");
        }
        out.push_str(&self.decls.join("\n"));
        out
    }

    /// Emit one named top-level declaration (the root or a definition).
    fn named_decl(
        &mut self,
        name: &str,
        node: &SchemaNode,
        path: &str,
    ) -> Result<(), EmitError> {
        match node {
            SchemaNode::Object {
                properties,
                required,
                additional,
            } => self.emit_struct(name, properties, required, *additional, path),
            SchemaNode::Enum { values } => self.emit_enum(name, values, path),
            other => {
                let ty = self.rust_type(other, name, path)?;
                self.decls.push(format!("pub type {name} = {ty};\n"));
                Ok(())
            }
        }
    }

    /// Map a node to a Rust type expression, emitting auxiliary
    /// declarations for anonymous nested shapes. `hint` seeds the name of
    /// any auxiliary type.
    fn rust_type(
        &mut self,
        node: &SchemaNode,
        hint: &str,
        path: &str,
    ) -> Result<String, EmitError> {
        match node {
            SchemaNode::String => Ok("String".into()),
            SchemaNode::Boolean => Ok("bool".into()),
            SchemaNode::Number { integer: true } => Ok("i64".into()),
            SchemaNode::Number { integer: false } => Ok("f64".into()),
            SchemaNode::Any => Ok("serde_json::Value".into()),
            SchemaNode::Array { items } => {
                let inner =
                    self.rust_type(items, &format!("{hint}Item"), &format!("{path}/items"))?;
                Ok(format!("Vec<{inner}>"))
            }
            SchemaNode::Reference { target } => Ok(self.type_ref(target)),
            SchemaNode::Object {
                properties,
                required,
                additional,
            } => {
                let name = claim(&mut self.used_names, hint.to_string());
                self.emit_struct(&name, properties, required, *additional, path)?;
                Ok(name)
            }
            SchemaNode::Enum { values } => {
                let name = claim(&mut self.used_names, hint.to_string());
                self.emit_enum(&name, values, path)?;
                Ok(name)
            }
            SchemaNode::Unknown { construct } => Err(EmitError::UnsupportedConstruct {
                schema: self.doc.id.clone(),
                path: path.to_string(),
                construct: construct.clone(),
            }),
        }
    }

    /// Type expression for a reference. Same-document targets use the
    /// names assigned up front; cross-document targets replay the target
    /// module's own name assignment and go through `super::`.
    fn type_ref(&self, target: &RefTarget) -> String {
        if target.document == self.doc.id {
            return match &target.definition {
                Some(def) => self
                    .def_names
                    .get(def.as_str())
                    .cloned()
                    .unwrap_or_else(|| pascal_case(def)),
                None => self.root_name.clone(),
            };
        }
        let module = module_name(&target.document);
        let ty = match self.graph.get(&target.document) {
            Some(doc) => {
                let (root, defs) = document_names(doc);
                match &target.definition {
                    Some(def) => defs
                        .get(def.as_str())
                        .cloned()
                        .unwrap_or_else(|| pascal_case(def)),
                    None => root,
                }
            }
            // Unreachable after a successful load; kept for direct API use.
            None => match &target.definition {
                Some(def) => pascal_case(def),
                None => root_type_name(&target.document),
            },
        };
        format!("super::{module}::{ty}")
    }

    fn emit_struct(
        &mut self,
        name: &str,
        properties: &[(String, SchemaNode)],
        required: &[String],
        additional: bool,
        path: &str,
    ) -> Result<(), EmitError> {
        self.uses_serde = true;

        // Resolve field types first so auxiliary declarations precede the
        // struct that uses them.
        let mut fields = Vec::new();
        for (key, node) in properties {
            let ty = self.rust_type(
                node,
                &format!("{name}{}", pascal_case(key)),
                &format!("{path}/properties/{key}"),
            )?;
            let ident = field_ident(key);
            let ty = if required.iter().any(|r| r == key) {
                ty
            } else {
                format!("Option<{ty}>")
            };
            fields.push((key.clone(), ident, ty));
        }

        let mut w = CodeWriter::new();
        w.line("#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]");
        if !additional {
            w.line("#[serde(deny_unknown_fields)]");
        }
        w.open(&format!("pub struct {name}"));
        for (key, ident, ty) in fields {
            if ident != key {
                w.line(&format!("#[serde(rename = \"{}\")]", escape_rust(&key)));
            }
            w.line(&format!("pub {ident}: {ty},"));
        }
        w.close();
        self.decls.push(w.finish());
        Ok(())
    }

    fn emit_enum(
        &mut self,
        name: &str,
        values: &[serde_json::Value],
        path: &str,
    ) -> Result<(), EmitError> {
        let mut literals = Vec::new();
        for value in values {
            match value.as_str() {
                Some(s) => literals.push(s),
                None => {
                    return Err(EmitError::UnsupportedConstruct {
                        schema: self.doc.id.clone(),
                        path: path.to_string(),
                        construct: format!("enum with non-string literal {value}"),
                    })
                }
            }
        }

        self.uses_serde = true;
        let mut w = CodeWriter::new();
        w.line("#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]");
        w.open(&format!("pub enum {name}"));
        let mut variant_names = BTreeSet::new();
        for literal in literals {
            let variant = claim(&mut variant_names, pascal_case(literal));
            w.line(&format!("#[serde(rename = \"{}\")]", escape_rust(literal)));
            w.line(&format!("{variant},"));
        }
        w.close();
        self.decls.push(w.finish());
        Ok(())
    }
}

/// Names declared by one document: the root type first, then definitions
/// in key order, deduplicated with [`claim`]. Both the emitter's own
/// declarations and cross-document references derive names through here,
/// so they always agree.
fn document_names(doc: &SchemaDocument) -> (String, BTreeMap<String, String>) {
    let mut used = BTreeSet::new();
    let root = claim(&mut used, root_type_name(&doc.id));
    let mut defs = BTreeMap::new();
    for name in doc.definitions.keys() {
        defs.insert(name.clone(), claim(&mut used, pascal_case(name)));
    }
    (root, defs)
}

/// Claim `base` in `used`, appending a counter on collision. Deterministic
/// for a given claim order.
fn claim(used: &mut BTreeSet<String>, base: String) -> String {
    if used.insert(base.clone()) {
        return base;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{base}{n}");
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}
