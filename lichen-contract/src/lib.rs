//! Schema validation and type generation for Lichen Protocol contract
//! trees.
//!
//! A one-shot batch pipeline in three parts:
//!
//! 1. [`loader`] reads a directory of JSON Schema files and builds a
//!    resolved [`node::SchemaGraph`] -- every `$ref` is checked against
//!    the graph of identifiers, and circular schemas are fine because
//!    references resolve by lookup, never by inlining.
//! 2. [`validator`] evaluates contract documents against the graph, one
//!    [`report::ValidationResult`] per contract, errors in stable
//!    depth-first document order.
//! 3. [`emit`] renders deterministic Rust type declarations from the
//!    graph, one file per schema, refusing constructs it cannot represent.
//!
//! Load failures abort the whole run; per-contract and per-schema failures
//! are isolated. [`pipeline`] wires the stages into the `validate` and
//! `generate-types` operations the CLI exposes.

pub mod config;
pub mod contract;
pub mod emit;
pub mod loader;
pub mod node;
pub mod pipeline;
pub mod report;
pub mod validator;

pub use config::PipelineConfig;
pub use contract::{ContractBody, ContractDocument};
pub use emit::{EmitError, TypeDeclarationSet};
pub use loader::{load_graph, LoadError};
pub use node::{RefTarget, SchemaDocument, SchemaGraph, SchemaId, SchemaNode};
pub use pipeline::{run_generate_types, run_validate, PipelineError};
pub use report::{Report, ValidationError, ValidationResult};
pub use validator::validate_contract;
