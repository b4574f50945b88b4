//! Batch orchestration: the two one-shot operations the tool exposes.
//!
//! Both start from a fully loaded graph; a load failure aborts before any
//! contract is validated or any file is written. `generate-types` renders
//! every schema in memory first and writes nothing unless all of them
//! succeed -- partial type output is worse than none.

use std::collections::BTreeMap;
use std::path::Path;

use crate::config::PipelineConfig;
use crate::contract::discover_contracts;
use crate::emit::emit_graph;
use crate::loader::{load_graph, LoadError};
use crate::report::Report;
use crate::validator::validate_contract;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("cannot write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{failed} of {total} schemas could not be emitted")]
    EmitFailed { failed: usize, total: usize },
    #[error("schemas {first} and {second} both map to module `{module}`")]
    ModuleCollision {
        module: String,
        first: String,
        second: String,
    },
}

/// Load the graph, validate every discovered contract, and assemble the
/// report. Writes the JSON report when the config names a destination;
/// rendering the text report and choosing an exit code stay with the
/// caller.
pub fn run_validate(config: &PipelineConfig) -> Result<Report, PipelineError> {
    let graph = load_graph(&config.schema_dir)?;
    let contracts = discover_contracts(&config.contracts_dir, &config.schema_dir, &graph);

    let results = contracts
        .iter()
        .map(|contract| validate_contract(&graph, contract))
        .collect();
    let report = Report::new(results, config.fail_on_warning);
    tracing::info!(
        checked = report.summary.checked,
        invalid = report.summary.invalid,
        "validation finished"
    );

    if let Some(path) = &config.report_path {
        let json = serde_json::to_string_pretty(&report.to_json())
            .unwrap_or_else(|_| "{}".to_string());
        write_file(path, &json)?;
    }
    Ok(report)
}

/// Load the graph and write one type declaration file per schema, plus a
/// `mod.rs` tying them together. Emission failures are collected across
/// all schemas and reported together; nothing is written when any schema
/// fails.
pub fn run_generate_types(config: &PipelineConfig) -> Result<Vec<String>, PipelineError> {
    let graph = load_graph(&config.schema_dir)?;

    let mut sets = Vec::new();
    let mut failed = 0usize;
    let total = graph.len();
    for (id, outcome) in emit_graph(&graph) {
        match outcome {
            Ok(set) => sets.push(set),
            Err(e) => {
                failed += 1;
                tracing::error!(schema = %id, error = %e, "emission failed");
            }
        }
    }
    if failed > 0 {
        return Err(PipelineError::EmitFailed { failed, total });
    }

    // Flattening schema ids into module names can collide; refuse to let
    // one type file silently overwrite another.
    let mut modules: BTreeMap<&str, &crate::node::SchemaId> = BTreeMap::new();
    for set in &sets {
        if let Some(first) = modules.insert(&set.module, &set.schema) {
            return Err(PipelineError::ModuleCollision {
                module: set.module.clone(),
                first: first.to_string(),
                second: set.schema.to_string(),
            });
        }
    }

    std::fs::create_dir_all(&config.out_dir).map_err(|e| PipelineError::Write {
        path: config.out_dir.display().to_string(),
        source: e,
    })?;

    let mut written = Vec::new();
    let mut modules = String::from(
        "// Generated by lichen-contract. Do not edit by hand.\n\n",
    );
    for set in &sets {
        let file = config.out_dir.join(format!("{}.rs", set.module));
        write_file(&file, &set.source)?;
        modules.push_str(&format!("pub mod {};\n", set.module));
        written.push(set.module.clone());
    }
    write_file(&config.out_dir.join("mod.rs"), &modules)?;
    tracing::info!(schemas = written.len(), "type declarations written");
    Ok(written)
}

fn write_file(path: &Path, content: &str) -> Result<(), PipelineError> {
    std::fs::write(path, content).map_err(|e| PipelineError::Write {
        path: path.display().to_string(),
        source: e,
    })
}
