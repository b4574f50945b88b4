//! Pipeline configuration. The pipeline itself is explicit value passing
//! (paths in, graph and reports out); this struct is the whole ambient
//! surface, populated by the CLI or by tests.

use std::path::PathBuf;

/// Options recognized by the batch pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Root of the schema tree (`.json` files, discovered recursively).
    pub schema_dir: PathBuf,
    /// Root of the contract tree. May contain the schema tree; schema
    /// files are excluded from contract discovery.
    pub contracts_dir: PathBuf,
    /// Destination directory for emitted type declaration files.
    pub out_dir: PathBuf,
    /// Promote warnings to errors in the report summary.
    pub fail_on_warning: bool,
    /// Optional destination for the machine-readable JSON report.
    pub report_path: Option<PathBuf>,
}

impl PipelineConfig {
    pub fn new(
        schema_dir: impl Into<PathBuf>,
        contracts_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            schema_dir: schema_dir.into(),
            contracts_dir: contracts_dir.into(),
            out_dir: PathBuf::from("types"),
            fail_on_warning: false,
            report_path: None,
        }
    }
}
