//! CLI entry point: `validate` and `generate-types` over a contract tree.
//!
//! Exit codes: 0 on success, 1 when contracts fail validation or any
//! schema cannot be emitted, 2 on fatal errors (malformed schema, dangling
//! reference, IO).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use lichen_contract::pipeline::{run_generate_types, run_validate, PipelineError};
use lichen_contract::PipelineConfig;

/// Lichen Protocol contract tooling.
///
/// Validates JSON contracts against their JSON Schemas and generates
/// deterministic Rust type declarations from the schema tree.
#[derive(Parser, Debug)]
#[command(name = "lichen-contract", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate every contract against its schema and print a report.
    Validate(ValidateArgs),
    /// Generate Rust type declarations from the schema tree.
    GenerateTypes(GenerateTypesArgs),
}

#[derive(clap::Args, Debug)]
struct ValidateArgs {
    /// Root directory of the schema tree.
    #[arg(long, default_value = "contracts/schema")]
    schema_dir: PathBuf,
    /// Root directory of the contract tree.
    #[arg(long, default_value = "contracts")]
    contracts_dir: PathBuf,
    /// Write a machine-readable JSON report to this path.
    #[arg(long)]
    report: Option<PathBuf>,
    /// Print the JSON report to stdout instead of the text listing.
    #[arg(long)]
    json: bool,
    /// Treat warnings as errors.
    #[arg(long)]
    fail_on_warning: bool,
}

#[derive(clap::Args, Debug)]
struct GenerateTypesArgs {
    /// Root directory of the schema tree.
    #[arg(long, default_value = "contracts/schema")]
    schema_dir: PathBuf,
    /// Output directory for the generated `.rs` files.
    #[arg(long, default_value = "types")]
    out_dir: PathBuf,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Validate(args) => validate(args),
        Commands::GenerateTypes(args) => generate_types(args),
    }
}

fn validate(args: ValidateArgs) -> ExitCode {
    let mut config = PipelineConfig::new(args.schema_dir, args.contracts_dir);
    config.fail_on_warning = args.fail_on_warning;
    config.report_path = args.report;

    match run_validate(&config) {
        Ok(report) => {
            if args.json {
                match serde_json::to_string_pretty(&report.to_json()) {
                    Ok(json) => println!("{json}"),
                    Err(e) => {
                        eprintln!("cannot serialize report: {e}");
                        return ExitCode::from(2);
                    }
                }
            } else {
                print!("{}", report.render_text(config.fail_on_warning));
            }
            if report.has_failures() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => fatal(&e),
    }
}

fn generate_types(args: GenerateTypesArgs) -> ExitCode {
    let mut config = PipelineConfig::new(args.schema_dir, PathBuf::new());
    config.out_dir = args.out_dir;

    match run_generate_types(&config) {
        Ok(written) => {
            for module in &written {
                println!("wrote {}", config.out_dir.join(format!("{module}.rs")).display());
            }
            println!("{} schemas emitted", written.len());
            ExitCode::SUCCESS
        }
        Err(
            e @ (PipelineError::EmitFailed { .. } | PipelineError::ModuleCollision { .. }),
        ) => {
            eprintln!("error: {e}");
            ExitCode::from(1)
        }
        Err(e) => fatal(&e),
    }
}

fn fatal(error: &PipelineError) -> ExitCode {
    eprintln!("error: {error}");
    ExitCode::from(2)
}
