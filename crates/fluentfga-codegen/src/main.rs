//! fluentfga-codegen binary
//!
//! Generates typed entity definitions from an OpenFGA authorization schema.
//!
//! # Usage
//!
//! ```bash
//! # Transform the human-authored model first
//! fga model transform --file fga-model.fga --output-format json > fga-model.json
//!
//! # Write generated source to a file
//! fluentfga-codegen --schema fga-model.json --out src/entities.rs
//!
//! # Classify extra types as accessors
//! fluentfga-codegen --schema fga-model.json --accessor-type crm_company --accessor-suffix account
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{info, Level};

use fluentfga_codegen::logging::{init_logging, LoggingConfig};
use fluentfga_codegen::{generate, AccessorPolicy};
use fluentfga_schema::AuthorizationModel;

/// Generate typed fluentfga entities from an authorization schema
#[derive(Parser, Debug)]
#[command(name = "fluentfga-codegen")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the JSON authorization schema
    #[arg(short, long, env = "FLUENTFGA_SCHEMA")]
    schema: PathBuf,

    /// Output file; generated source is written to stdout when omitted
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Type name suffix classified as an accessor (repeatable)
    #[arg(long = "accessor-suffix")]
    accessor_suffixes: Vec<String>,

    /// Exact type name classified as an accessor (repeatable)
    #[arg(long = "accessor-type")]
    accessor_types: Vec<String>,

    /// Do not start from the built-in suffix table
    #[arg(long)]
    no_default_suffixes: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn policy(&self) -> AccessorPolicy {
        let base = if self.no_default_suffixes {
            AccessorPolicy::empty()
        } else {
            AccessorPolicy::default()
        };
        let policy = self
            .accessor_suffixes
            .iter()
            .fold(base, |policy, suffix| policy.with_suffix(suffix));
        self.accessor_types
            .iter()
            .fold(policy, |policy, type_name| policy.with_type(type_name))
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let logging = if args.json_logs {
        LoggingConfig::json()
    } else {
        LoggingConfig::text()
    };
    init_logging(logging.with_level(level));

    let json = std::fs::read_to_string(&args.schema)
        .with_context(|| format!("failed to read schema {}", args.schema.display()))?;
    let model = AuthorizationModel::from_json(&json)
        .with_context(|| format!("failed to load schema {}", args.schema.display()))?;
    let source = generate(&model, &args.policy()).context("failed to generate entities")?;

    match &args.out {
        Some(path) => {
            std::fs::write(path, &source)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(out = %path.display(), "Wrote generated entities");
        }
        None => print!("{source}"),
    }

    Ok(())
}
