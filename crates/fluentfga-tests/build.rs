//! Generates entity types for the fixture model into `OUT_DIR/entities.rs`.

use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use fluentfga_codegen::{generate, AccessorPolicy};
use fluentfga_schema::AuthorizationModel;

const SCHEMA: &str = "fga-model.json";

fn main() -> anyhow::Result<()> {
    println!("cargo:rerun-if-changed={SCHEMA}");

    let json = fs::read_to_string(SCHEMA).with_context(|| format!("reading {SCHEMA}"))?;
    let model = AuthorizationModel::from_json(&json)?;
    let source = generate(&model, &AccessorPolicy::default())?;

    let out = PathBuf::from(env::var("OUT_DIR")?).join("entities.rs");
    fs::write(&out, source).with_context(|| format!("writing {}", out.display()))?;
    Ok(())
}
