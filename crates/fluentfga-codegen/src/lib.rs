//! fluentfga-codegen: Typed entity generation for OpenFGA schemas
//!
//! Turns an [`AuthorizationModel`](fluentfga_schema::AuthorizationModel) into
//! Rust source that the `fluentfga` client consumes statically:
//! - One entity type per schema type, with its relation selectors
//! - `Resource` / `Accessor` capability impls, decided by an [`AccessorPolicy`]
//! - Builder functions for every schema condition
//!
//! # Usage
//!
//! From a build script:
//!
//! ```ignore
//! let json = std::fs::read_to_string("fga-model.json")?;
//! let model = fluentfga_schema::AuthorizationModel::from_json(&json)?;
//! let source = fluentfga_codegen::generate(&model, &fluentfga_codegen::AccessorPolicy::default())?;
//! std::fs::write(out_dir.join("entities.rs"), source)?;
//! ```

mod generator;
mod ident;
pub mod logging;
mod policy;
mod writer;

pub use generator::{generate, PERFORM};
pub use policy::{AccessorPolicy, DEFAULT_ACCESSOR_SUFFIXES};
