//! Authorization schema types and JSON loader.
//!
//! This module contains:
//! - Schema definitions (types, relations, conditions, parameters)
//! - A loader for the JSON form of an authorization model

mod loader;
mod types;

pub use types::*;
