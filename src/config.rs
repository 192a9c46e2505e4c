//! Configuration loader and schema types.
//!
//! This module exposes the configuration schema used to drive the cleaning
//! and ledger pipelines and helpers to load configuration from disk.

mod load;
mod schema;

pub use schema::*;
