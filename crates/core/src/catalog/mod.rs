//! Job catalog
//!
//! Persisted configuration for jobs, their scripts, and the per-script
//! table and column metadata that reconciliation and constraint handling
//! read and write. Backed by DuckDB.

pub mod error;
pub mod manifest;
pub mod schema;
pub mod store;

pub use error::{CatalogError, CatalogResult};
pub use manifest::{JobManifest, ScheduleSpec, ScriptSpec};
pub use schema::{CatalogSchema, SCHEMA_VERSION};
pub use store::Catalog;
