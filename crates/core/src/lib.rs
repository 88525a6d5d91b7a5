//! Dataloom Core - engine for recurring data-import jobs
//!
//! Provides:
//! - The job catalog (jobs, scripts, table and column metadata)
//! - Data file location and decoding
//! - Column type inference
//! - Warehouse backends (DuckDB, optionally PostgreSQL)
//! - The job execution pipeline: materialization, reconciliation, constraints
//! - A weekly scheduler service

pub mod catalog;
pub mod inference;
pub mod models;
pub mod pipeline;
pub mod scheduler;
pub mod staging;
pub mod warehouse;

// Re-export commonly used types
pub use catalog::{Catalog, CatalogError, CatalogResult, JobManifest};
pub use inference::{ColumnTypeInferrer, InferenceConfig, SemanticType};
pub use models::{
    ExecutionLedger, ExecutionState, ImportColumn, ImportTable, Job, NewJob, NewScript,
    OverrideType, Script,
};
pub use pipeline::{
    EngineConfig, ErrorKind, JobExecutor, JobOutcome, PipelineError, PipelineResult, run_job,
};
pub use scheduler::{DaySet, JobScheduler, Schedule};
pub use staging::{DataFileLocator, DataFileReader, Dataset, IngestError};
pub use warehouse::{Dialect, DuckDbWarehouse, Warehouse, WarehouseConfig, WarehouseError};
