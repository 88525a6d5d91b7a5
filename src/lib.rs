//! dataloom - recurring data-import jobs
//!
//! Provides unified interfaces for:
//! - Job catalog (jobs, scripts, per-table and per-column metadata)
//! - Script execution and data file location
//! - Column type inference and schema materialization
//! - Metadata reconciliation and key management
//! - Scheduling
//!
//! This crate re-exports `dataloom-core`; the `dataloom` binary lives in
//! `crates/cli`.

pub use dataloom_core::{catalog, inference, models, pipeline, scheduler, staging, warehouse};

// Re-export commonly used types
pub use dataloom_core::{Catalog, CatalogError, CatalogResult, JobManifest};
pub use dataloom_core::{ColumnTypeInferrer, InferenceConfig, SemanticType};
pub use dataloom_core::{
    ExecutionLedger, ExecutionState, ImportColumn, ImportTable, Job, NewJob, NewScript,
    OverrideType, Script,
};
pub use dataloom_core::{
    EngineConfig, ErrorKind, JobExecutor, JobOutcome, PipelineError, PipelineResult, run_job,
};
pub use dataloom_core::{DaySet, JobScheduler, Schedule};
pub use dataloom_core::{DataFileLocator, DataFileReader, Dataset, IngestError};
pub use dataloom_core::{Dialect, DuckDbWarehouse, Warehouse, WarehouseConfig, WarehouseError};
