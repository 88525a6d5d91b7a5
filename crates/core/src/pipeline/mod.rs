//! Job execution pipeline
//!
//! This module ties the engine together:
//! - Script running with a per-run output directory
//! - Data file import: locate, read, infer, materialize
//! - Column metadata reconciliation
//! - Primary and foreign key enforcement
//! - The execution ledger
//!
//! # Example
//!
//! ```rust,ignore
//! use dataloom_core::pipeline::{EngineConfig, JobExecutor};
//!
//! let config = EngineConfig::load(Path::new("dataloom.toml"))?;
//! let executor = JobExecutor::open(config)?;
//! let outcome = executor.execute_named("nightly-sales")?;
//!
//! println!("{}", outcome.output);
//! if let Some(error) = &outcome.error {
//!     eprintln!("{error}");
//! }
//! ```
//!
//! # Halting
//!
//! A script that exits non-zero, or whose import fails, stops the job: later
//! scripts never start, and the ledger records the failure.

mod config;
mod constraints;
mod error;
mod executor;
mod import;
mod materialize;
mod reconcile;
mod runner;

pub use config::{CatalogConfig, ConfigError, EngineConfig};
pub use constraints::{ConstraintManager, foreign_key_name};
pub use error::{ErrorKind, PipelineError, PipelineResult};
pub use executor::{JobExecutor, JobOutcome};
pub use import::{ImportSummary, ScriptImporter};
pub use materialize::{MaterializeConfig, SchemaMaterializer};
pub use reconcile::{ColumnReconciler, OverrideNamePolicy, ReconcileConfig, ReconcileReport, UNKNOWN_TYPE};
pub use runner::{OUTPUT_DIR_ENV, RunnerConfig, RunnerError, ScriptOutput, ScriptRunner};

/// Open the configured stores and execute one job by name
///
/// This is a convenience function for one-off runs.
pub fn run_job(config: EngineConfig, name: &str) -> PipelineResult<JobOutcome> {
    JobExecutor::open(config)?.execute_named(name)
}
