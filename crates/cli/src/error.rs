//! CLI error type

use thiserror::Error;

use dataloom_core::pipeline::ConfigError;
use dataloom_core::scheduler::SchedulerError;
use dataloom_core::{CatalogError, PipelineError, WarehouseError};

#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Config(String),

    #[error("{0}")]
    Catalog(String),

    #[error("{0}")]
    Warehouse(String),

    #[error("{0}")]
    Pipeline(String),

    #[error("{0}")]
    Scheduler(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        CliError::Config(err.to_string())
    }
}

impl From<CatalogError> for CliError {
    fn from(err: CatalogError) -> Self {
        CliError::Catalog(err.user_message())
    }
}

impl From<WarehouseError> for CliError {
    fn from(err: WarehouseError) -> Self {
        CliError::Warehouse(err.to_string())
    }
}

impl From<PipelineError> for CliError {
    fn from(err: PipelineError) -> Self {
        CliError::Pipeline(err.user_message())
    }
}

impl From<SchedulerError> for CliError {
    fn from(err: SchedulerError) -> Self {
        CliError::Scheduler(err.to_string())
    }
}
