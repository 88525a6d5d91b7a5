//! Error types for job execution
//!
//! Every stage of a job run reports failure as a [`PipelineError`]. The
//! executor is the only place that turns one into a failed ledger entry and a
//! halt, so stages never swallow errors.

use std::path::PathBuf;
use thiserror::Error;

use super::config::ConfigError;
use crate::catalog::CatalogError;
use crate::staging::IngestError;
use crate::warehouse::WarehouseError;

/// Broad failure categories, for callers that branch on the kind of failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    JobNotFound,
    InputNotFound,
    Decode,
    Read,
    Schema,
    Constraint,
    ScriptExecution,
    BulkWrite,
    Catalog,
    Warehouse,
    Config,
    Io,
}

/// Errors that can occur while executing a job
#[derive(Error, Debug)]
pub enum PipelineError {
    /// No job with that identifier
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// No qualifying data file
    #[error("No data file found in {}: {reason}", .directory.display())]
    InputNotFound { directory: PathBuf, reason: String },

    /// No attempted encoding decoded the data file
    #[error("Unable to decode {} (tried {})", .path.display(), .attempted.join(", "))]
    Decode {
        path: PathBuf,
        attempted: Vec<String>,
    },

    /// The data file could not be parsed
    #[error("Unable to read data file: {0}")]
    Read(String),

    /// A table or column the step expects does not exist
    #[error("Schema error on {object}: {message}")]
    Schema { object: String, message: String },

    /// A constraint could not be applied
    #[error("Constraint error on {name}: {message}")]
    Constraint { name: String, message: String },

    /// A script could not be run or exited non-zero
    #[error("Script {script} failed: {message}")]
    ScriptExecution { script: String, message: String },

    /// Rows were not written as expected
    #[error("Bulk write into {table} failed: {message}")]
    BulkWrite { table: String, message: String },

    /// Catalog error
    #[error("Catalog error: {0}")]
    Catalog(CatalogError),

    /// Warehouse error not covered by a more specific kind
    #[error("Warehouse error: {0}")]
    Warehouse(WarehouseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

impl PipelineError {
    /// Failure category
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::JobNotFound(_) => ErrorKind::JobNotFound,
            PipelineError::InputNotFound { .. } => ErrorKind::InputNotFound,
            PipelineError::Decode { .. } => ErrorKind::Decode,
            PipelineError::Read(_) => ErrorKind::Read,
            PipelineError::Schema { .. } => ErrorKind::Schema,
            PipelineError::Constraint { .. } => ErrorKind::Constraint,
            PipelineError::ScriptExecution { .. } => ErrorKind::ScriptExecution,
            PipelineError::BulkWrite { .. } => ErrorKind::BulkWrite,
            PipelineError::Catalog(_) => ErrorKind::Catalog,
            PipelineError::Warehouse(_) => ErrorKind::Warehouse,
            PipelineError::Config(_) => ErrorKind::Config,
            PipelineError::Io(_) => ErrorKind::Io,
        }
    }

    /// Schema error for a table or column
    pub fn schema(object: impl Into<String>, message: impl ToString) -> Self {
        Self::Schema {
            object: object.into(),
            message: message.to_string(),
        }
    }

    /// Bulk write error for a table
    pub fn bulk_write(table: impl Into<String>, message: impl ToString) -> Self {
        Self::BulkWrite {
            table: table.into(),
            message: message.to_string(),
        }
    }

    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::JobNotFound(job) => {
                format!("Job not found: {job}\n\nHint: Use 'dataloom job list' to see defined jobs.")
            }
            PipelineError::InputNotFound { directory, reason } => {
                format!(
                    "No data file found in {}: {reason}\n\nHint: Make sure the script writes a .csv, .xlsx or .json file into $DATALOOM_OUTPUT_DIR.",
                    directory.display()
                )
            }
            PipelineError::Decode { path, attempted } => {
                format!(
                    "Unable to decode {} (tried {}).\n\nHint: Add the file's encoding to [reader] encodings.",
                    path.display(),
                    attempted.join(", ")
                )
            }
            PipelineError::Constraint { name, message } => {
                format!(
                    "Constraint {name} could not be applied: {message}\n\nHint: Check that the referenced column really holds unique values."
                )
            }
            PipelineError::Catalog(e) => e.user_message(),
            _ => self.to_string(),
        }
    }
}

impl From<IngestError> for PipelineError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::InputNotFound { directory, reason } => {
                PipelineError::InputNotFound { directory, reason }
            }
            IngestError::Decode { path, attempted } => PipelineError::Decode { path, attempted },
            IngestError::Io(e) => PipelineError::Io(e),
            IngestError::UnknownEncoding(label) => {
                PipelineError::Config(format!("unknown encoding: {label}"))
            }
            other => PipelineError::Read(other.to_string()),
        }
    }
}

impl From<WarehouseError> for PipelineError {
    fn from(err: WarehouseError) -> Self {
        match err {
            WarehouseError::TableNotFound(table) => {
                PipelineError::schema(table, "table does not exist")
            }
            WarehouseError::ColumnNotFound { table, column } => {
                PipelineError::schema(format!("{table}.{column}"), "column does not exist")
            }
            WarehouseError::Constraint { name, message } => {
                PipelineError::Constraint { name, message }
            }
            other => PipelineError::Warehouse(other),
        }
    }
}

impl From<ConfigError> for PipelineError {
    fn from(err: ConfigError) -> Self {
        PipelineError::Config(err.to_string())
    }
}

impl From<CatalogError> for PipelineError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::InvalidReference(message) => PipelineError::Constraint {
                name: "reference".to_string(),
                message,
            },
            other => PipelineError::Catalog(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingest_errors_keep_their_kind() {
        let err: PipelineError = IngestError::InputNotFound {
            directory: PathBuf::from("/data"),
            reason: "empty".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::InputNotFound);

        let err: PipelineError = IngestError::Decode {
            path: PathBuf::from("a.csv"),
            attempted: vec!["utf-8".to_string()],
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Decode);

        let err: PipelineError = IngestError::invalid_format("a.json", "not an object").into();
        assert_eq!(err.kind(), ErrorKind::Read);
    }

    #[test]
    fn test_warehouse_errors_map_to_taxonomy() {
        let err: PipelineError = WarehouseError::TableNotFound("sales".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::Schema);
        assert!(err.to_string().contains("sales"));

        let err: PipelineError = WarehouseError::constraint("pk_sales", "duplicate key").into();
        assert_eq!(err.kind(), ErrorKind::Constraint);

        let err: PipelineError = WarehouseError::Database("boom".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::Warehouse);
    }

    #[test]
    fn test_user_message_hints() {
        let err = PipelineError::JobNotFound("nightly".to_string());
        assert!(err.user_message().contains("Hint"));
    }
}
