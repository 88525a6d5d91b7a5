//! Error types for warehouse backends

use thiserror::Error;

/// Errors raised by a warehouse backend
#[derive(Error, Debug)]
pub enum WarehouseError {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// Connection could not be established
    #[error("Connection error: {0}")]
    Connection(String),

    /// Table does not exist
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// Column does not exist on a table
    #[error("Column not found: {table}.{column}")]
    ColumnNotFound { table: String, column: String },

    /// A constraint could not be added or removed
    #[error("Constraint {name} failed: {message}")]
    Constraint { name: String, message: String },

    /// Backend not available in this build
    #[error("Unsupported backend: {0}")]
    Unsupported(String),
}

/// Result type for warehouse operations
pub type WarehouseResult<T> = Result<T, WarehouseError>;

impl From<duckdb::Error> for WarehouseError {
    fn from(err: duckdb::Error) -> Self {
        WarehouseError::Database(err.to_string())
    }
}

#[cfg(feature = "postgres-backend")]
impl From<tokio_postgres::Error> for WarehouseError {
    fn from(err: tokio_postgres::Error) -> Self {
        WarehouseError::Database(err.to_string())
    }
}

impl WarehouseError {
    /// Constraint failure for a named constraint
    pub fn constraint(name: impl Into<String>, message: impl ToString) -> Self {
        Self::Constraint {
            name: name.into(),
            message: message.to_string(),
        }
    }
}
