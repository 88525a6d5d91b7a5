//! Error types for the job catalog

use thiserror::Error;

/// Errors that can occur while reading or writing catalog state
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// Catalog not initialized
    #[error("Catalog not initialized. Run 'init' first.")]
    NotInitialized,

    /// Schema version mismatch
    #[error("Schema version mismatch: expected {expected}, found {found}")]
    SchemaVersionMismatch { expected: i32, found: i32 },

    /// Entity not found
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// A uniqueness invariant would be broken
    #[error("Duplicate {entity}: {key}")]
    Duplicate { entity: &'static str, key: String },

    /// A foreign-key reference breaks the reference rules
    #[error("Invalid column reference: {0}")]
    InvalidReference(String),

    /// Stored data could not be interpreted
    #[error("Corrupt catalog value in {field}: {value}")]
    Corrupt { field: &'static str, value: String },

    /// Manifest could not be read or parsed
    #[error("Invalid job manifest: {0}")]
    Manifest(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

impl From<duckdb::Error> for CatalogError {
    fn from(err: duckdb::Error) -> Self {
        CatalogError::Database(err.to_string())
    }
}

impl CatalogError {
    /// Not-found error for an entity
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            CatalogError::NotInitialized => {
                "Catalog not initialized.\n\nHint: Run 'dataloom init' first.".to_string()
            }
            CatalogError::SchemaVersionMismatch { expected, found } => {
                format!(
                    "Catalog schema version mismatch (expected v{expected}, found v{found}).\n\n\
                    Hint: Point [catalog] path at a fresh file and run 'dataloom init'."
                )
            }
            CatalogError::InvalidReference(msg) => {
                format!(
                    "Invalid column reference: {msg}\n\nHint: A column can only reference another column that is flagged unique."
                )
            }
            _ => self.to_string(),
        }
    }
}
