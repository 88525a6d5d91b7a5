//! Warehouse backends
//!
//! The import pipeline talks to the relational store through the
//! [`Warehouse`] trait. Dialect quirks (identifier quoting, type names,
//! how constraints are altered) live behind it, so one pipeline serves both
//! DuckDB and PostgreSQL.

pub mod dialect;
pub mod duckdb_backend;
pub mod error;
#[cfg(feature = "postgres-backend")]
pub mod postgres_backend;
pub mod value;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::inference::SemanticType;

pub use duckdb_backend::DuckDbWarehouse;
pub use dialect::Dialect;
pub use error::{WarehouseError, WarehouseResult};
#[cfg(feature = "postgres-backend")]
pub use postgres_backend::PostgresWarehouse;
pub use value::SqlValue;

/// A column to create
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    /// Final (override-applied) column name
    pub name: String,
    /// Storage type
    pub semantic_type: SemanticType,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, semantic_type: SemanticType) -> Self {
        Self {
            name: name.into(),
            semantic_type,
        }
    }
}

/// A single-column foreign key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyDef {
    /// Constraint name
    pub name: String,
    /// Referencing table
    pub table: String,
    /// Referencing column
    pub column: String,
    /// Referenced table
    pub referenced_table: String,
    /// Referenced column
    pub referenced_column: String,
}

/// Operations the import pipeline needs from a relational store
///
/// All calls block until the store has answered.
pub trait Warehouse {
    /// SQL dialect spoken by the backend
    fn dialect(&self) -> Dialect;

    /// Whether a table exists
    fn table_exists(&self, table: &str) -> WarehouseResult<bool>;

    /// Drop a table if it exists, along with foreign keys pointing at it
    fn drop_table(&self, table: &str) -> WarehouseResult<()>;

    /// Create a table with nullable columns and no constraints
    fn create_table(&self, table: &str, columns: &[ColumnDef]) -> WarehouseResult<()>;

    /// Insert rows in a single transaction, returning how many were written
    fn insert_batch(
        &self,
        table: &str,
        columns: &[ColumnDef],
        rows: &[Vec<SqlValue>],
    ) -> WarehouseResult<usize>;

    /// Count rows with a fresh query
    fn row_count(&self, table: &str) -> WarehouseResult<u64>;

    /// `(column, type)` pairs in table order, types upper-cased as the store reports them
    fn column_types(&self, table: &str) -> WarehouseResult<Vec<(String, String)>>;

    /// Current primary key columns, if any
    fn primary_key(&self, table: &str) -> WarehouseResult<Option<Vec<String>>>;

    /// Drop the primary key, and any foreign key that depends on it
    ///
    /// Returns whether a key was dropped.
    fn drop_primary_key(&self, table: &str) -> WarehouseResult<bool>;

    /// Add a primary key over `columns`, in order
    fn add_primary_key(&self, table: &str, columns: &[String]) -> WarehouseResult<()>;

    /// Whether a foreign key with this name exists on the table
    fn foreign_key_exists(&self, table: &str, name: &str) -> WarehouseResult<bool>;

    /// Drop a foreign key by name; returns whether it existed
    fn drop_foreign_key(&self, table: &str, name: &str) -> WarehouseResult<bool>;

    /// Add a foreign key
    ///
    /// The referenced column gets a unique constraint first when it is not
    /// already the referenced table's primary key.
    fn add_foreign_key(&self, fk: &ForeignKeyDef) -> WarehouseResult<()>;

    /// Run arbitrary SQL, such as a post-import transform statement
    fn execute_script(&self, sql: &str) -> WarehouseResult<()>;
}

/// `[warehouse]` configuration section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarehouseConfig {
    /// Which backend to use
    pub backend: Dialect,
    /// DuckDB database file (`:memory:` allowed)
    pub path: PathBuf,
    /// PostgreSQL connection string
    pub url: Option<String>,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            backend: Dialect::DuckDb,
            path: PathBuf::from("warehouse.duckdb"),
            url: None,
        }
    }
}

/// Open the configured backend
pub fn open_warehouse(config: &WarehouseConfig) -> WarehouseResult<Box<dyn Warehouse + Send>> {
    match config.backend {
        Dialect::DuckDb => {
            let path = config.path.display().to_string();
            Ok(Box::new(DuckDbWarehouse::open(&path)?))
        }
        Dialect::Postgres => open_postgres(config),
    }
}

#[cfg(feature = "postgres-backend")]
fn open_postgres(config: &WarehouseConfig) -> WarehouseResult<Box<dyn Warehouse + Send>> {
    let url = config.url.as_deref().ok_or_else(|| {
        WarehouseError::Connection("warehouse.url is required for the postgres backend".to_string())
    })?;
    Ok(Box::new(PostgresWarehouse::connect(url)?))
}

#[cfg(not(feature = "postgres-backend"))]
fn open_postgres(_config: &WarehouseConfig) -> WarehouseResult<Box<dyn Warehouse + Send>> {
    Err(WarehouseError::Unsupported(
        "postgres (rebuild with the postgres-backend feature)".to_string(),
    ))
}
