//! Import table model: per-script bookkeeping for a materialized table

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted (script, table) record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportTable {
    /// Catalog identifier
    pub id: i64,
    /// Owning script
    pub script_id: i64,
    /// Warehouse table name
    pub table_name: String,
    /// When the table was last imported
    pub last_import: Option<DateTime<Utc>>,
    /// Row count after the last import
    pub row_count: i64,
    /// Row count after the import before that
    pub row_count_prev: i64,
    /// Whether the transform statement runs after each import
    pub run_transform: bool,
    /// SQL executed after the import when `run_transform` is set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform_script: Option<String>,
}

impl ImportTable {
    /// Transform statement to run after an import, if enabled and non-empty
    pub fn transform_statement(&self) -> Option<&str> {
        if !self.run_transform {
            return None;
        }
        self.transform_script
            .as_deref()
            .filter(|sql| !sql.trim().is_empty())
    }

    /// Record a finished import
    ///
    /// The previous count only moves when there was something to remember.
    pub fn record_import(&mut self, row_count: i64, at: DateTime<Utc>) {
        self.last_import = Some(at);
        if self.row_count != 0 {
            self.row_count_prev = self.row_count;
        }
        self.row_count = row_count;
    }

    /// Change in row count between the last two imports
    pub fn row_drift(&self) -> i64 {
        self.row_count - self.row_count_prev
    }
}
