//! Script model: one executable step of a job

use serde::{Deserialize, Serialize};

/// A persisted script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Script {
    /// Catalog identifier
    pub id: i64,
    /// Owning job
    pub job_id: i64,
    /// Name, unique within the job
    pub name: String,
    /// Source text handed to the interpreter
    pub content: String,
    /// Execution position, 1..N within the job
    pub order_exec: i32,
    /// Target table for the import
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    /// Whether the script's output is imported
    pub import_enabled: bool,
}

impl Script {
    /// Table this script imports into, if the import applies
    ///
    /// Scripts without a table name or with import disabled still run but
    /// skip every import step.
    pub fn import_target(&self) -> Option<&str> {
        if !self.import_enabled {
            return None;
        }
        self.table_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// Fields needed to add a script to a job
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewScript {
    /// Name, unique within the job
    pub name: String,
    /// Source text
    pub content: String,
    /// Execution position; appended after the last script when `None`
    pub order_exec: Option<i32>,
    /// Target table for the import
    pub table_name: Option<String>,
    /// Whether the script's output is imported
    pub import_enabled: bool,
}

impl NewScript {
    /// Create a script definition
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    /// Import the script's output into `table`
    pub fn importing_into(mut self, table: impl Into<String>) -> Self {
        self.table_name = Some(table.into());
        self.import_enabled = true;
        self
    }

    /// Set the execution position
    pub fn with_order(mut self, order: i32) -> Self {
        self.order_exec = Some(order);
        self
    }
}
