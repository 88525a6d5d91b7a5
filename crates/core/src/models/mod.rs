//! Persisted entities: jobs, their scripts, and per-script table and column metadata
//!
//! Ownership runs Job -> Script -> {ImportTable, ImportColumn}. The only
//! other link is a column's foreign-key reference to another column, which
//! is a lookup rather than ownership.

pub mod column;
pub mod job;
pub mod script;
pub mod table;

pub use column::{ColumnOverrides, ImportColumn, NewColumn, OverrideType};
pub use job::{ExecutionLedger, ExecutionState, Job, NewJob};
pub use script::{NewScript, Script};
pub use table::ImportTable;
