//! Primary and foreign key enforcement
//!
//! Both operations are idempotent: the existing constraint is dropped before
//! the new one is added, so re-running never stacks constraints.

use sha2::{Digest, Sha256};
use tracing::{debug, info};

use super::error::{PipelineError, PipelineResult};
use crate::catalog::Catalog;
use crate::warehouse::{ForeignKeyDef, Warehouse};

/// Longest identifier the strictest backend accepts
const MAX_IDENTIFIER_LEN: usize = 63;

/// Applies catalog-declared keys to warehouse tables
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstraintManager;

impl ConstraintManager {
    pub fn new() -> Self {
        Self
    }

    /// Replace the primary key of `table` with the columns flagged in the catalog
    ///
    /// Columns keep their declaration order and are mapped to final names.
    /// Returns the key columns, or `None` when no column is flagged (a no-op).
    pub fn assign_primary_key(
        &self,
        catalog: &Catalog,
        warehouse: &dyn Warehouse,
        script_id: i64,
        table: &str,
    ) -> PipelineResult<Option<Vec<String>>> {
        let key: Vec<String> = catalog
            .list_columns(script_id, table)?
            .iter()
            .filter(|c| c.primary_key)
            .map(|c| c.final_name().to_string())
            .collect();
        if key.is_empty() {
            debug!(table, "No primary key columns flagged");
            return Ok(None);
        }

        if !warehouse.table_exists(table)? {
            return Err(PipelineError::schema(table, "table does not exist"));
        }

        warehouse.drop_primary_key(table)?;
        warehouse.add_primary_key(table, &key)?;

        info!(table, columns = ?key, "Assigned primary key");
        Ok(Some(key))
    }

    /// Re-apply every foreign key recorded in the catalog
    ///
    /// Returns the constraints that were applied.
    pub fn apply_foreign_keys(
        &self,
        catalog: &Catalog,
        warehouse: &dyn Warehouse,
    ) -> PipelineResult<Vec<ForeignKeyDef>> {
        let mut applied = Vec::new();

        for (column, target) in catalog.foreign_key_pairs()? {
            let fk = ForeignKeyDef {
                name: foreign_key_name(&column.table_name, column.final_name()),
                table: column.table_name.clone(),
                column: column.final_name().to_string(),
                referenced_table: target.table_name.clone(),
                referenced_column: target.final_name().to_string(),
            };

            if !target.is_unique {
                return Err(PipelineError::Constraint {
                    name: fk.name,
                    message: format!(
                        "{}.{} is not flagged unique",
                        fk.referenced_table, fk.referenced_column
                    ),
                });
            }
            for table in [&fk.table, &fk.referenced_table] {
                if !warehouse.table_exists(table)? {
                    return Err(PipelineError::schema(table.as_str(), "table does not exist"));
                }
            }

            warehouse.drop_foreign_key(&fk.table, &fk.name)?;
            warehouse.add_foreign_key(&fk)?;
            debug!(name = %fk.name, "Applied foreign key");
            applied.push(fk);
        }

        if !applied.is_empty() {
            info!(count = applied.len(), "Applied foreign keys");
        }
        Ok(applied)
    }
}

/// Deterministic constraint name for a foreign key on (table, column)
///
/// Non-alphanumeric characters become `_`. Names over 63 characters are cut
/// and suffixed with a hash of the full name so they stay distinct.
pub fn foreign_key_name(table: &str, column: &str) -> String {
    let raw = format!("fk_{}_{}", table, column);
    let name: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    if name.len() <= MAX_IDENTIFIER_LEN {
        return name;
    }

    let digest = Sha256::digest(raw.as_bytes());
    let suffix: String = digest.iter().take(4).map(|b| format!("{:02x}", b)).collect();
    format!("{}_{}", &name[..MAX_IDENTIFIER_LEN - 9], suffix)
}
