//! Table (re)creation and chunked bulk insertion
//!
//! Every full import drops the previous table and creates a fresh one. The
//! prior table is disposable; only catalog metadata carries over.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span};

use super::error::{PipelineError, PipelineResult};
use crate::warehouse::{ColumnDef, SqlValue, Warehouse};

/// `[materialize]` configuration section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterializeConfig {
    /// Rows per insert transaction
    pub batch_size: usize,
    /// Cell values treated as null
    pub null_markers: Vec<String>,
}

impl Default for MaterializeConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            null_markers: ["", "NaN", "nan", "NaT", "<NA>"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Creates a table and bulk-loads rows into it
#[derive(Debug, Clone, Default)]
pub struct SchemaMaterializer {
    config: MaterializeConfig,
}

impl SchemaMaterializer {
    pub fn new(config: MaterializeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MaterializeConfig {
        &self.config
    }

    /// Replace `table` with `columns` and load `rows` into it
    ///
    /// Cells are positional: `rows[i][j]` belongs to `columns[j]`. Returns
    /// the row count reported by a fresh count query, which must match the
    /// number of rows inserted.
    pub fn materialize(
        &self,
        warehouse: &dyn Warehouse,
        table: &str,
        columns: &[ColumnDef],
        rows: &[Vec<Option<String>>],
    ) -> PipelineResult<u64> {
        let _span = info_span!("materialize", table, columns = columns.len()).entered();

        warehouse
            .drop_table(table)
            .map_err(|e| PipelineError::schema(table, e))?;
        warehouse
            .create_table(table, columns)
            .map_err(|e| PipelineError::schema(table, e))?;

        // A lone integer column is truncated explicitly so float-formatted
        // values ("3.0", "7.5") still land as whole numbers
        let coerce_integers = columns.len() == 1 && columns[0].semantic_type.is_integer();

        let batch_size = self.config.batch_size.max(1);
        let mut inserted: u64 = 0;
        for (batch_no, chunk) in rows.chunks(batch_size).enumerate() {
            let values: Vec<Vec<SqlValue>> = chunk
                .iter()
                .map(|row| self.convert_row(row, columns, coerce_integers))
                .collect();
            let written = warehouse
                .insert_batch(table, columns, &values)
                .map_err(|e| PipelineError::bulk_write(table, e))?;
            inserted += written as u64;
            debug!(batch = batch_no + 1, rows = written, "Inserted batch");
        }

        let count = warehouse
            .row_count(table)
            .map_err(|e| PipelineError::bulk_write(table, e))?;
        if count != inserted || inserted != rows.len() as u64 {
            return Err(PipelineError::bulk_write(
                table,
                format!(
                    "{} rows read, {} inserted, table holds {}",
                    rows.len(),
                    inserted,
                    count
                ),
            ));
        }

        info!(table, rows = count, "Materialized table");
        Ok(count)
    }

    fn convert_row(
        &self,
        row: &[Option<String>],
        columns: &[ColumnDef],
        coerce_integers: bool,
    ) -> Vec<SqlValue> {
        columns
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                let cell = row
                    .get(idx)
                    .and_then(|cell| cell.as_deref())
                    .filter(|value| !self.is_null_marker(value));
                if coerce_integers {
                    SqlValue::coerce_integer(cell)
                } else {
                    SqlValue::from_text(cell, column.semantic_type)
                }
            })
            .collect()
    }

    fn is_null_marker(&self, value: &str) -> bool {
        let trimmed = value.trim();
        self.config.null_markers.iter().any(|m| m == trimmed)
    }
}
