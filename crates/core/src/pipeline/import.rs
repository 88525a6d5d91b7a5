//! Post-script import sub-pipeline
//!
//! Runs after a script exits successfully, when the script declares a target
//! table with import enabled:
//!
//! 1. Locate the data file (output slot first, recency scan as fallback)
//! 2. Read it into a dataset and normalize null markers
//! 3. Infer column types, letting manual type overrides win
//! 4. Materialize the table under final (override-applied) names
//! 5. Update table bookkeeping and run the transform statement
//! 6. Reconcile column metadata against the stored table
//! 7. Re-apply the primary key, then every foreign key
//!
//! Steps run strictly in order and the first error aborts the import.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info, info_span};

use super::config::EngineConfig;
use super::constraints::ConstraintManager;
use super::error::{PipelineError, PipelineResult};
use super::materialize::SchemaMaterializer;
use super::reconcile::{ColumnReconciler, ReconcileReport};
use crate::catalog::Catalog;
use crate::inference::ColumnTypeInferrer;
use crate::models::{ColumnOverrides, Script};
use crate::staging::{DataFileLocator, DataFileReader, Dataset, LocateSource};
use crate::warehouse::{ColumnDef, Warehouse};

/// What one import did
#[derive(Debug, Clone, PartialEq)]
pub struct ImportSummary {
    /// Target table
    pub table: String,
    /// File the rows came from
    pub file: PathBuf,
    /// How the file was found
    pub source: LocateSource,
    /// Rows inserted
    pub rows: u64,
    /// Whether a transform statement ran
    pub transformed: bool,
    /// Column metadata changes
    pub reconcile: ReconcileReport,
    /// Primary key columns, when any are flagged
    pub primary_key: Option<Vec<String>>,
    /// Foreign keys applied across all tables
    pub foreign_keys: usize,
}

/// Imports a script's output file into its target table
#[derive(Debug, Clone, Default)]
pub struct ScriptImporter {
    locator: DataFileLocator,
    reader: DataFileReader,
    inferrer: ColumnTypeInferrer,
    materializer: SchemaMaterializer,
    reconciler: ColumnReconciler,
    constraints: ConstraintManager,
    null_markers: Vec<String>,
}

impl ScriptImporter {
    /// Build the importer from engine configuration
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            locator: DataFileLocator::new(config.locator.clone()),
            reader: DataFileReader::new(config.reader.clone()),
            inferrer: ColumnTypeInferrer::with_config(config.inference.clone()),
            materializer: SchemaMaterializer::new(config.materialize.clone()),
            reconciler: ColumnReconciler::new(config.reconcile.clone()),
            constraints: ConstraintManager::new(),
            null_markers: config.materialize.null_markers.clone(),
        }
    }

    /// Run the import for `script`, whose data file is expected in `output_slot`
    ///
    /// Returns `Ok(None)` when the script has no import target.
    pub fn import(
        &self,
        catalog: &Catalog,
        warehouse: &dyn Warehouse,
        script: &Script,
        output_slot: &Path,
    ) -> PipelineResult<Option<ImportSummary>> {
        let Some(table) = script.import_target() else {
            debug!(script = %script.name, "Script has no import target");
            return Ok(None);
        };
        let _span = info_span!("import", script = %script.name, table).entered();

        let located = self.locator.locate(Some(output_slot))?;
        let dataset = self.without_null_markers(self.reader.read(&located.path)?);
        info!(
            file = %located.path.display(),
            source = ?located.source,
            rows = dataset.row_count(),
            columns = dataset.column_count(),
            "Read data file"
        );

        let columns = self.column_definitions(catalog, script.id, table, &dataset)?;
        let rows = self
            .materializer
            .materialize(warehouse, table, &columns, dataset.rows())?;

        let transformed = self.record_table(catalog, warehouse, script.id, table)?;

        let reconcile = self
            .reconciler
            .reconcile(catalog, warehouse, script.id, table, &dataset)?;
        let primary_key = self
            .constraints
            .assign_primary_key(catalog, warehouse, script.id, table)?;
        let foreign_keys = self.constraints.apply_foreign_keys(catalog, warehouse)?;

        Ok(Some(ImportSummary {
            table: table.to_string(),
            file: located.path,
            source: located.source,
            rows,
            transformed,
            reconcile,
            primary_key,
            foreign_keys: foreign_keys.len(),
        }))
    }

    /// Final names and types for the table, overrides applied
    fn column_definitions(
        &self,
        catalog: &Catalog,
        script_id: i64,
        table: &str,
        dataset: &Dataset,
    ) -> PipelineResult<Vec<ColumnDef>> {
        let overrides = ColumnOverrides::from_columns(&catalog.list_columns(script_id, table)?);
        let inferred = self.inferrer.infer_dataset(dataset);

        let columns: Vec<ColumnDef> = inferred
            .into_iter()
            .map(|inference| {
                let semantic_type = overrides
                    .type_override(&inference.name)
                    .unwrap_or(inference.semantic_type);
                ColumnDef::new(overrides.final_name(&inference.name), semantic_type)
            })
            .collect();

        for (idx, column) in columns.iter().enumerate() {
            if columns[..idx]
                .iter()
                .any(|c| c.name.eq_ignore_ascii_case(&column.name))
            {
                return Err(PipelineError::schema(
                    format!("{}.{}", table, column.name),
                    "two columns share this final name",
                ));
            }
        }
        Ok(columns)
    }

    /// Update the table row and run its transform; returns whether a transform ran
    fn record_table(
        &self,
        catalog: &Catalog,
        warehouse: &dyn Warehouse,
        script_id: i64,
        table: &str,
    ) -> PipelineResult<bool> {
        let mut record = catalog.get_or_create_table(script_id, table)?;

        let transformed = match record.transform_statement() {
            Some(sql) => {
                warehouse
                    .execute_script(sql)
                    .map_err(|e| PipelineError::ScriptExecution {
                        script: format!("transform on {}", table),
                        message: e.to_string(),
                    })?;
                info!(table, "Applied transform statement");
                true
            }
            None => false,
        };

        let count = warehouse.row_count(table)?;
        record.record_import(count as i64, Utc::now());
        catalog.update_table(&record)?;
        debug!(table, rows = count, drift = record.row_drift(), "Recorded import");
        Ok(transformed)
    }

    fn without_null_markers(&self, dataset: Dataset) -> Dataset {
        let is_marker = |value: &str| {
            let trimmed = value.trim();
            self.null_markers.iter().any(|m| m == trimmed)
        };
        let rows = dataset
            .rows()
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| cell.clone().filter(|value| !is_marker(value)))
                    .collect()
            })
            .collect();
        Dataset::new(dataset.columns().to_vec(), rows)
    }
}
