//! Column metadata reconciliation
//!
//! After each import the recorded columns of a (script, table) pair are
//! brought in line with the file that was just loaded: new columns are
//! recorded, known ones refreshed, vanished ones deleted. Primary-key flags,
//! references and type overrides belong to the user and are never touched.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::error::{PipelineError, PipelineResult};
use crate::catalog::Catalog;
use crate::models::{ColumnOverrides, ImportColumn, NewColumn};
use crate::staging::Dataset;
use crate::warehouse::Warehouse;

/// Detected type recorded when the warehouse does not report one
pub const UNKNOWN_TYPE: &str = "UNKNOWN";

/// When a known column's stored override name is rewritten
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverrideNamePolicy {
    /// Always store the final name when it differs from the original, and
    /// clear the override when it equals the original
    #[default]
    Always,
    /// Only write when the final name differs from the original; an
    /// override equal to the original is left as stored
    OnChange,
}

impl std::str::FromStr for OverrideNamePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "always" => Ok(Self::Always),
            "on-change" | "on_change" => Ok(Self::OnChange),
            _ => Err(format!("Invalid override name policy: {}", s)),
        }
    }
}

/// `[reconcile]` configuration section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    pub override_name_policy: OverrideNamePolicy,
}

/// What a reconciliation pass changed, by original column name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub added: Vec<String>,
    pub updated: Vec<String>,
    pub removed: Vec<String>,
    pub unchanged: usize,
}

impl ReconcileReport {
    /// Whether nothing was added, updated or removed
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

/// Keeps recorded column metadata in sync with imported files
#[derive(Debug, Clone, Default)]
pub struct ColumnReconciler {
    config: ReconcileConfig,
}

impl ColumnReconciler {
    pub fn new(config: ReconcileConfig) -> Self {
        Self { config }
    }

    /// Reconcile the recorded columns of `table` with `dataset`
    ///
    /// `table` must already be materialized: detected types are read back
    /// from it by final column name.
    pub fn reconcile(
        &self,
        catalog: &Catalog,
        warehouse: &dyn Warehouse,
        script_id: i64,
        table: &str,
        dataset: &Dataset,
    ) -> PipelineResult<ReconcileReport> {
        let stored_types = warehouse.column_types(table)?;
        if stored_types.is_empty() {
            return Err(PipelineError::schema(table, "table does not exist"));
        }
        let stored_types: HashMap<String, String> = stored_types.into_iter().collect();

        let existing = catalog.list_columns(script_id, table)?;
        let overrides = ColumnOverrides::from_columns(&existing);
        let known: HashMap<&str, &ImportColumn> = existing
            .iter()
            .map(|c| (c.column_name.as_str(), c))
            .collect();

        let originals = dataset.columns();
        let final_names = overrides.final_names(originals);
        let mut report = ReconcileReport::default();

        for (idx, original) in originals.iter().enumerate() {
            let final_name = &final_names[idx];
            let is_unique = dataset.is_column_unique(idx);
            let detected = stored_types
                .get(final_name)
                .map(String::as_str)
                .unwrap_or(UNKNOWN_TYPE);

            match known.get(original.as_str()) {
                None => {
                    let override_name = if final_name != original {
                        final_name.clone()
                    } else {
                        String::new()
                    };
                    catalog.insert_column(&NewColumn {
                        script_id,
                        table_name: table.to_string(),
                        column_name: original.clone(),
                        detected_data_type: Some(detected.to_string()),
                        override_column_name: override_name,
                        is_unique,
                    })?;
                    report.added.push(original.clone());
                }
                Some(column) => {
                    let override_name = self.override_name(column, original, final_name);
                    let changed = column.detected_data_type.as_deref() != Some(detected)
                        || column.is_unique != is_unique
                        || column.override_column_name != override_name;
                    if changed {
                        catalog.refresh_column(
                            column.id,
                            Some(detected),
                            is_unique,
                            &override_name,
                        )?;
                        report.updated.push(original.clone());
                    } else {
                        report.unchanged += 1;
                    }
                }
            }
        }

        let current: HashSet<&str> = originals.iter().map(String::as_str).collect();
        for column in &existing {
            if !current.contains(column.column_name.as_str()) {
                catalog.delete_column(column.id)?;
                report.removed.push(column.column_name.clone());
            }
        }

        debug!(
            table,
            added = ?report.added,
            updated = ?report.updated,
            removed = ?report.removed,
            "Column changes"
        );
        info!(
            table,
            added = report.added.len(),
            updated = report.updated.len(),
            removed = report.removed.len(),
            unchanged = report.unchanged,
            "Reconciled columns"
        );
        Ok(report)
    }

    fn override_name(&self, column: &ImportColumn, original: &str, final_name: &str) -> String {
        let differs = final_name != original;
        match self.config.override_name_policy {
            OverrideNamePolicy::Always => {
                if differs {
                    final_name.to_string()
                } else {
                    String::new()
                }
            }
            OverrideNamePolicy::OnChange => {
                if differs {
                    final_name.to_string()
                } else {
                    column.override_column_name.clone()
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::error::ErrorKind;
    use crate::inference::SemanticType;
    use crate::models::OverrideType;
    use crate::warehouse::{ColumnDef, DuckDbWarehouse, SqlValue};

    fn setup() -> (Catalog, DuckDbWarehouse) {
        let catalog = Catalog::memory().expect("catalog");
        catalog.init().expect("init");
        (catalog, DuckDbWarehouse::memory().expect("warehouse"))
    }

    fn dataset(columns: &[&str], rows: &[&[&str]]) -> Dataset {
        Dataset::new(
            columns.iter().map(|c| c.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|v| Some(v.to_string())).collect())
                .collect(),
        )
    }

    fn materialize(warehouse: &DuckDbWarehouse, columns: &[(&str, SemanticType)]) {
        let defs: Vec<ColumnDef> = columns
            .iter()
            .map(|(name, ty)| ColumnDef::new(*name, *ty))
            .collect();
        warehouse.drop_table("sales").expect("drop");
        warehouse.create_table("sales", &defs).expect("create");
        warehouse
            .insert_batch("sales", &defs, &[vec![SqlValue::Null; defs.len()]])
            .expect("insert");
    }

    #[test]
    fn test_first_run_adds_everything() {
        let (catalog, warehouse) = setup();
        materialize(
            &warehouse,
            &[("id", SemanticType::Integer), ("name", SemanticType::TEXT)],
        );
        let data = dataset(&["id", "name"], &[&["1", "a"], &["2", "a"]]);

        let report = ColumnReconciler::default()
            .reconcile(&catalog, &warehouse, 1, "sales", &data)
            .expect("reconcile");
        assert_eq!(report.added, vec!["id", "name"]);

        let columns = catalog.list_columns(1, "sales").expect("columns");
        assert_eq!(columns[0].detected_data_type.as_deref(), Some("INTEGER"));
        assert!(columns[0].is_unique);
        assert!(!columns[1].is_unique);
        assert_eq!(columns[1].detected_data_type.as_deref(), Some("VARCHAR"));
    }

    #[test]
    fn test_second_run_is_a_fixed_point() {
        let (catalog, warehouse) = setup();
        materialize(&warehouse, &[("id", SemanticType::Integer)]);
        let data = dataset(&["id"], &[&["1"], &["2"]]);
        let reconciler = ColumnReconciler::default();

        reconciler
            .reconcile(&catalog, &warehouse, 1, "sales", &data)
            .expect("first");
        let second = reconciler
            .reconcile(&catalog, &warehouse, 1, "sales", &data)
            .expect("second");
        assert!(second.is_noop());
        assert_eq!(second.unchanged, 1);
    }

    #[test]
    fn test_removed_and_updated_columns() {
        let (catalog, warehouse) = setup();
        let reconciler = ColumnReconciler::default();
        materialize(
            &warehouse,
            &[("id", SemanticType::Integer), ("old", SemanticType::TEXT)],
        );
        reconciler
            .reconcile(
                &catalog,
                &warehouse,
                1,
                "sales",
                &dataset(&["id", "old"], &[&["1", "x"]]),
            )
            .expect("first");

        materialize(&warehouse, &[("id", SemanticType::BigInt)]);
        let report = reconciler
            .reconcile(
                &catalog,
                &warehouse,
                1,
                "sales",
                &dataset(&["id"], &[&["1"]]),
            )
            .expect("second");
        assert_eq!(report.updated, vec!["id"]);
        assert_eq!(report.removed, vec!["old"]);

        let columns = catalog.list_columns(1, "sales").expect("columns");
        assert_eq!(columns.len(), 1);
        assert_eq!(columns[0].detected_data_type.as_deref(), Some("BIGINT"));
    }

    #[test]
    fn test_user_owned_fields_survive() {
        let (catalog, warehouse) = setup();
        let reconciler = ColumnReconciler::default();
        let data = dataset(&["amt"], &[&["1.5"]]);

        // Record "amt", then rename it to "amount" and flag it
        materialize(&warehouse, &[("amt", SemanticType::Decimal)]);
        reconciler
            .reconcile(&catalog, &warehouse, 1, "sales", &data)
            .expect("first");
        let column = catalog.list_columns(1, "sales").expect("columns").remove(0);
        catalog.set_override_name(column.id, "amount").expect("rename");
        catalog.set_primary_key(column.id, true).expect("pk");
        catalog
            .set_override_type(column.id, Some(OverrideType::Numeric))
            .expect("type");

        materialize(&warehouse, &[("amount", SemanticType::Decimal)]);
        let report = reconciler
            .reconcile(&catalog, &warehouse, 1, "sales", &data)
            .expect("second");
        assert!(report.is_noop());

        let column = catalog.require_column(column.id).expect("column");
        assert_eq!(column.override_column_name, "amount");
        assert!(column.primary_key);
        assert_eq!(column.override_data_type, Some(OverrideType::Numeric));
        assert_eq!(column.detected_data_type.as_deref(), Some("DOUBLE"));
    }

    #[test]
    fn test_override_policies_differ_on_identity_rename() {
        let (catalog, warehouse) = setup();
        materialize(&warehouse, &[("id", SemanticType::Integer)]);
        let data = dataset(&["id"], &[&["1"]]);

        ColumnReconciler::default()
            .reconcile(&catalog, &warehouse, 1, "sales", &data)
            .expect("first");
        let column = catalog.list_columns(1, "sales").expect("columns").remove(0);
        catalog.set_override_name(column.id, "id").expect("rename to itself");

        let on_change = ColumnReconciler::new(ReconcileConfig {
            override_name_policy: OverrideNamePolicy::OnChange,
        });
        assert!(
            on_change
                .reconcile(&catalog, &warehouse, 1, "sales", &data)
                .expect("on-change")
                .is_noop()
        );
        assert_eq!(
            catalog.require_column(column.id).expect("column").override_column_name,
            "id"
        );

        let report = ColumnReconciler::default()
            .reconcile(&catalog, &warehouse, 1, "sales", &data)
            .expect("always");
        assert_eq!(report.updated, vec!["id"]);
        assert_eq!(
            catalog.require_column(column.id).expect("column").override_column_name,
            ""
        );
    }

    #[test]
    fn test_missing_table_is_schema_error() {
        let (catalog, warehouse) = setup();
        let err = ColumnReconciler::default()
            .reconcile(&catalog, &warehouse, 1, "nope", &dataset(&["a"], &[]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
    }
}
