//! DuckDB warehouse
//!
//! DuckDB cannot drop or add most constraints on an existing table, so every
//! constraint change rebuilds the table: rows are stashed, the table is
//! recreated with the new constraint set, and the rows are copied back.
//! Declared constraints are tracked in a registry table because DuckDB does
//! not report constraint names. Tables holding a foreign key into a table
//! being rebuilt are detached first and re-attached afterwards, since DuckDB
//! refuses to drop a referenced table. Each public operation runs in one
//! transaction, so a failed rebuild leaves everything as it was.

use tracing::{debug, info};

use super::dialect::Dialect;
use super::error::{WarehouseError, WarehouseResult};
use super::value::SqlValue;
use super::{ColumnDef, ForeignKeyDef, Warehouse};

const REGISTRY_TABLE: &str = "__dataloom_constraints";

const REGISTRY_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS __dataloom_constraints (
    table_name VARCHAR NOT NULL,
    constraint_name VARCHAR NOT NULL,
    kind VARCHAR NOT NULL,
    columns VARCHAR NOT NULL,
    referenced_table VARCHAR,
    referenced_column VARCHAR
);
"#;

/// Chains of dependent tables longer than this are treated as cycles
const MAX_REBUILD_DEPTH: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConstraintKind {
    PrimaryKey,
    Unique,
    ForeignKey,
}

impl ConstraintKind {
    fn as_str(&self) -> &'static str {
        match self {
            ConstraintKind::PrimaryKey => "primary_key",
            ConstraintKind::Unique => "unique",
            ConstraintKind::ForeignKey => "foreign_key",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "primary_key" => Some(ConstraintKind::PrimaryKey),
            "unique" => Some(ConstraintKind::Unique),
            "foreign_key" => Some(ConstraintKind::ForeignKey),
            _ => None,
        }
    }
}

/// Named key over one or more columns
#[derive(Debug, Clone, PartialEq, Eq)]
struct KeyDef {
    name: String,
    columns: Vec<String>,
}

/// Every constraint declared on one table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct TableConstraints {
    primary_key: Option<KeyDef>,
    uniques: Vec<KeyDef>,
    foreign_keys: Vec<ForeignKeyDef>,
}

impl TableConstraints {
    fn clauses(&self) -> Vec<String> {
        let dialect = Dialect::DuckDb;
        let mut clauses = Vec::new();
        if let Some(pk) = &self.primary_key {
            clauses.push(dialect.primary_key_clause(&pk.columns));
        }
        for unique in &self.uniques {
            clauses.push(dialect.unique_clause(&unique.columns));
        }
        for fk in &self.foreign_keys {
            clauses.push(dialect.foreign_key_clause(fk));
        }
        clauses
    }

    fn has_key_on(&self, columns: &[String]) -> bool {
        self.primary_key
            .as_ref()
            .is_some_and(|pk| pk.columns == columns)
            || self.uniques.iter().any(|u| u.columns == columns)
    }
}

/// Embedded DuckDB warehouse
pub struct DuckDbWarehouse {
    conn: duckdb::Connection,
    path: Option<String>,
}

impl DuckDbWarehouse {
    /// Open or create a warehouse at the given path (`:memory:` for in-memory)
    pub fn open(path: &str) -> WarehouseResult<Self> {
        let (conn, path) = if path == ":memory:" {
            (duckdb::Connection::open_in_memory()?, None)
        } else {
            (duckdb::Connection::open(path)?, Some(path.to_string()))
        };
        conn.execute_batch(REGISTRY_DDL)?;
        Ok(Self { conn, path })
    }

    /// Open an in-memory warehouse (for testing)
    pub fn memory() -> WarehouseResult<Self> {
        Self::open(":memory:")
    }

    /// Get the database path (if not in-memory)
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    fn in_transaction<T>(&self, f: impl FnOnce() -> WarehouseResult<T>) -> WarehouseResult<T> {
        self.conn.execute_batch("BEGIN TRANSACTION")?;
        match f() {
            Ok(value) => {
                self.conn.execute_batch("COMMIT")?;
                Ok(value)
            }
            Err(e) => {
                // Keep the original error even if the rollback fails
                let _ = self.conn.execute_batch("ROLLBACK");
                Err(e)
            }
        }
    }

    fn require_table(&self, table: &str) -> WarehouseResult<Vec<(String, String)>> {
        let columns = self.column_types(table)?;
        if columns.is_empty() {
            return Err(WarehouseError::TableNotFound(table.to_string()));
        }
        Ok(columns)
    }

    fn require_columns(&self, table: &str, wanted: &[String]) -> WarehouseResult<()> {
        let columns = self.require_table(table)?;
        for column in wanted {
            if !columns.iter().any(|(name, _)| name == column) {
                return Err(WarehouseError::ColumnNotFound {
                    table: table.to_string(),
                    column: column.clone(),
                });
            }
        }
        Ok(())
    }

    fn load_constraints(&self, table: &str) -> WarehouseResult<TableConstraints> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT constraint_name, kind, columns, referenced_table, referenced_column
             FROM {REGISTRY_TABLE} WHERE table_name = ?1 ORDER BY rowid"
        ))?;
        let rows = stmt.query_map([table], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        })?;

        let mut constraints = TableConstraints::default();
        for row in rows {
            let (name, kind, columns, referenced_table, referenced_column) = row?;
            let corrupt = || {
                WarehouseError::Database(format!(
                    "corrupt constraint registry entry {} on {}",
                    name, table
                ))
            };
            let columns: Vec<String> = serde_json::from_str(&columns).map_err(|_| corrupt())?;
            match ConstraintKind::parse(&kind).ok_or_else(corrupt)? {
                ConstraintKind::PrimaryKey => {
                    constraints.primary_key = Some(KeyDef {
                        name: name.clone(),
                        columns,
                    })
                }
                ConstraintKind::Unique => constraints.uniques.push(KeyDef {
                    name: name.clone(),
                    columns,
                }),
                ConstraintKind::ForeignKey => {
                    let (Some(column), Some(referenced_table), Some(referenced_column)) =
                        (columns.into_iter().next(), referenced_table, referenced_column)
                    else {
                        return Err(corrupt());
                    };
                    constraints.foreign_keys.push(ForeignKeyDef {
                        name: name.clone(),
                        table: table.to_string(),
                        column,
                        referenced_table,
                        referenced_column,
                    });
                }
            }
        }
        Ok(constraints)
    }

    fn save_constraints(&self, table: &str, constraints: &TableConstraints) -> WarehouseResult<()> {
        self.conn.execute(
            &format!("DELETE FROM {REGISTRY_TABLE} WHERE table_name = ?1"),
            [table],
        )?;

        let mut stmt = self.conn.prepare(&format!(
            "INSERT INTO {REGISTRY_TABLE}
                 (table_name, constraint_name, kind, columns, referenced_table, referenced_column)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
        ))?;
        let encode = |columns: &[String]| {
            serde_json::to_string(columns).map_err(|e| WarehouseError::Database(e.to_string()))
        };

        if let Some(pk) = &constraints.primary_key {
            stmt.execute(duckdb::params![
                table,
                pk.name,
                ConstraintKind::PrimaryKey.as_str(),
                encode(&pk.columns)?,
                None::<String>,
                None::<String>
            ])?;
        }
        for unique in &constraints.uniques {
            stmt.execute(duckdb::params![
                table,
                unique.name,
                ConstraintKind::Unique.as_str(),
                encode(&unique.columns)?,
                None::<String>,
                None::<String>
            ])?;
        }
        for fk in &constraints.foreign_keys {
            stmt.execute(duckdb::params![
                table,
                fk.name,
                ConstraintKind::ForeignKey.as_str(),
                encode(std::slice::from_ref(&fk.column))?,
                fk.referenced_table,
                fk.referenced_column
            ])?;
        }
        Ok(())
    }

    /// Tables (other than `table` itself) holding a foreign key into `table`
    fn dependents(&self, table: &str) -> WarehouseResult<Vec<String>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT DISTINCT table_name FROM {REGISTRY_TABLE}
             WHERE kind = 'foreign_key' AND referenced_table = ?1 AND table_name <> ?1
             ORDER BY table_name"
        ))?;
        let rows = stmt.query_map([table], |row| row.get(0))?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    /// Recreate `table` with `constraints`, detaching and re-attaching dependents
    fn rebuild(&self, table: &str, constraints: &TableConstraints, depth: usize) -> WarehouseResult<()> {
        if depth > MAX_REBUILD_DEPTH {
            return Err(WarehouseError::constraint(
                table,
                "foreign key chain too deep to rebuild (cyclic references?)",
            ));
        }

        let mut detached = Vec::new();
        for dependent in self.dependents(table)? {
            let original = self.load_constraints(&dependent)?;
            let mut without = original.clone();
            without.foreign_keys.retain(|fk| fk.referenced_table != table);
            self.rebuild(&dependent, &without, depth + 1)?;
            detached.push((dependent, original));
        }

        self.recreate(table, constraints)?;

        for (dependent, original) in detached {
            self.rebuild(&dependent, &original, depth + 1)?;
        }
        Ok(())
    }

    /// Stash rows, recreate the table with new constraints, restore rows
    fn recreate(&self, table: &str, constraints: &TableConstraints) -> WarehouseResult<()> {
        let dialect = Dialect::DuckDb;
        let columns = self.require_table(table)?;
        let quoted = dialect.quote_ident(table);
        let stash = dialect.quote_ident(&format!("__dataloom_stash_{}", table));
        let create = dialect.create_table_sql(table, &columns, &constraints.clauses());

        self.conn.execute_batch(&format!(
            "CREATE TABLE {stash} AS SELECT * FROM {quoted};
             DROP TABLE {quoted};
             {create};
             INSERT INTO {quoted} SELECT * FROM {stash};
             DROP TABLE {stash};"
        ))?;
        self.save_constraints(table, constraints)?;

        debug!(
            table,
            constraints = constraints.clauses().len(),
            "Rebuilt table with new constraints"
        );
        Ok(())
    }
}

impl Warehouse for DuckDbWarehouse {
    fn dialect(&self) -> Dialect {
        Dialect::DuckDb
    }

    fn table_exists(&self, table: &str) -> WarehouseResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM information_schema.tables
             WHERE table_schema = 'main' AND table_name = ?1",
            [table],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn drop_table(&self, table: &str) -> WarehouseResult<()> {
        self.in_transaction(|| {
            if self.table_exists(table)? {
                for dependent in self.dependents(table)? {
                    let mut constraints = self.load_constraints(&dependent)?;
                    constraints
                        .foreign_keys
                        .retain(|fk| fk.referenced_table != table);
                    self.rebuild(&dependent, &constraints, 1)?;
                }
                self.conn
                    .execute_batch(&format!("DROP TABLE {}", Dialect::DuckDb.quote_ident(table)))?;
                debug!(table, "Dropped table");
            }
            self.conn.execute(
                &format!("DELETE FROM {REGISTRY_TABLE} WHERE table_name = ?1"),
                [table],
            )?;
            Ok(())
        })
    }

    fn create_table(&self, table: &str, columns: &[ColumnDef]) -> WarehouseResult<()> {
        let dialect = Dialect::DuckDb;
        let typed: Vec<(String, String)> = columns
            .iter()
            .map(|c| (c.name.clone(), dialect.sql_type(c.semantic_type).to_string()))
            .collect();
        self.in_transaction(|| {
            self.conn
                .execute_batch(&dialect.create_table_sql(table, &typed, &[]))?;
            self.save_constraints(table, &TableConstraints::default())
        })
    }

    fn insert_batch(
        &self,
        table: &str,
        columns: &[ColumnDef],
        rows: &[Vec<SqlValue>],
    ) -> WarehouseResult<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        let names: Vec<String> = columns.iter().map(|c| c.name.clone()).collect();
        let sql = Dialect::DuckDb.insert_sql(table, &names);

        self.in_transaction(|| {
            let mut stmt = self.conn.prepare(&sql)?;
            let mut written = 0;
            for row in rows {
                written += stmt.execute(duckdb::params_from_iter(row.iter()))?;
            }
            Ok(written)
        })
    }

    fn row_count(&self, table: &str) -> WarehouseResult<u64> {
        if !self.table_exists(table)? {
            return Err(WarehouseError::TableNotFound(table.to_string()));
        }
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", Dialect::DuckDb.quote_ident(table)),
            [],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }

    fn column_types(&self, table: &str) -> WarehouseResult<Vec<(String, String)>> {
        let mut stmt = self.conn.prepare(
            "SELECT column_name, data_type FROM information_schema.columns
             WHERE table_schema = 'main' AND table_name = ?1
             ORDER BY ordinal_position",
        )?;
        let rows = stmt.query_map([table], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut columns = Vec::new();
        for row in rows {
            let (name, data_type) = row?;
            columns.push((name, data_type.to_uppercase()));
        }
        Ok(columns)
    }

    fn primary_key(&self, table: &str) -> WarehouseResult<Option<Vec<String>>> {
        Ok(self.load_constraints(table)?.primary_key.map(|pk| pk.columns))
    }

    fn drop_primary_key(&self, table: &str) -> WarehouseResult<bool> {
        let mut constraints = self.load_constraints(table)?;
        let Some(pk) = constraints.primary_key.take() else {
            return Ok(false);
        };
        self.require_table(table)?;

        let depends_on_pk = |fk: &ForeignKeyDef| {
            fk.referenced_table == table
                && pk.columns.len() == 1
                && pk.columns[0] == fk.referenced_column
                && !constraints_has_unique(&constraints, &fk.referenced_column)
        };

        self.in_transaction(|| {
            for dependent in self.dependents(table)? {
                let mut dep_constraints = self.load_constraints(&dependent)?;
                let before = dep_constraints.foreign_keys.len();
                dep_constraints.foreign_keys.retain(|fk| !depends_on_pk(fk));
                if dep_constraints.foreign_keys.len() != before {
                    info!(table = %dependent, referenced = table, "Dropping foreign keys that depend on primary key");
                    self.rebuild(&dependent, &dep_constraints, 1)?;
                }
            }

            let mut own = constraints.clone();
            own.foreign_keys.retain(|fk| !depends_on_pk(fk));
            self.rebuild(table, &own, 0)
        })
        .map_err(|e| into_constraint_error(e, &pk.name))?;

        debug!(table, name = %pk.name, "Dropped primary key");
        Ok(true)
    }

    fn add_primary_key(&self, table: &str, columns: &[String]) -> WarehouseResult<()> {
        self.require_columns(table, columns)?;
        let name = format!("pk_{}", table);
        let mut constraints = self.load_constraints(table)?;
        constraints.primary_key = Some(KeyDef {
            name: name.clone(),
            columns: columns.to_vec(),
        });
        constraints.uniques.retain(|u| u.columns != columns);

        self.in_transaction(|| self.rebuild(table, &constraints, 0))
            .map_err(|e| into_constraint_error(e, &name))
    }

    fn foreign_key_exists(&self, table: &str, name: &str) -> WarehouseResult<bool> {
        Ok(self
            .load_constraints(table)?
            .foreign_keys
            .iter()
            .any(|fk| fk.name == name))
    }

    fn drop_foreign_key(&self, table: &str, name: &str) -> WarehouseResult<bool> {
        let mut constraints = self.load_constraints(table)?;
        let before = constraints.foreign_keys.len();
        constraints.foreign_keys.retain(|fk| fk.name != name);
        if constraints.foreign_keys.len() == before {
            return Ok(false);
        }
        self.in_transaction(|| self.rebuild(table, &constraints, 0))
            .map_err(|e| into_constraint_error(e, name))?;
        Ok(true)
    }

    fn add_foreign_key(&self, fk: &ForeignKeyDef) -> WarehouseResult<()> {
        self.require_columns(&fk.table, std::slice::from_ref(&fk.column))?;
        self.require_columns(
            &fk.referenced_table,
            std::slice::from_ref(&fk.referenced_column),
        )?;

        self.in_transaction(|| {
            let key = vec![fk.referenced_column.clone()];
            let mut referenced = self.load_constraints(&fk.referenced_table)?;
            if !referenced.has_key_on(&key) {
                referenced.uniques.push(KeyDef {
                    name: format!("uq_{}_{}", fk.referenced_table, fk.referenced_column),
                    columns: key,
                });
                self.rebuild(&fk.referenced_table, &referenced, 0)?;
            }

            let mut own = self.load_constraints(&fk.table)?;
            own.foreign_keys.retain(|existing| existing.name != fk.name);
            own.foreign_keys.push(fk.clone());
            self.rebuild(&fk.table, &own, 0)
        })
        .map_err(|e| into_constraint_error(e, &fk.name))?;

        debug!(name = %fk.name, table = %fk.table, "Added foreign key");
        Ok(())
    }

    fn execute_script(&self, sql: &str) -> WarehouseResult<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }
}

fn constraints_has_unique(constraints: &TableConstraints, column: &str) -> bool {
    constraints
        .uniques
        .iter()
        .any(|u| u.columns.len() == 1 && u.columns[0] == column)
}

/// Database failures during a constraint change become constraint errors
fn into_constraint_error(err: WarehouseError, name: &str) -> WarehouseError {
    match err {
        WarehouseError::Database(message) => WarehouseError::constraint(name, message),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::SemanticType;

    fn warehouse_with(table: &str, rows: &[(i64, &str)]) -> DuckDbWarehouse {
        let warehouse = DuckDbWarehouse::memory().expect("open warehouse");
        add_table(&warehouse, table, rows);
        warehouse
    }

    fn add_table(warehouse: &DuckDbWarehouse, table: &str, rows: &[(i64, &str)]) {
        let columns = vec![
            ColumnDef::new("id", SemanticType::Integer),
            ColumnDef::new("name", SemanticType::TEXT),
        ];
        warehouse.create_table(table, &columns).expect("create");
        let values: Vec<Vec<SqlValue>> = rows
            .iter()
            .map(|(id, name)| vec![SqlValue::Integer(*id), SqlValue::Text(name.to_string())])
            .collect();
        warehouse
            .insert_batch(table, &columns, &values)
            .expect("insert");
    }

    fn fk(table: &str, column: &str, referenced_table: &str, referenced_column: &str) -> ForeignKeyDef {
        ForeignKeyDef {
            name: format!("fk_{}_{}", table, column),
            table: table.to_string(),
            column: column.to_string(),
            referenced_table: referenced_table.to_string(),
            referenced_column: referenced_column.to_string(),
        }
    }

    #[test]
    fn test_create_insert_count() {
        let warehouse = warehouse_with("people", &[(1, "a"), (2, "b")]);
        assert!(warehouse.table_exists("people").expect("exists"));
        assert_eq!(warehouse.row_count("people").expect("count"), 2);
        assert_eq!(
            warehouse.column_types("people").expect("types"),
            vec![
                ("id".to_string(), "INTEGER".to_string()),
                ("name".to_string(), "VARCHAR".to_string())
            ]
        );
    }

    #[test]
    fn test_row_count_missing_table() {
        let warehouse = DuckDbWarehouse::memory().expect("open warehouse");
        assert!(matches!(
            warehouse.row_count("nope"),
            Err(WarehouseError::TableNotFound(_))
        ));
    }

    #[test]
    fn test_primary_key_replace_is_idempotent() {
        let warehouse = warehouse_with("people", &[(1, "a"), (2, "b")]);
        let key = vec!["id".to_string()];

        for _ in 0..2 {
            warehouse.drop_primary_key("people").expect("drop");
            warehouse.add_primary_key("people", &key).expect("add");
        }
        assert_eq!(warehouse.primary_key("people").expect("pk"), Some(key));
        assert_eq!(warehouse.row_count("people").expect("count"), 2);
    }

    #[test]
    fn test_primary_key_violation_keeps_table() {
        let warehouse = warehouse_with("people", &[(1, "a"), (1, "b")]);
        let err = warehouse
            .add_primary_key("people", &["id".to_string()])
            .unwrap_err();
        assert!(matches!(err, WarehouseError::Constraint { .. }));
        assert_eq!(warehouse.primary_key("people").expect("pk"), None);
        assert_eq!(warehouse.row_count("people").expect("count"), 2);
    }

    #[test]
    fn test_missing_primary_key_column() {
        let warehouse = warehouse_with("people", &[(1, "a")]);
        let err = warehouse
            .add_primary_key("people", &["nope".to_string()])
            .unwrap_err();
        assert!(matches!(err, WarehouseError::ColumnNotFound { .. }));
    }

    #[test]
    fn test_foreign_key_survives_parent_rebuild() {
        let warehouse = warehouse_with("customers", &[(1, "a"), (2, "b")]);
        add_table(&warehouse, "orders", &[(1, "x")]);
        warehouse
            .add_primary_key("customers", &["id".to_string()])
            .expect("pk");
        let key = fk("orders", "id", "customers", "id");
        warehouse.add_foreign_key(&key).expect("fk");
        assert!(warehouse.foreign_key_exists("orders", &key.name).expect("exists"));

        // Rebuilding the parent keeps the child's key
        warehouse
            .add_primary_key("customers", &["id".to_string()])
            .expect("pk again");
        assert!(warehouse.foreign_key_exists("orders", &key.name).expect("exists"));
        assert_eq!(warehouse.row_count("orders").expect("count"), 1);
    }

    #[test]
    fn test_dropping_primary_key_drops_dependent_foreign_keys() {
        let warehouse = warehouse_with("customers", &[(1, "a")]);
        add_table(&warehouse, "orders", &[(1, "x")]);
        warehouse
            .add_primary_key("customers", &["id".to_string()])
            .expect("pk");
        let key = fk("orders", "id", "customers", "id");
        warehouse.add_foreign_key(&key).expect("fk");

        assert!(warehouse.drop_primary_key("customers").expect("drop"));
        assert!(!warehouse.foreign_key_exists("orders", &key.name).expect("exists"));
        assert!(!warehouse.drop_primary_key("customers").expect("drop again"));
    }

    #[test]
    fn test_foreign_key_to_unique_column() {
        let warehouse = warehouse_with("customers", &[(1, "a"), (2, "b")]);
        add_table(&warehouse, "orders", &[(7, "b")]);
        let key = fk("orders", "name", "customers", "name");
        warehouse.add_foreign_key(&key).expect("fk");
        assert!(warehouse.foreign_key_exists("orders", &key.name).expect("exists"));
        assert!(warehouse.drop_foreign_key("orders", &key.name).expect("drop"));
        assert!(!warehouse.drop_foreign_key("orders", &key.name).expect("drop again"));
    }

    #[test]
    fn test_foreign_key_violation() {
        let warehouse = warehouse_with("customers", &[(1, "a")]);
        add_table(&warehouse, "orders", &[(9, "x")]);
        let err = warehouse
            .add_foreign_key(&fk("orders", "id", "customers", "id"))
            .unwrap_err();
        assert!(matches!(err, WarehouseError::Constraint { .. }));
        assert_eq!(warehouse.row_count("orders").expect("count"), 1);
    }

    #[test]
    fn test_drop_referenced_table() {
        let warehouse = warehouse_with("customers", &[(1, "a")]);
        add_table(&warehouse, "orders", &[(1, "x")]);
        let key = fk("orders", "id", "customers", "id");
        warehouse.add_foreign_key(&key).expect("fk");

        warehouse.drop_table("customers").expect("drop");
        assert!(!warehouse.table_exists("customers").expect("exists"));
        assert!(!warehouse.foreign_key_exists("orders", &key.name).expect("exists"));
        assert_eq!(warehouse.row_count("orders").expect("count"), 1);
    }

    #[test]
    fn test_execute_script() {
        let warehouse = warehouse_with("people", &[(1, "a"), (2, "b")]);
        warehouse
            .execute_script("DELETE FROM people WHERE id = 2")
            .expect("script");
        assert_eq!(warehouse.row_count("people").expect("count"), 1);
    }
}
