//! DuckDB-backed catalog of jobs, scripts, tables and columns

#![allow(clippy::type_complexity)]

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::error::{CatalogError, CatalogResult};
use super::schema::{CatalogSchema, SCHEMA_VERSION};
use crate::models::{
    ExecutionLedger, ImportColumn, ImportTable, Job, NewColumn, NewJob, NewScript, OverrideType,
    Script,
};
use crate::scheduler::{DaySet, Schedule};

const JOB_COLUMNS: &str = "id, name, description, schedule_time, schedule_days, created_at, \
     updated_at, last_execution_time, last_execution_success, last_execution_error, \
     last_execution_duration_ms";

const SCRIPT_COLUMNS: &str = "id, job_id, name, content, order_exec, table_name, import_enabled";

const TABLE_COLUMNS: &str = "id, script_id, table_name, last_import, row_count, row_count_prev, \
     run_transform, transform_script";

const COLUMN_COLUMNS: &str = "id, script_id, table_name, column_name, detected_data_type, \
     override_data_type, override_column_name, primary_key, is_unique, foreign_key_reference";

/// Persistent store for job configuration and import metadata
pub struct Catalog {
    conn: duckdb::Connection,
    path: Option<String>,
}

impl Catalog {
    /// Open or create a catalog at the given path (`:memory:` for an in-memory catalog)
    pub fn open(path: &str) -> CatalogResult<Self> {
        if path == ":memory:" {
            return Self::memory();
        }
        let conn = duckdb::Connection::open(path)?;
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory catalog (for testing)
    pub fn memory() -> CatalogResult<Self> {
        let conn = duckdb::Connection::open_in_memory()?;
        Ok(Self { conn, path: None })
    }

    /// Get the database path (if not in-memory)
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Initialize the catalog schema
    pub fn init(&self) -> CatalogResult<()> {
        self.conn.execute_batch(CatalogSchema::create_tables_duckdb())?;

        self.conn.execute(
            "INSERT INTO schema_info (key, value) VALUES ('version', ?1)
             ON CONFLICT (key) DO UPDATE SET value = ?1",
            [SCHEMA_VERSION.to_string()],
        )?;

        Ok(())
    }

    /// Check if the catalog is initialized
    pub fn is_initialized(&self) -> CatalogResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = 'import_columns'",
            [],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Get the schema version
    pub fn schema_version(&self) -> CatalogResult<i32> {
        let version: String =
            self.conn
                .query_row(CatalogSchema::select_schema_version(), [], |row| row.get(0))?;
        version.parse().map_err(|_| CatalogError::Corrupt {
            field: "schema_info.version",
            value: version,
        })
    }

    /// Fail unless the catalog is initialized at the current schema version
    pub fn ensure_ready(&self) -> CatalogResult<()> {
        if !self.is_initialized()? {
            return Err(CatalogError::NotInitialized);
        }
        let found = self.schema_version()?;
        if found != SCHEMA_VERSION {
            return Err(CatalogError::SchemaVersionMismatch {
                expected: SCHEMA_VERSION,
                found,
            });
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Jobs
    // ------------------------------------------------------------------

    /// Create a job
    pub fn create_job(&self, job: &NewJob) -> CatalogResult<Job> {
        if self.find_job(&job.name)?.is_some() {
            return Err(CatalogError::Duplicate {
                entity: "job",
                key: job.name.clone(),
            });
        }

        let id = self.next_id("jobs_id_seq")?;
        let now = Utc::now().to_rfc3339();
        let (schedule_time, schedule_days) = schedule_columns(job.schedule.as_ref());
        self.conn.execute(
            "INSERT INTO jobs (id, name, description, schedule_time, schedule_days, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            duckdb::params![id, job.name, job.description, schedule_time, schedule_days, now],
        )?;

        info!(job_id = id, name = %job.name, "Created job");
        self.require_job(id)
    }

    /// Get a job by id
    pub fn get_job(&self, id: i64) -> CatalogResult<Option<Job>> {
        let sql = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = ?1");
        Ok(self.query_jobs(&sql, [id])?.into_iter().next())
    }

    /// Get a job by id, failing if it does not exist
    pub fn require_job(&self, id: i64) -> CatalogResult<Job> {
        self.get_job(id)?
            .ok_or_else(|| CatalogError::not_found("job", id))
    }

    /// Find a job by name
    pub fn find_job(&self, name: &str) -> CatalogResult<Option<Job>> {
        let sql = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE name = ?1");
        Ok(self.query_jobs(&sql, [name])?.into_iter().next())
    }

    /// List all jobs by name
    pub fn list_jobs(&self) -> CatalogResult<Vec<Job>> {
        let sql = format!("SELECT {JOB_COLUMNS} FROM jobs ORDER BY name");
        self.query_jobs(&sql, [])
    }

    /// Update a job's description and schedule
    pub fn update_job(
        &self,
        id: i64,
        description: Option<&str>,
        schedule: Option<&Schedule>,
    ) -> CatalogResult<Job> {
        let (schedule_time, schedule_days) = schedule_columns(schedule);
        let updated = self.conn.execute(
            "UPDATE jobs SET description = ?1, schedule_time = ?2, schedule_days = ?3, updated_at = ?4
             WHERE id = ?5",
            duckdb::params![description, schedule_time, schedule_days, Utc::now().to_rfc3339(), id],
        )?;
        if updated == 0 {
            return Err(CatalogError::not_found("job", id));
        }
        self.require_job(id)
    }

    /// Write the execution ledger of a job
    pub fn record_execution(&self, job_id: i64, ledger: &ExecutionLedger) -> CatalogResult<()> {
        let updated = self.conn.execute(
            "UPDATE jobs SET last_execution_time = ?1, last_execution_success = ?2,
                 last_execution_error = ?3, last_execution_duration_ms = ?4, updated_at = ?5
             WHERE id = ?6",
            duckdb::params![
                ledger.last_execution_time.map(|t| t.to_rfc3339()),
                ledger.last_execution_success,
                ledger.last_execution_error,
                ledger.last_execution_duration_ms,
                Utc::now().to_rfc3339(),
                job_id
            ],
        )?;
        if updated == 0 {
            return Err(CatalogError::not_found("job", job_id));
        }
        debug!(job_id, success = ?ledger.last_execution_success, "Recorded execution");
        Ok(())
    }

    /// Delete a job and everything its scripts own
    pub fn delete_job(&self, id: i64) -> CatalogResult<bool> {
        self.in_transaction(|catalog| {
            for script in catalog.list_scripts(id)? {
                catalog.delete_script_rows(script.id)?;
            }
            let deleted = catalog.conn.execute("DELETE FROM jobs WHERE id = ?1", [id])?;
            Ok(deleted > 0)
        })
    }

    // ------------------------------------------------------------------
    // Scripts
    // ------------------------------------------------------------------

    /// Add a script to a job
    pub fn add_script(&self, job_id: i64, script: &NewScript) -> CatalogResult<Script> {
        self.require_job(job_id)?;
        if self.find_script(job_id, &script.name)?.is_some() {
            return Err(CatalogError::Duplicate {
                entity: "script",
                key: script.name.clone(),
            });
        }

        let order = match script.order_exec {
            Some(order) => order,
            None => {
                let max: Option<i32> = self.conn.query_row(
                    "SELECT MAX(order_exec) FROM scripts WHERE job_id = ?1",
                    [job_id],
                    |row| row.get(0),
                )?;
                max.unwrap_or(0) + 1
            }
        };

        let id = self.next_id("scripts_id_seq")?;
        self.conn.execute(
            "INSERT INTO scripts (id, job_id, name, content, order_exec, table_name, import_enabled)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            duckdb::params![
                id,
                job_id,
                script.name,
                script.content,
                order,
                script.table_name,
                script.import_enabled
            ],
        )?;

        debug!(job_id, script_id = id, name = %script.name, order, "Added script");
        self.require_script(id)
    }

    /// Get a script by id
    pub fn get_script(&self, id: i64) -> CatalogResult<Option<Script>> {
        let sql = format!("SELECT {SCRIPT_COLUMNS} FROM scripts WHERE id = ?1");
        Ok(self.query_scripts(&sql, [id])?.into_iter().next())
    }

    /// Get a script by id, failing if it does not exist
    pub fn require_script(&self, id: i64) -> CatalogResult<Script> {
        self.get_script(id)?
            .ok_or_else(|| CatalogError::not_found("script", id))
    }

    /// Find a script of a job by name
    pub fn find_script(&self, job_id: i64, name: &str) -> CatalogResult<Option<Script>> {
        let sql = format!("SELECT {SCRIPT_COLUMNS} FROM scripts WHERE job_id = ?1 AND name = ?2");
        Ok(self
            .query_scripts(&sql, duckdb::params![job_id, name])?
            .into_iter()
            .next())
    }

    /// List a job's scripts in execution order
    pub fn list_scripts(&self, job_id: i64) -> CatalogResult<Vec<Script>> {
        let sql = format!(
            "SELECT {SCRIPT_COLUMNS} FROM scripts WHERE job_id = ?1 ORDER BY order_exec, id"
        );
        self.query_scripts(&sql, [job_id])
    }

    /// Save a script's editable fields
    pub fn update_script(&self, script: &Script) -> CatalogResult<()> {
        let updated = self.conn.execute(
            "UPDATE scripts SET content = ?1, order_exec = ?2, table_name = ?3, import_enabled = ?4
             WHERE id = ?5",
            duckdb::params![
                script.content,
                script.order_exec,
                script.table_name,
                script.import_enabled,
                script.id
            ],
        )?;
        if updated == 0 {
            return Err(CatalogError::not_found("script", script.id));
        }
        Ok(())
    }

    /// Delete a script with its tables and columns
    pub fn delete_script(&self, id: i64) -> CatalogResult<bool> {
        self.in_transaction(|catalog| catalog.delete_script_rows(id))
    }

    /// Renumber a job's scripts 1..N, keeping their relative order
    ///
    /// Ties on `order_exec` are broken by id. Returns whether anything changed.
    pub fn reorder_scripts(&self, job_id: i64) -> CatalogResult<bool> {
        self.in_transaction(|catalog| {
            let mut changed = false;
            for (idx, script) in catalog.list_scripts(job_id)?.iter().enumerate() {
                let expected = idx as i32 + 1;
                if script.order_exec != expected {
                    catalog.conn.execute(
                        "UPDATE scripts SET order_exec = ?1 WHERE id = ?2",
                        duckdb::params![expected, script.id],
                    )?;
                    changed = true;
                }
            }
            if changed {
                info!(job_id, "Renumbered scripts");
            }
            Ok(changed)
        })
    }

    // ------------------------------------------------------------------
    // Tables
    // ------------------------------------------------------------------

    /// Get the table record of a script
    pub fn get_table(&self, script_id: i64, table_name: &str) -> CatalogResult<Option<ImportTable>> {
        let sql = format!(
            "SELECT {TABLE_COLUMNS} FROM import_tables WHERE script_id = ?1 AND table_name = ?2"
        );
        Ok(self
            .query_tables(&sql, duckdb::params![script_id, table_name])?
            .into_iter()
            .next())
    }

    /// Get the table record of a script, creating it if needed
    pub fn get_or_create_table(&self, script_id: i64, table_name: &str) -> CatalogResult<ImportTable> {
        if let Some(table) = self.get_table(script_id, table_name)? {
            return Ok(table);
        }
        let id = self.next_id("import_tables_id_seq")?;
        self.conn.execute(
            "INSERT INTO import_tables (id, script_id, table_name) VALUES (?1, ?2, ?3)",
            duckdb::params![id, script_id, table_name],
        )?;
        self.get_table(script_id, table_name)?
            .ok_or_else(|| CatalogError::not_found("table", table_name))
    }

    /// List the table records of a script
    pub fn list_tables(&self, script_id: i64) -> CatalogResult<Vec<ImportTable>> {
        let sql =
            format!("SELECT {TABLE_COLUMNS} FROM import_tables WHERE script_id = ?1 ORDER BY id");
        self.query_tables(&sql, [script_id])
    }

    /// Save a table record
    pub fn update_table(&self, table: &ImportTable) -> CatalogResult<()> {
        let updated = self.conn.execute(
            "UPDATE import_tables SET last_import = ?1, row_count = ?2, row_count_prev = ?3,
                 run_transform = ?4, transform_script = ?5
             WHERE id = ?6",
            duckdb::params![
                table.last_import.map(|t| t.to_rfc3339()),
                table.row_count,
                table.row_count_prev,
                table.run_transform,
                table.transform_script,
                table.id
            ],
        )?;
        if updated == 0 {
            return Err(CatalogError::not_found("table", table.id));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Columns
    // ------------------------------------------------------------------

    /// List the columns recorded for a script's table, in creation order
    pub fn list_columns(&self, script_id: i64, table_name: &str) -> CatalogResult<Vec<ImportColumn>> {
        let sql = format!(
            "SELECT {COLUMN_COLUMNS} FROM import_columns
             WHERE script_id = ?1 AND table_name = ?2 ORDER BY id"
        );
        self.query_columns(&sql, duckdb::params![script_id, table_name])
    }

    /// Get a column by id
    pub fn get_column(&self, id: i64) -> CatalogResult<Option<ImportColumn>> {
        let sql = format!("SELECT {COLUMN_COLUMNS} FROM import_columns WHERE id = ?1");
        Ok(self.query_columns(&sql, [id])?.into_iter().next())
    }

    /// Get a column by id, failing if it does not exist
    pub fn require_column(&self, id: i64) -> CatalogResult<ImportColumn> {
        self.get_column(id)?
            .ok_or_else(|| CatalogError::not_found("column", id))
    }

    /// Find a column of a script's table by original name
    pub fn find_column(
        &self,
        script_id: i64,
        table_name: &str,
        column_name: &str,
    ) -> CatalogResult<Option<ImportColumn>> {
        let sql = format!(
            "SELECT {COLUMN_COLUMNS} FROM import_columns
             WHERE script_id = ?1 AND table_name = ?2 AND column_name = ?3"
        );
        Ok(self
            .query_columns(&sql, duckdb::params![script_id, table_name, column_name])?
            .into_iter()
            .next())
    }

    /// Find a column by table and warehouse name, across all scripts
    ///
    /// Matches the final (override-applied) name first, then the original
    /// name. The oldest match wins.
    pub fn find_column_by_table(
        &self,
        table_name: &str,
        column_name: &str,
    ) -> CatalogResult<Option<ImportColumn>> {
        let sql = format!(
            "SELECT {COLUMN_COLUMNS} FROM import_columns
             WHERE table_name = ?1 AND (override_column_name = ?2
                 OR (override_column_name = '' AND column_name = ?2))
             ORDER BY id"
        );
        Ok(self
            .query_columns(&sql, duckdb::params![table_name, column_name])?
            .into_iter()
            .next())
    }

    /// Record a new column
    pub fn insert_column(&self, column: &NewColumn) -> CatalogResult<ImportColumn> {
        if self
            .find_column(column.script_id, &column.table_name, &column.column_name)?
            .is_some()
        {
            return Err(CatalogError::Duplicate {
                entity: "column",
                key: format!("{}.{}", column.table_name, column.column_name),
            });
        }

        let id = self.next_id("import_columns_id_seq")?;
        self.conn.execute(
            "INSERT INTO import_columns
                 (id, script_id, table_name, column_name, detected_data_type, override_column_name, is_unique)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            duckdb::params![
                id,
                column.script_id,
                column.table_name,
                column.column_name,
                column.detected_data_type,
                column.override_column_name,
                column.is_unique
            ],
        )?;
        self.require_column(id)
    }

    /// Save a column's mutable fields
    ///
    /// The reference, if any, is validated first.
    pub fn update_column(&self, column: &ImportColumn) -> CatalogResult<()> {
        if let Some(target) = column.foreign_key_reference {
            self.validate_reference(column.id, target)?;
        }
        let updated = self.conn.execute(
            "UPDATE import_columns SET detected_data_type = ?1, override_data_type = ?2,
                 override_column_name = ?3, primary_key = ?4, is_unique = ?5, foreign_key_reference = ?6
             WHERE id = ?7",
            duckdb::params![
                column.detected_data_type,
                column.override_data_type.map(|t| t.code()),
                column.override_column_name,
                column.primary_key,
                column.is_unique,
                column.foreign_key_reference,
                column.id
            ],
        )?;
        if updated == 0 {
            return Err(CatalogError::not_found("column", column.id));
        }
        Ok(())
    }

    /// Save only the fields derived from imported data
    ///
    /// Keys, references and type overrides are left as they are.
    pub fn refresh_column(
        &self,
        id: i64,
        detected_data_type: Option<&str>,
        is_unique: bool,
        override_column_name: &str,
    ) -> CatalogResult<()> {
        let updated = self.conn.execute(
            "UPDATE import_columns SET detected_data_type = ?1, is_unique = ?2, override_column_name = ?3
             WHERE id = ?4",
            duckdb::params![detected_data_type, is_unique, override_column_name, id],
        )?;
        if updated == 0 {
            return Err(CatalogError::not_found("column", id));
        }
        Ok(())
    }

    /// Delete a column, clearing every reference that points at it
    pub fn delete_column(&self, id: i64) -> CatalogResult<bool> {
        self.in_transaction(|catalog| catalog.delete_column_row(id))
    }

    /// Set or clear a column's manual rename
    pub fn set_override_name(&self, id: i64, name: &str) -> CatalogResult<ImportColumn> {
        let mut column = self.require_column(id)?;
        column.override_column_name = name.trim().to_string();
        self.update_column(&column)?;
        Ok(column)
    }

    /// Set or clear a column's manual type
    pub fn set_override_type(&self, id: i64, ty: Option<OverrideType>) -> CatalogResult<ImportColumn> {
        let mut column = self.require_column(id)?;
        column.override_data_type = ty;
        self.update_column(&column)?;
        Ok(column)
    }

    /// Flag or unflag a column as part of its table's primary key
    pub fn set_primary_key(&self, id: i64, primary_key: bool) -> CatalogResult<ImportColumn> {
        let mut column = self.require_column(id)?;
        column.primary_key = primary_key;
        self.update_column(&column)?;
        Ok(column)
    }

    /// Point a column at another column, or clear the reference
    pub fn set_reference(&self, id: i64, target: Option<i64>) -> CatalogResult<ImportColumn> {
        let mut column = self.require_column(id)?;
        column.foreign_key_reference = target;
        self.update_column(&column)?;
        Ok(column)
    }

    /// Every (referencing, referenced) column pair, in creation order
    pub fn foreign_key_pairs(&self) -> CatalogResult<Vec<(ImportColumn, ImportColumn)>> {
        let sql = format!(
            "SELECT {COLUMN_COLUMNS} FROM import_columns
             WHERE foreign_key_reference IS NOT NULL ORDER BY id"
        );
        let mut pairs = Vec::new();
        for column in self.query_columns(&sql, [])? {
            let Some(target_id) = column.foreign_key_reference else {
                continue;
            };
            let target = self.require_column(target_id)?;
            pairs.push((column, target));
        }
        Ok(pairs)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn validate_reference(&self, column_id: i64, target_id: i64) -> CatalogResult<()> {
        if column_id == target_id {
            return Err(CatalogError::InvalidReference(format!(
                "column {} cannot reference itself",
                column_id
            )));
        }
        let target = self.get_column(target_id)?.ok_or_else(|| {
            CatalogError::InvalidReference(format!("referenced column {} does not exist", target_id))
        })?;
        if !target.is_unique {
            return Err(CatalogError::InvalidReference(format!(
                "{}.{} is not flagged unique",
                target.table_name,
                target.final_name()
            )));
        }
        Ok(())
    }

    fn delete_script_rows(&self, script_id: i64) -> CatalogResult<bool> {
        let ids: Vec<i64> = {
            let mut stmt = self
                .conn
                .prepare("SELECT id FROM import_columns WHERE script_id = ?1")?;
            let rows = stmt.query_map([script_id], |row| row.get(0))?;
            rows.collect::<Result<_, _>>()?
        };
        for id in ids {
            self.delete_column_row(id)?;
        }
        self.conn
            .execute("DELETE FROM import_tables WHERE script_id = ?1", [script_id])?;
        let deleted = self
            .conn
            .execute("DELETE FROM scripts WHERE id = ?1", [script_id])?;
        Ok(deleted > 0)
    }

    fn delete_column_row(&self, id: i64) -> CatalogResult<bool> {
        self.conn.execute(
            "UPDATE import_columns SET foreign_key_reference = NULL WHERE foreign_key_reference = ?1",
            [id],
        )?;
        let deleted = self
            .conn
            .execute("DELETE FROM import_columns WHERE id = ?1", [id])?;
        Ok(deleted > 0)
    }

    fn in_transaction<T>(&self, f: impl FnOnce(&Self) -> CatalogResult<T>) -> CatalogResult<T> {
        self.conn.execute_batch("BEGIN TRANSACTION")?;
        match f(self) {
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

    fn next_id(&self, sequence: &'static str) -> CatalogResult<i64> {
        let id: i64 = self
            .conn
            .query_row(&format!("SELECT nextval('{sequence}')"), [], |row| row.get(0))?;
        Ok(id)
    }

    fn query_jobs(&self, sql: &str, params: impl duckdb::Params) -> CatalogResult<Vec<Job>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| {
            Ok(JobRow {
                id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
                schedule_time: row.get(3)?,
                schedule_days: row.get(4)?,
                created_at: row.get(5)?,
                updated_at: row.get(6)?,
                last_execution_time: row.get(7)?,
                last_execution_success: row.get(8)?,
                last_execution_error: row.get(9)?,
                last_execution_duration_ms: row.get(10)?,
            })
        })?;

        let mut jobs = Vec::new();
        for row in rows {
            jobs.push(row?.into_job()?);
        }
        Ok(jobs)
    }

    fn query_scripts(&self, sql: &str, params: impl duckdb::Params) -> CatalogResult<Vec<Script>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| {
            Ok(Script {
                id: row.get(0)?,
                job_id: row.get(1)?,
                name: row.get(2)?,
                content: row.get(3)?,
                order_exec: row.get(4)?,
                table_name: row.get(5)?,
                import_enabled: row.get(6)?,
            })
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    fn query_tables(&self, sql: &str, params: impl duckdb::Params) -> CatalogResult<Vec<ImportTable>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| {
            Ok((
                ImportTable {
                    id: row.get(0)?,
                    script_id: row.get(1)?,
                    table_name: row.get(2)?,
                    last_import: None,
                    row_count: row.get(4)?,
                    row_count_prev: row.get(5)?,
                    run_transform: row.get(6)?,
                    transform_script: row.get(7)?,
                },
                row.get::<_, Option<String>>(3)?,
            ))
        })?;

        let mut tables = Vec::new();
        for row in rows {
            let (mut table, last_import) = row?;
            table.last_import = parse_optional_timestamp("import_tables.last_import", last_import)?;
            tables.push(table);
        }
        Ok(tables)
    }

    fn query_columns(&self, sql: &str, params: impl duckdb::Params) -> CatalogResult<Vec<ImportColumn>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| {
            Ok((
                ImportColumn {
                    id: row.get(0)?,
                    script_id: row.get(1)?,
                    table_name: row.get(2)?,
                    column_name: row.get(3)?,
                    detected_data_type: row.get(4)?,
                    override_data_type: None,
                    override_column_name: row.get(6)?,
                    primary_key: row.get(7)?,
                    is_unique: row.get(8)?,
                    foreign_key_reference: row.get(9)?,
                },
                row.get::<_, Option<String>>(5)?,
            ))
        })?;

        let mut columns = Vec::new();
        for row in rows {
            let (mut column, override_type) = row?;
            column.override_data_type = match override_type {
                Some(code) => Some(code.parse().map_err(|_| CatalogError::Corrupt {
                    field: "import_columns.override_data_type",
                    value: code,
                })?),
                None => None,
            };
            columns.push(column);
        }
        Ok(columns)
    }
}

/// Raw job row before timestamp and schedule parsing
struct JobRow {
    id: i64,
    name: String,
    description: Option<String>,
    schedule_time: Option<String>,
    schedule_days: String,
    created_at: String,
    updated_at: String,
    last_execution_time: Option<String>,
    last_execution_success: Option<bool>,
    last_execution_error: Option<String>,
    last_execution_duration_ms: Option<i64>,
}

impl JobRow {
    fn into_job(self) -> CatalogResult<Job> {
        let schedule = match self.schedule_time {
            Some(time) => {
                let time = Schedule::parse_time(&time).map_err(|_| CatalogError::Corrupt {
                    field: "jobs.schedule_time",
                    value: time,
                })?;
                let days: DaySet =
                    self.schedule_days
                        .parse()
                        .map_err(|_| CatalogError::Corrupt {
                            field: "jobs.schedule_days",
                            value: self.schedule_days.clone(),
                        })?;
                Some(Schedule::new(time, days))
            }
            None => None,
        };

        Ok(Job {
            id: self.id,
            name: self.name,
            description: self.description,
            schedule,
            ledger: ExecutionLedger {
                last_execution_time: parse_optional_timestamp(
                    "jobs.last_execution_time",
                    self.last_execution_time,
                )?,
                last_execution_success: self.last_execution_success,
                last_execution_error: self.last_execution_error,
                last_execution_duration_ms: self.last_execution_duration_ms,
            },
            created_at: parse_timestamp("jobs.created_at", self.created_at)?,
            updated_at: parse_timestamp("jobs.updated_at", self.updated_at)?,
        })
    }
}

fn schedule_columns(schedule: Option<&Schedule>) -> (Option<String>, String) {
    match schedule {
        Some(schedule) => (
            Some(schedule.time.format("%H:%M:%S").to_string()),
            schedule.days.to_string(),
        ),
        None => (None, String::new()),
    }
}

fn parse_timestamp(field: &'static str, value: String) -> CatalogResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| CatalogError::Corrupt { field, value })
}

fn parse_optional_timestamp(
    field: &'static str,
    value: Option<String>,
) -> CatalogResult<Option<DateTime<Utc>>> {
    value.map(|v| parse_timestamp(field, v)).transpose()
}
