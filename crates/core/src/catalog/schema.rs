//! Catalog schema definitions

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Schema for catalog tables
pub struct CatalogSchema;

impl CatalogSchema {
    /// Get the DDL for creating all catalog tables (DuckDB syntax)
    ///
    /// Timestamps are stored as RFC 3339 text. Ownership cascades and the
    /// set-null behaviour of column references are applied by the catalog
    /// code, not by the database.
    pub fn create_tables_duckdb() -> &'static str {
        r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_info (
    key VARCHAR PRIMARY KEY,
    value VARCHAR NOT NULL
);

CREATE SEQUENCE IF NOT EXISTS jobs_id_seq START 1;
CREATE SEQUENCE IF NOT EXISTS scripts_id_seq START 1;
CREATE SEQUENCE IF NOT EXISTS import_tables_id_seq START 1;
CREATE SEQUENCE IF NOT EXISTS import_columns_id_seq START 1;

-- Jobs and their execution ledger
CREATE TABLE IF NOT EXISTS jobs (
    id BIGINT PRIMARY KEY,
    name VARCHAR NOT NULL UNIQUE,
    description VARCHAR,
    schedule_time VARCHAR,
    schedule_days VARCHAR NOT NULL DEFAULT '',
    created_at VARCHAR NOT NULL,
    updated_at VARCHAR NOT NULL,
    last_execution_time VARCHAR,
    last_execution_success BOOLEAN,
    last_execution_error VARCHAR,
    last_execution_duration_ms BIGINT
);

-- Scripts, executed in order_exec order within a job
CREATE TABLE IF NOT EXISTS scripts (
    id BIGINT PRIMARY KEY,
    job_id BIGINT NOT NULL,
    name VARCHAR NOT NULL,
    content VARCHAR NOT NULL,
    order_exec INTEGER NOT NULL,
    table_name VARCHAR,
    import_enabled BOOLEAN NOT NULL DEFAULT FALSE,
    UNIQUE(job_id, name)
);

-- One row per (script, table)
CREATE TABLE IF NOT EXISTS import_tables (
    id BIGINT PRIMARY KEY,
    script_id BIGINT NOT NULL,
    table_name VARCHAR NOT NULL,
    last_import VARCHAR,
    row_count BIGINT NOT NULL DEFAULT 0,
    row_count_prev BIGINT NOT NULL DEFAULT 0,
    run_transform BOOLEAN NOT NULL DEFAULT FALSE,
    transform_script VARCHAR,
    UNIQUE(script_id, table_name)
);

-- One row per (script, table, column)
CREATE TABLE IF NOT EXISTS import_columns (
    id BIGINT PRIMARY KEY,
    script_id BIGINT NOT NULL,
    table_name VARCHAR NOT NULL,
    column_name VARCHAR NOT NULL,
    detected_data_type VARCHAR,
    override_data_type VARCHAR,
    override_column_name VARCHAR NOT NULL DEFAULT '',
    primary_key BOOLEAN NOT NULL DEFAULT FALSE,
    is_unique BOOLEAN NOT NULL DEFAULT FALSE,
    foreign_key_reference BIGINT,
    UNIQUE(script_id, table_name, column_name)
);

CREATE INDEX IF NOT EXISTS idx_scripts_job ON scripts(job_id);
"#
    }

    /// Get the query to check schema version
    pub fn select_schema_version() -> &'static str {
        "SELECT value FROM schema_info WHERE key = 'version'"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ddl_declares_all_entities() {
        let ddl = CatalogSchema::create_tables_duckdb();
        for table in ["jobs", "scripts", "import_tables", "import_columns"] {
            assert!(ddl.contains(&format!("CREATE TABLE IF NOT EXISTS {} (", table)));
        }
        assert!(ddl.contains("UNIQUE(script_id, table_name, column_name)"));
        assert!(ddl.contains("UNIQUE(script_id, table_name)"));
    }
}
