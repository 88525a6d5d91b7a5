//! PostgreSQL warehouse
//!
//! `tokio-postgres` is async; the pipeline is not. The warehouse owns a
//! current-thread runtime and blocks on every call, which keeps the
//! connection task running only while a query is in flight.

use chrono::{NaiveDate, NaiveDateTime};
use tokio::runtime::Runtime;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, NoTls};
use tracing::{debug, error};

use super::dialect::Dialect;
use super::error::{WarehouseError, WarehouseResult};
use super::value::SqlValue;
use super::{ColumnDef, ForeignKeyDef, Warehouse};
use crate::inference::SemanticType;

/// PostgreSQL warehouse, driven synchronously
pub struct PostgresWarehouse {
    runtime: Runtime,
    client: Client,
}

impl PostgresWarehouse {
    /// Connect to a PostgreSQL database
    pub fn connect(connection_string: &str) -> WarehouseResult<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| WarehouseError::Connection(e.to_string()))?;

        let (client, connection) = runtime
            .block_on(tokio_postgres::connect(connection_string, NoTls))
            .map_err(|e| WarehouseError::Connection(e.to_string()))?;

        runtime.spawn(async move {
            if let Err(e) = connection.await {
                error!("PostgreSQL connection error: {}", e);
            }
        });

        Ok(Self { runtime, client })
    }

    fn quote(&self, ident: &str) -> String {
        Dialect::Postgres.quote_ident(ident)
    }

    fn constraint_exists(&self, table: &str, name: &str, kind: &str) -> WarehouseResult<bool> {
        let row = self.runtime.block_on(self.client.query_opt(
            "SELECT 1 FROM information_schema.table_constraints
             WHERE table_schema = current_schema() AND table_name = $1
               AND constraint_name = $2 AND constraint_type = $3",
            &[&table, &name, &kind],
        ))?;
        Ok(row.is_some())
    }

    fn primary_key_name(&self, table: &str) -> WarehouseResult<Option<String>> {
        let row = self.runtime.block_on(self.client.query_opt(
            "SELECT constraint_name FROM information_schema.table_constraints
             WHERE table_schema = current_schema() AND table_name = $1
               AND constraint_type = 'PRIMARY KEY'",
            &[&table],
        ))?;
        Ok(row.map(|r| r.get(0)))
    }

    /// Whether `column` alone is covered by a primary key or unique constraint
    fn has_single_column_key(&self, table: &str, column: &str) -> WarehouseResult<bool> {
        let row = self.runtime.block_on(self.client.query_opt(
            "SELECT 1 FROM information_schema.table_constraints tc
             JOIN information_schema.key_column_usage k
               ON k.constraint_name = tc.constraint_name AND k.table_schema = tc.table_schema
             WHERE tc.table_schema = current_schema() AND tc.table_name = $1
               AND tc.constraint_type IN ('PRIMARY KEY', 'UNIQUE')
             GROUP BY tc.constraint_name
             HAVING COUNT(*) = 1 AND MAX(k.column_name) = $2",
            &[&table, &column],
        ))?;
        Ok(row.is_some())
    }

    fn require_table(&self, table: &str) -> WarehouseResult<()> {
        if !self.table_exists(table)? {
            return Err(WarehouseError::TableNotFound(table.to_string()));
        }
        Ok(())
    }
}

/// Bind a value with the exact Rust type PostgreSQL expects for the column
fn typed_param(value: &SqlValue, ty: SemanticType) -> Box<dyn ToSql + Sync + Send> {
    match ty {
        SemanticType::Integer => Box::new(match value {
            SqlValue::Integer(n) => i32::try_from(*n).ok(),
            _ => None,
        }),
        SemanticType::BigInt => Box::new(match value {
            SqlValue::Integer(n) => Some(*n),
            _ => None,
        }),
        SemanticType::Decimal => Box::new(match value {
            SqlValue::Float(n) => Some(*n),
            SqlValue::Integer(n) => Some(*n as f64),
            _ => None,
        }),
        SemanticType::Date => Box::new(match value {
            SqlValue::Date(d) => Some(*d),
            SqlValue::DateTime(dt) => Some(dt.date()),
            _ => None::<NaiveDate>,
        }),
        SemanticType::DateTime => Box::new(match value {
            SqlValue::DateTime(dt) => Some(*dt),
            _ => None::<NaiveDateTime>,
        }),
        SemanticType::Boolean => Box::new(match value {
            SqlValue::Boolean(b) => Some(*b),
            _ => None,
        }),
        SemanticType::String(_) => Box::new(match value {
            SqlValue::Text(s) => Some(s.clone()),
            _ => None,
        }),
    }
}

impl Warehouse for PostgresWarehouse {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn table_exists(&self, table: &str) -> WarehouseResult<bool> {
        let row = self.runtime.block_on(self.client.query_opt(
            "SELECT 1 FROM information_schema.tables
             WHERE table_schema = current_schema() AND table_name = $1",
            &[&table],
        ))?;
        Ok(row.is_some())
    }

    fn drop_table(&self, table: &str) -> WarehouseResult<()> {
        let sql = format!("DROP TABLE IF EXISTS {} CASCADE", self.quote(table));
        self.runtime.block_on(self.client.batch_execute(&sql))?;
        debug!(table, "Dropped table");
        Ok(())
    }

    fn create_table(&self, table: &str, columns: &[ColumnDef]) -> WarehouseResult<()> {
        let dialect = Dialect::Postgres;
        let typed: Vec<(String, String)> = columns
            .iter()
            .map(|c| (c.name.clone(), dialect.sql_type(c.semantic_type).to_string()))
            .collect();
        let sql = dialect.create_table_sql(table, &typed, &[]);
        self.runtime.block_on(self.client.batch_execute(&sql))?;
        Ok(())
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
        let sql = Dialect::Postgres.insert_sql(table, &names);

        self.runtime.block_on(async {
            self.client.batch_execute("BEGIN").await?;
            let result = async {
                let stmt = self.client.prepare(&sql).await?;
                let mut written = 0u64;
                for row in rows {
                    let params: Vec<Box<dyn ToSql + Sync + Send>> = row
                        .iter()
                        .zip(columns)
                        .map(|(value, column)| typed_param(value, column.semantic_type))
                        .collect();
                    let refs: Vec<&(dyn ToSql + Sync)> = params
                        .iter()
                        .map(|p| p.as_ref() as &(dyn ToSql + Sync))
                        .collect();
                    written += self.client.execute(&stmt, &refs).await?;
                }
                Ok::<_, tokio_postgres::Error>(written)
            }
            .await;

            match result {
                Ok(written) => {
                    self.client.batch_execute("COMMIT").await?;
                    Ok(written as usize)
                }
                Err(e) => {
                    let _ = self.client.batch_execute("ROLLBACK").await;
                    Err(WarehouseError::from(e))
                }
            }
        })
    }

    fn row_count(&self, table: &str) -> WarehouseResult<u64> {
        self.require_table(table)?;
        let sql = format!("SELECT COUNT(*) FROM {}", self.quote(table));
        let row = self.runtime.block_on(self.client.query_one(&sql, &[]))?;
        let count: i64 = row.get(0);
        Ok(count.max(0) as u64)
    }

    fn column_types(&self, table: &str) -> WarehouseResult<Vec<(String, String)>> {
        let rows = self.runtime.block_on(self.client.query(
            "SELECT column_name, data_type FROM information_schema.columns
             WHERE table_schema = current_schema() AND table_name = $1
             ORDER BY ordinal_position",
            &[&table],
        ))?;
        Ok(rows
            .iter()
            .map(|row| {
                let name: String = row.get(0);
                let data_type: String = row.get(1);
                (name, data_type.to_uppercase())
            })
            .collect())
    }

    fn primary_key(&self, table: &str) -> WarehouseResult<Option<Vec<String>>> {
        let rows = self.runtime.block_on(self.client.query(
            "SELECT k.column_name FROM information_schema.table_constraints tc
             JOIN information_schema.key_column_usage k
               ON k.constraint_name = tc.constraint_name AND k.table_schema = tc.table_schema
             WHERE tc.table_schema = current_schema() AND tc.table_name = $1
               AND tc.constraint_type = 'PRIMARY KEY'
             ORDER BY k.ordinal_position",
            &[&table],
        ))?;
        if rows.is_empty() {
            return Ok(None);
        }
        Ok(Some(rows.iter().map(|row| row.get(0)).collect()))
    }

    fn drop_primary_key(&self, table: &str) -> WarehouseResult<bool> {
        self.require_table(table)?;
        let Some(name) = self.primary_key_name(table)? else {
            return Ok(false);
        };
        let sql = format!(
            "ALTER TABLE {} DROP CONSTRAINT {} CASCADE",
            self.quote(table),
            self.quote(&name)
        );
        self.runtime
            .block_on(self.client.batch_execute(&sql))
            .map_err(|e| WarehouseError::constraint(&name, e))?;
        debug!(table, name = %name, "Dropped primary key");
        Ok(true)
    }

    fn add_primary_key(&self, table: &str, columns: &[String]) -> WarehouseResult<()> {
        self.require_table(table)?;
        let name = format!("pk_{}", table);
        let sql = format!(
            "ALTER TABLE {} ADD CONSTRAINT {} PRIMARY KEY ({})",
            self.quote(table),
            self.quote(&name),
            Dialect::Postgres.column_list(columns)
        );
        self.runtime
            .block_on(self.client.batch_execute(&sql))
            .map_err(|e| WarehouseError::constraint(&name, e))?;
        Ok(())
    }

    fn foreign_key_exists(&self, table: &str, name: &str) -> WarehouseResult<bool> {
        self.constraint_exists(table, name, "FOREIGN KEY")
    }

    fn drop_foreign_key(&self, table: &str, name: &str) -> WarehouseResult<bool> {
        if !self.foreign_key_exists(table, name)? {
            return Ok(false);
        }
        let sql = format!(
            "ALTER TABLE {} DROP CONSTRAINT {}",
            self.quote(table),
            self.quote(name)
        );
        self.runtime
            .block_on(self.client.batch_execute(&sql))
            .map_err(|e| WarehouseError::constraint(name, e))?;
        Ok(true)
    }

    fn add_foreign_key(&self, fk: &ForeignKeyDef) -> WarehouseResult<()> {
        self.require_table(&fk.table)?;
        self.require_table(&fk.referenced_table)?;

        if !self.has_single_column_key(&fk.referenced_table, &fk.referenced_column)? {
            let unique = format!("uq_{}_{}", fk.referenced_table, fk.referenced_column);
            let sql = format!(
                "ALTER TABLE {} ADD CONSTRAINT {} UNIQUE ({})",
                self.quote(&fk.referenced_table),
                self.quote(&unique),
                self.quote(&fk.referenced_column)
            );
            self.runtime
                .block_on(self.client.batch_execute(&sql))
                .map_err(|e| WarehouseError::constraint(&unique, e))?;
        }

        let sql = format!(
            "ALTER TABLE {} ADD CONSTRAINT {} {}",
            self.quote(&fk.table),
            self.quote(&fk.name),
            Dialect::Postgres.foreign_key_clause(fk)
        );
        self.runtime
            .block_on(self.client.batch_execute(&sql))
            .map_err(|e| WarehouseError::constraint(&fk.name, e))?;
        debug!(name = %fk.name, table = %fk.table, "Added foreign key");
        Ok(())
    }

    fn execute_script(&self, sql: &str) -> WarehouseResult<()> {
        self.runtime.block_on(self.client.batch_execute(sql))?;
        Ok(())
    }
}
