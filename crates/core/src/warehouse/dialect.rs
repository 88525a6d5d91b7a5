//! SQL dialect differences between warehouse backends

use serde::{Deserialize, Serialize};

use super::ForeignKeyDef;
use crate::inference::{SemanticType, StringTier};

/// Target SQL dialect
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Embedded DuckDB
    #[default]
    DuckDb,
    /// PostgreSQL
    Postgres,
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::DuckDb => write!(f, "duckdb"),
            Dialect::Postgres => write!(f, "postgres"),
        }
    }
}

impl std::str::FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "duckdb" => Ok(Dialect::DuckDb),
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            _ => Err(format!("Invalid warehouse backend: {}", s)),
        }
    }
}

impl Dialect {
    /// Quote an identifier, doubling embedded quotes
    pub fn quote_ident(&self, ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }

    /// Quoted, comma-separated column list
    pub fn column_list(&self, columns: &[String]) -> String {
        columns
            .iter()
            .map(|c| self.quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Column type for a semantic type
    pub fn sql_type(&self, ty: SemanticType) -> &'static str {
        match (self, ty) {
            (_, SemanticType::Integer) => "INTEGER",
            (_, SemanticType::BigInt) => "BIGINT",
            (Dialect::DuckDb, SemanticType::Decimal) => "DOUBLE",
            (Dialect::Postgres, SemanticType::Decimal) => "DOUBLE PRECISION",
            (_, SemanticType::Date) => "DATE",
            (_, SemanticType::DateTime) => "TIMESTAMP",
            (_, SemanticType::Boolean) => "BOOLEAN",
            (Dialect::DuckDb, SemanticType::String(_)) => "VARCHAR",
            (Dialect::Postgres, SemanticType::String(StringTier::Short)) => "VARCHAR(255)",
            (Dialect::Postgres, SemanticType::String(_)) => "TEXT",
        }
    }

    /// `CREATE TABLE` with nullable columns and optional inline constraint clauses
    pub fn create_table_sql(
        &self,
        table: &str,
        columns: &[(String, String)],
        constraints: &[String],
    ) -> String {
        let mut parts: Vec<String> = columns
            .iter()
            .map(|(name, sql_type)| format!("{} {}", self.quote_ident(name), sql_type))
            .collect();
        parts.extend(constraints.iter().cloned());
        format!(
            "CREATE TABLE {} ({})",
            self.quote_ident(table),
            parts.join(", ")
        )
    }

    /// Single-row `INSERT` with one placeholder per column
    pub fn insert_sql(&self, table: &str, columns: &[String]) -> String {
        let placeholders: Vec<String> = (1..=columns.len())
            .map(|i| match self {
                Dialect::DuckDb => "?".to_string(),
                Dialect::Postgres => format!("${}", i),
            })
            .collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.quote_ident(table),
            self.column_list(columns),
            placeholders.join(", ")
        )
    }

    /// Inline `PRIMARY KEY (...)` clause
    pub fn primary_key_clause(&self, columns: &[String]) -> String {
        format!("PRIMARY KEY ({})", self.column_list(columns))
    }

    /// Inline `UNIQUE (...)` clause
    pub fn unique_clause(&self, columns: &[String]) -> String {
        format!("UNIQUE ({})", self.column_list(columns))
    }

    /// Inline `FOREIGN KEY ... REFERENCES ...` clause
    pub fn foreign_key_clause(&self, fk: &ForeignKeyDef) -> String {
        format!(
            "FOREIGN KEY ({}) REFERENCES {} ({})",
            self.quote_ident(&fk.column),
            self.quote_ident(&fk.referenced_table),
            self.quote_ident(&fk.referenced_column)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident() {
        assert_eq!(Dialect::DuckDb.quote_ident("order"), "\"order\"");
        assert_eq!(Dialect::Postgres.quote_ident("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_type_mapping() {
        assert_eq!(Dialect::DuckDb.sql_type(SemanticType::Decimal), "DOUBLE");
        assert_eq!(
            Dialect::Postgres.sql_type(SemanticType::Decimal),
            "DOUBLE PRECISION"
        );
        assert_eq!(
            Dialect::Postgres.sql_type(SemanticType::String(StringTier::Short)),
            "VARCHAR(255)"
        );
        assert_eq!(Dialect::Postgres.sql_type(SemanticType::TEXT), "TEXT");
        assert_eq!(
            Dialect::DuckDb.sql_type(SemanticType::String(StringTier::Unbounded)),
            "VARCHAR"
        );
    }

    #[test]
    fn test_insert_placeholders() {
        let columns = vec!["a".to_string(), "b".to_string()];
        assert_eq!(
            Dialect::DuckDb.insert_sql("t", &columns),
            "INSERT INTO \"t\" (\"a\", \"b\") VALUES (?, ?)"
        );
        assert_eq!(
            Dialect::Postgres.insert_sql("t", &columns),
            "INSERT INTO \"t\" (\"a\", \"b\") VALUES ($1, $2)"
        );
    }

    #[test]
    fn test_create_table_sql() {
        let sql = Dialect::DuckDb.create_table_sql(
            "sales",
            &[
                ("id".to_string(), "INTEGER".to_string()),
                ("name".to_string(), "VARCHAR".to_string()),
            ],
            &[Dialect::DuckDb.primary_key_clause(&["id".to_string()])],
        );
        assert_eq!(
            sql,
            "CREATE TABLE \"sales\" (\"id\" INTEGER, \"name\" VARCHAR, PRIMARY KEY (\"id\"))"
        );
    }

    #[test]
    fn test_parse_backend() {
        assert_eq!("DuckDB".parse::<Dialect>(), Ok(Dialect::DuckDb));
        assert_eq!("postgresql".parse::<Dialect>(), Ok(Dialect::Postgres));
        assert!("oracle".parse::<Dialect>().is_err());
    }
}
