//! Import column model: persisted per-column metadata and manual overrides

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::inference::SemanticType;

/// Manual type override for a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OverrideType {
    /// Calendar date
    Date,
    /// Date with time of day
    Timestamp,
    /// 32-bit integer
    Integer,
    /// Text
    Text,
    /// Double-precision number
    Numeric,
    /// 64-bit integer
    BigInt,
    /// Boolean
    Boolean,
}

impl OverrideType {
    /// Semantic type the override stands for
    pub fn semantic_type(&self) -> SemanticType {
        match self {
            OverrideType::Date => SemanticType::Date,
            OverrideType::Timestamp => SemanticType::DateTime,
            OverrideType::Integer => SemanticType::Integer,
            OverrideType::Text => SemanticType::TEXT,
            OverrideType::Numeric => SemanticType::Decimal,
            OverrideType::BigInt => SemanticType::BigInt,
            OverrideType::Boolean => SemanticType::Boolean,
        }
    }

    /// Catalog code
    pub fn code(&self) -> &'static str {
        match self {
            OverrideType::Date => "DATE",
            OverrideType::Timestamp => "TIMESTAMP",
            OverrideType::Integer => "INTEGER",
            OverrideType::Text => "TEXT",
            OverrideType::Numeric => "NUMERIC",
            OverrideType::BigInt => "BIGINT",
            OverrideType::Boolean => "BOOLEAN",
        }
    }
}

impl std::fmt::Display for OverrideType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl std::str::FromStr for OverrideType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DATE" => Ok(OverrideType::Date),
            "TIMESTAMP" | "DATETIME" => Ok(OverrideType::Timestamp),
            "INTEGER" | "INT" => Ok(OverrideType::Integer),
            "TEXT" => Ok(OverrideType::Text),
            "NUMERIC" | "DECIMAL" => Ok(OverrideType::Numeric),
            "BIGINT" => Ok(OverrideType::BigInt),
            "BOOLEAN" | "BOOL" => Ok(OverrideType::Boolean),
            _ => Err(format!("Invalid override type: {}", s)),
        }
    }
}

/// A persisted column record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportColumn {
    /// Catalog identifier
    pub id: i64,
    /// Owning script
    pub script_id: i64,
    /// Table the column belongs to
    pub table_name: String,
    /// Column name as it appears in the data file
    pub column_name: String,
    /// Type read back from the warehouse after the last import
    pub detected_data_type: Option<String>,
    /// Manual type override
    pub override_data_type: Option<OverrideType>,
    /// Manual rename; empty when the original name is kept
    pub override_column_name: String,
    /// Part of the table's primary key
    pub primary_key: bool,
    /// Every value was distinct at the last import
    pub is_unique: bool,
    /// Column this one references through a foreign key
    pub foreign_key_reference: Option<i64>,
}

impl ImportColumn {
    /// Name the column has in the warehouse
    pub fn final_name(&self) -> &str {
        let name = self.override_column_name.trim();
        if name.is_empty() {
            &self.column_name
        } else {
            name
        }
    }
}

/// Fields needed to record a new column
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewColumn {
    /// Owning script
    pub script_id: i64,
    /// Table the column belongs to
    pub table_name: String,
    /// Column name as it appears in the data file
    pub column_name: String,
    /// Type read back from the warehouse
    pub detected_data_type: Option<String>,
    /// Manual rename, empty when none
    pub override_column_name: String,
    /// Every value was distinct
    pub is_unique: bool,
}

/// Lookup of manual overrides by original column name
#[derive(Debug, Clone, Default)]
pub struct ColumnOverrides {
    names: HashMap<String, String>,
    types: HashMap<String, OverrideType>,
}

impl ColumnOverrides {
    /// Collect the overrides recorded on a table's columns
    pub fn from_columns(columns: &[ImportColumn]) -> Self {
        let mut overrides = Self::default();
        for column in columns {
            let renamed = column.override_column_name.trim();
            if !renamed.is_empty() {
                overrides
                    .names
                    .insert(column.column_name.clone(), renamed.to_string());
            }
            if let Some(ty) = column.override_data_type {
                overrides.types.insert(column.column_name.clone(), ty);
            }
        }
        overrides
    }

    /// Final name for an original column name
    pub fn final_name<'a>(&'a self, original: &'a str) -> &'a str {
        self.names.get(original).map(String::as_str).unwrap_or(original)
    }

    /// Final names for a list of original names, preserving order
    pub fn final_names(&self, originals: &[String]) -> Vec<String> {
        originals
            .iter()
            .map(|name| self.final_name(name).to_string())
            .collect()
    }

    /// Type override for an original column name
    pub fn type_override(&self, original: &str) -> Option<SemanticType> {
        self.types.get(original).map(OverrideType::semantic_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str, rename: &str, ty: Option<OverrideType>) -> ImportColumn {
        ImportColumn {
            id: 1,
            script_id: 1,
            table_name: "sales".to_string(),
            column_name: name.to_string(),
            detected_data_type: None,
            override_data_type: ty,
            override_column_name: rename.to_string(),
            primary_key: false,
            is_unique: false,
            foreign_key_reference: None,
        }
    }

    #[test]
    fn test_final_name() {
        assert_eq!(column("amt", "", None).final_name(), "amt");
        assert_eq!(column("amt", "amount", None).final_name(), "amount");
        assert_eq!(column("amt", "  ", None).final_name(), "amt");
    }

    #[test]
    fn test_overrides_lookup() {
        let columns = vec![
            column("amt", "amount", Some(OverrideType::Numeric)),
            column("id", "", None),
        ];
        let overrides = ColumnOverrides::from_columns(&columns);
        assert_eq!(overrides.final_name("amt"), "amount");
        assert_eq!(overrides.final_name("id"), "id");
        assert_eq!(overrides.final_name("new"), "new");
        assert_eq!(overrides.type_override("amt"), Some(SemanticType::Decimal));
        assert_eq!(overrides.type_override("id"), None);
    }

    #[test]
    fn test_override_type_codes() {
        for code in ["DATE", "TIMESTAMP", "INTEGER", "TEXT", "NUMERIC", "BIGINT", "BOOLEAN"] {
            let parsed: OverrideType = code.parse().expect("valid code");
            assert_eq!(parsed.code(), code);
        }
        assert!("BLOB".parse::<OverrideType>().is_err());
    }
}
