//! Semantic column types produced by inference

use serde::{Deserialize, Serialize};

/// Length bucket for string columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StringTier {
    /// Up to 255 characters
    Short,
    /// Up to 65,535 characters
    Medium,
    /// Up to 16,777,215 characters
    Long,
    /// Anything longer
    Unbounded,
}

impl StringTier {
    /// Upper bound of the short bucket
    pub const SHORT_MAX: usize = 255;
    /// Upper bound of the medium bucket
    pub const MEDIUM_MAX: usize = 65_535;
    /// Upper bound of the long bucket
    pub const LONG_MAX: usize = 16_777_215;

    /// Pick the narrowest tier that holds `max_len` characters
    pub fn for_length(max_len: usize) -> Self {
        if max_len <= Self::SHORT_MAX {
            StringTier::Short
        } else if max_len <= Self::MEDIUM_MAX {
            StringTier::Medium
        } else if max_len <= Self::LONG_MAX {
            StringTier::Long
        } else {
            StringTier::Unbounded
        }
    }

    /// Maximum length in characters, `None` when unbounded
    pub fn max_length(&self) -> Option<usize> {
        match self {
            StringTier::Short => Some(Self::SHORT_MAX),
            StringTier::Medium => Some(Self::MEDIUM_MAX),
            StringTier::Long => Some(Self::LONG_MAX),
            StringTier::Unbounded => None,
        }
    }
}

/// Semantic type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "tier", rename_all = "lowercase")]
pub enum SemanticType {
    /// 32-bit signed integer
    Integer,
    /// 64-bit signed integer
    BigInt,
    /// Double-precision number
    Decimal,
    /// Calendar date
    Date,
    /// Date with time of day
    DateTime,
    /// Boolean (only reachable through a manual override)
    Boolean,
    /// Text with a length bucket
    String(StringTier),
}

impl SemanticType {
    /// Generic text bucket used when nothing else fits
    pub const TEXT: SemanticType = SemanticType::String(StringTier::Medium);

    /// Canonical type name
    pub fn name(&self) -> &'static str {
        match self {
            SemanticType::Integer => "INTEGER",
            SemanticType::BigInt => "BIGINT",
            SemanticType::Decimal => "DECIMAL",
            SemanticType::Date => "DATE",
            SemanticType::DateTime => "DATETIME",
            SemanticType::Boolean => "BOOLEAN",
            SemanticType::String(_) => "STRING",
        }
    }

    /// Whether values of this type are whole numbers
    pub fn is_integer(&self) -> bool {
        matches!(self, SemanticType::Integer | SemanticType::BigInt)
    }

    /// Whether values of this type are dates or timestamps
    pub fn is_temporal(&self) -> bool {
        matches!(self, SemanticType::Date | SemanticType::DateTime)
    }
}

impl std::fmt::Display for SemanticType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SemanticType::String(tier) => match tier.max_length() {
                Some(max) => write!(f, "STRING({})", max),
                None => write!(f, "STRING"),
            },
            other => write!(f, "{}", other.name()),
        }
    }
}

impl std::str::FromStr for SemanticType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        match upper.as_str() {
            "INTEGER" | "INT" => Ok(SemanticType::Integer),
            "BIGINT" => Ok(SemanticType::BigInt),
            "DECIMAL" | "DOUBLE" | "NUMERIC" => Ok(SemanticType::Decimal),
            "DATE" => Ok(SemanticType::Date),
            "DATETIME" | "TIMESTAMP" => Ok(SemanticType::DateTime),
            "BOOLEAN" | "BOOL" => Ok(SemanticType::Boolean),
            "STRING" | "TEXT" => Ok(SemanticType::TEXT),
            _ => {
                let bound = upper
                    .strip_prefix("STRING(")
                    .and_then(|rest| rest.strip_suffix(')'))
                    .and_then(|n| n.parse::<usize>().ok());
                match bound {
                    Some(max) => Ok(SemanticType::String(StringTier::for_length(max))),
                    None => Err(format!("Invalid semantic type: {}", s)),
                }
            }
        }
    }
}

/// Inference result for a single column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnInference {
    /// Original column name
    pub name: String,
    /// Chosen semantic type
    pub semantic_type: SemanticType,
    /// Number of non-empty values in the sample
    pub non_empty: usize,
    /// True when a non-empty column matched no typed rule
    pub degraded: bool,
}
