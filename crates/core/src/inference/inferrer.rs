//! Layered column type inference
//!
//! Rules are tried from the most specific to the least specific and the
//! first match wins:
//!
//! 1. empty column -> STRING (generic text bucket)
//! 2. all integral -> INTEGER, or BIGINT when outside 32 bits
//! 3. all numeric, no letters, no dash (see [`DashPolicy`]) -> DECIMAL
//! 4. date-like sub-sample -> DATE or DATETIME
//! 5. anything else -> STRING with a length tier
//!
//! Inference never fails: unparseable columns end up as STRING.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::debug;

use super::config::{DashPolicy, InferenceConfig};
use super::formats::{self, EXPLICIT_PATTERNS};
use super::types::{ColumnInference, SemanticType, StringTier};
use crate::staging::Dataset;

/// Column type inferrer
#[derive(Debug, Clone, Default)]
pub struct ColumnTypeInferrer {
    config: InferenceConfig,
}

impl ColumnTypeInferrer {
    /// Create a new inferrer with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an inferrer with custom configuration
    pub fn with_config(config: InferenceConfig) -> Self {
        Self { config }
    }

    /// Get the configuration
    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    /// Infer one semantic type per column of a dataset
    ///
    /// Only the first `sample_rows` rows are looked at.
    pub fn infer_dataset(&self, dataset: &Dataset) -> Vec<ColumnInference> {
        let limit = match self.config.sample_rows {
            0 => dataset.row_count(),
            n => n.min(dataset.row_count()),
        };

        dataset
            .columns()
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let values: Vec<Option<&str>> = dataset.rows()[..limit]
                    .iter()
                    .map(|row| row.get(idx).and_then(|cell| cell.as_deref()))
                    .collect();
                self.infer_named(name, &values)
            })
            .collect()
    }

    /// Infer the type of a named column and report degradation
    pub fn infer_named(&self, name: &str, values: &[Option<&str>]) -> ColumnInference {
        let present = present_values(values);
        let semantic_type = self.classify(&present);
        let degraded = !present.is_empty() && matches!(semantic_type, SemanticType::String(_));

        if degraded {
            debug!(
                column = name,
                non_empty = present.len(),
                "No typed rule matched, falling back to string"
            );
        }

        ColumnInference {
            name: name.to_string(),
            semantic_type,
            non_empty: present.len(),
            degraded,
        }
    }

    /// Infer the semantic type of a column sample
    pub fn infer_column(&self, values: &[Option<&str>]) -> SemanticType {
        self.classify(&present_values(values))
    }

    fn classify(&self, present: &[&str]) -> SemanticType {
        if present.is_empty() {
            return SemanticType::TEXT;
        }

        if let Some(integer_type) = integer_type(present) {
            return integer_type;
        }

        if self.is_decimal(present) {
            return SemanticType::Decimal;
        }

        if let Some(temporal) = self.temporal_type(present) {
            return temporal;
        }

        let max_len = present
            .iter()
            .map(|v| v.chars().count())
            .max()
            .unwrap_or(0);
        SemanticType::String(StringTier::for_length(max_len))
    }

    fn is_decimal(&self, present: &[&str]) -> bool {
        if self.config.dash_policy == DashPolicy::RejectDecimal
            && present.iter().any(|v| v.contains('-'))
        {
            return false;
        }
        present
            .iter()
            .all(|v| formats::parse_number(v).is_some() && !formats::has_alphabetic(v))
    }

    fn temporal_type(&self, present: &[&str]) -> Option<SemanticType> {
        let sample = self.date_sample(present);

        let explicit = EXPLICIT_PATTERNS.iter().find_map(|(pattern, has_time)| {
            sample
                .iter()
                .map(|v| formats::parse_with_pattern(v, pattern, *has_time))
                .collect::<Option<Vec<_>>>()
        });

        let parsed = match explicit {
            Some(parsed) => parsed,
            None => {
                let fallback_len = self.config.fallback_sample_size.min(sample.len());
                let fallback = &sample[..fallback_len];
                if formats::date_confidence(fallback) < self.config.date_threshold {
                    return None;
                }
                sample
                    .iter()
                    .filter_map(|v| formats::parse_permissive(v))
                    .collect()
            }
        };

        if parsed.iter().all(formats::is_midnight) {
            Some(SemanticType::Date)
        } else {
            Some(SemanticType::DateTime)
        }
    }

    fn date_sample<'a>(&self, present: &[&'a str]) -> Vec<&'a str> {
        let size = self.config.date_sample_size;
        if present.len() <= size {
            return present.to_vec();
        }
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        present.choose_multiple(&mut rng, size).copied().collect()
    }
}

fn present_values<'a>(values: &[Option<&'a str>]) -> Vec<&'a str> {
    values
        .iter()
        .filter_map(|v| *v)
        .filter(|v| !v.trim().is_empty())
        .collect()
}

fn integer_type(present: &[&str]) -> Option<SemanticType> {
    let mut fits_i32 = true;
    for value in present {
        let integral = formats::parse_integral(value)?;
        if integral < i64::MIN as i128 || integral > i64::MAX as i128 {
            return None;
        }
        if integral < i32::MIN as i128 || integral > i32::MAX as i128 {
            fits_i32 = false;
        }
    }
    Some(if fits_i32 {
        SemanticType::Integer
    } else {
        SemanticType::BigInt
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn infer(values: &[&str]) -> SemanticType {
        let values: Vec<Option<&str>> = values.iter().map(|v| Some(*v)).collect();
        ColumnTypeInferrer::new().infer_column(&values)
    }

    #[test]
    fn test_integer_column() {
        assert_eq!(infer(&["1", "2", "3"]), SemanticType::Integer);
        assert_eq!(infer(&["-4", "0", "12"]), SemanticType::Integer);
        assert_eq!(infer(&["3.0", "4"]), SemanticType::Integer);
    }

    #[test]
    fn test_bigint_column() {
        assert_eq!(infer(&["1", "3000000000"]), SemanticType::BigInt);
        assert_eq!(infer(&["-2147483649"]), SemanticType::BigInt);
    }

    #[test]
    fn test_integer_beyond_64_bits_is_decimal() {
        assert_eq!(infer(&["99999999999999999999"]), SemanticType::Decimal);
    }

    #[test]
    fn test_decimal_column() {
        assert_eq!(infer(&["1.5", "2.0"]), SemanticType::Decimal);
        assert_eq!(infer(&["0.25", "7"]), SemanticType::Decimal);
    }

    #[test]
    fn test_dash_disqualifies_decimal() {
        // Negative fractions are not decimals under the default policy
        assert!(matches!(infer(&["-1.5", "2.5"]), SemanticType::String(_)));

        let allow = InferenceConfig::builder()
            .dash_policy(DashPolicy::Allow)
            .build();
        let inferrer = ColumnTypeInferrer::with_config(allow);
        assert_eq!(
            inferrer.infer_column(&[Some("-1.5"), Some("2.5")]),
            SemanticType::Decimal
        );
    }

    #[test]
    fn test_exponent_with_fraction_is_not_decimal() {
        // Letters disqualify DECIMAL even inside an exponent
        assert!(matches!(infer(&["1.5e-3", "2.5"]), SemanticType::String(_)));
    }

    #[test]
    fn test_date_column() {
        assert_eq!(infer(&["2024-01-01", "2024-02-01"]), SemanticType::Date);
        assert_eq!(infer(&["31/01/2024", "15/02/2024"]), SemanticType::Date);
        assert_eq!(
            infer(&["2024-01-01 00:00:00", "2024-01-02 00:00:00"]),
            SemanticType::Date
        );
    }

    #[test]
    fn test_datetime_column() {
        assert_eq!(infer(&["2024-01-01 10:00:00"]), SemanticType::DateTime);
        assert_eq!(
            infer(&["2024-01-01T00:00:00", "2024-01-01T08:30:00"]),
            SemanticType::DateTime
        );
    }

    #[test]
    fn test_permissive_dates_need_dominant_fraction() {
        let mut values: Vec<&str> = vec!["31 Jan 2024"; 19];
        values.push("n/a");
        assert_eq!(infer(&values), SemanticType::Date);

        let mut values: Vec<&str> = vec!["31 Jan 2024"; 8];
        values.extend(["n/a", "unknown"]);
        assert!(matches!(infer(&values), SemanticType::String(_)));
    }

    #[test]
    fn test_mixed_alphanumeric_is_string() {
        assert_eq!(
            infer(&["a", "b", "3"]),
            SemanticType::String(StringTier::Short)
        );
    }

    #[test]
    fn test_string_tiers() {
        let long = "x".repeat(300);
        assert_eq!(
            infer(&["short", long.as_str()]),
            SemanticType::String(StringTier::Medium)
        );
    }

    #[test]
    fn test_empty_column() {
        let inferrer = ColumnTypeInferrer::new();
        assert_eq!(inferrer.infer_column(&[None, Some(""), Some("  ")]), SemanticType::TEXT);
        assert_eq!(inferrer.infer_column(&[]), SemanticType::TEXT);
    }

    #[test]
    fn test_nulls_are_ignored() {
        let inferrer = ColumnTypeInferrer::new();
        assert_eq!(
            inferrer.infer_column(&[Some("1"), None, Some("2")]),
            SemanticType::Integer
        );
    }

    #[test]
    fn test_inference_is_deterministic() {
        let values: Vec<String> = (0..5000)
            .map(|i| {
                if i % 50 == 0 {
                    "garbage".to_string()
                } else {
                    format!("2024-01-{:02}", (i % 28) + 1)
                }
            })
            .collect();
        let refs: Vec<Option<&str>> = values.iter().map(|v| Some(v.as_str())).collect();
        let inferrer = ColumnTypeInferrer::new();
        let first = inferrer.infer_column(&refs);
        let second = inferrer.infer_column(&refs);
        assert_eq!(first, second);
    }

    #[test]
    fn test_degradation_flag() {
        let inferrer = ColumnTypeInferrer::new();
        let report = inferrer.infer_named("notes", &[Some("hello"), Some("world")]);
        assert!(report.degraded);
        assert_eq!(report.non_empty, 2);

        let report = inferrer.infer_named("blank", &[None]);
        assert!(!report.degraded);
    }
}
