//! Configuration for column type inference

use serde::{Deserialize, Serialize};

/// How a literal dash affects decimal classification
///
/// Numeric-looking identifiers such as `12-3.5` or negative fractions are
/// kept out of the DECIMAL bucket under the default policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DashPolicy {
    /// Any value containing `-` disqualifies DECIMAL
    #[default]
    RejectDecimal,
    /// Dashes are ignored by the decimal rule
    Allow,
}

impl std::str::FromStr for DashPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reject-decimal" | "reject" => Ok(DashPolicy::RejectDecimal),
            "allow" => Ok(DashPolicy::Allow),
            _ => Err(format!("Invalid dash policy: {}", s)),
        }
    }
}

/// Configuration for column type inference
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct InferenceConfig {
    /// Maximum number of rows handed to inference (0 = all)
    pub sample_rows: usize,

    /// Size of the random sub-sample checked against the explicit date patterns
    pub date_sample_size: usize,

    /// Size of the sub-sample checked with the permissive date parser
    pub fallback_sample_size: usize,

    /// Fraction of the fallback sample that must parse as a date (0.0 - 1.0]
    pub date_threshold: f64,

    /// Seed for the date sub-sample
    pub seed: u64,

    /// Dash handling for the decimal rule
    pub dash_policy: DashPolicy,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            sample_rows: 10_000,
            date_sample_size: 1000,
            fallback_sample_size: 100,
            date_threshold: 0.9,
            seed: 0x5EED_DA7A,
            dash_policy: DashPolicy::RejectDecimal,
        }
    }
}

impl InferenceConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder for custom configuration
    pub fn builder() -> InferenceConfigBuilder {
        InferenceConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.date_threshold <= 0.0 || self.date_threshold > 1.0 {
            return Err(format!(
                "date_threshold must be in (0, 1], got {}",
                self.date_threshold
            ));
        }
        if self.date_sample_size == 0 || self.fallback_sample_size == 0 {
            return Err("date sample sizes must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// Builder for InferenceConfig
#[derive(Debug, Default)]
pub struct InferenceConfigBuilder {
    config: InferenceConfig,
}

impl InferenceConfigBuilder {
    /// Set the number of rows sampled (0 = all rows)
    pub fn sample_rows(mut self, rows: usize) -> Self {
        self.config.sample_rows = rows;
        self
    }

    /// Set the explicit-pattern date sub-sample size
    pub fn date_sample_size(mut self, size: usize) -> Self {
        self.config.date_sample_size = size;
        self
    }

    /// Set the permissive-parser date sub-sample size
    pub fn fallback_sample_size(mut self, size: usize) -> Self {
        self.config.fallback_sample_size = size;
        self
    }

    /// Set the date confidence threshold
    pub fn date_threshold(mut self, threshold: f64) -> Self {
        self.config.date_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Set the sub-sample seed
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Set the dash policy
    pub fn dash_policy(mut self, policy: DashPolicy) -> Self {
        self.config.dash_policy = policy;
        self
    }

    /// Build the configuration
    pub fn build(self) -> InferenceConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = InferenceConfig::default();
        assert_eq!(config.date_sample_size, 1000);
        assert_eq!(config.fallback_sample_size, 100);
        assert!((config.date_threshold - 0.9).abs() < f64::EPSILON);
        assert_eq!(config.dash_policy, DashPolicy::RejectDecimal);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = InferenceConfig::builder()
            .sample_rows(50)
            .date_threshold(1.5)
            .dash_policy(DashPolicy::Allow)
            .build();
        assert_eq!(config.sample_rows, 50);
        assert!((config.date_threshold - 1.0).abs() < f64::EPSILON);
        assert_eq!(config.dash_policy, DashPolicy::Allow);
    }

    #[test]
    fn test_invalid_threshold() {
        let config = InferenceConfig {
            date_threshold: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_dash_policy_parse() {
        assert_eq!("allow".parse::<DashPolicy>(), Ok(DashPolicy::Allow));
        assert_eq!(
            "reject-decimal".parse::<DashPolicy>(),
            Ok(DashPolicy::RejectDecimal)
        );
        assert!("sometimes".parse::<DashPolicy>().is_err());
    }
}
