//! Engine configuration
//!
//! Every section is optional in the TOML file; missing fields take their
//! defaults.
//!
//! ```toml
//! [catalog]
//! path = "dataloom.duckdb"
//!
//! [warehouse]
//! backend = "duckdb"
//! path = "warehouse.duckdb"
//!
//! [locator]
//! directory = "/srv/imports"
//! window_secs = 10
//!
//! [runner]
//! program = "python3"
//! timeout_secs = 600
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::materialize::MaterializeConfig;
use super::reconcile::ReconcileConfig;
use super::runner::RunnerConfig;
use crate::inference::InferenceConfig;
use crate::staging::{LocatorConfig, ReaderConfig};
use crate::warehouse::{Dialect, WarehouseConfig};

/// Errors loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read
    #[error("Unable to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema
    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range
    #[error("Invalid config value for {field}: {message}")]
    Invalid { field: String, message: String },
}

impl ConfigError {
    fn invalid(field: &str, message: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// `[catalog]` configuration section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// DuckDB file holding jobs, scripts and column metadata
    pub path: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("dataloom.duckdb"),
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub catalog: CatalogConfig,
    pub warehouse: WarehouseConfig,
    pub locator: LocatorConfig,
    pub runner: RunnerConfig,
    pub inference: InferenceConfig,
    pub materialize: MaterializeConfig,
    pub reader: ReaderConfig,
    pub reconcile: ReconcileConfig,
}

impl EngineConfig {
    /// Create a configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and validate a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse TOML text without validating it
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Set the catalog database path
    pub fn with_catalog_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.catalog.path = path.into();
        self
    }

    /// Set the warehouse section
    pub fn with_warehouse(mut self, warehouse: WarehouseConfig) -> Self {
        self.warehouse = warehouse;
        self
    }

    /// Set the locator section
    pub fn with_locator(mut self, locator: LocatorConfig) -> Self {
        self.locator = locator;
        self
    }

    /// Set the runner section
    pub fn with_runner(mut self, runner: RunnerConfig) -> Self {
        self.runner = runner;
        self
    }

    /// Set the inference section
    pub fn with_inference(mut self, inference: InferenceConfig) -> Self {
        self.inference = inference;
        self
    }

    /// Set the materialize section
    pub fn with_materialize(mut self, materialize: MaterializeConfig) -> Self {
        self.materialize = materialize;
        self
    }

    /// Set the reader section
    pub fn with_reader(mut self, reader: ReaderConfig) -> Self {
        self.reader = reader;
        self
    }

    /// Set the reconcile section
    pub fn with_reconcile(mut self, reconcile: ReconcileConfig) -> Self {
        self.reconcile = reconcile;
        self
    }

    /// Check value ranges and cross-section consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.inference
            .validate()
            .map_err(|e| ConfigError::invalid("inference", e))?;

        if self.materialize.batch_size == 0 {
            return Err(ConfigError::invalid(
                "materialize.batch_size",
                "must be greater than zero",
            ));
        }
        if self.locator.extensions.is_empty() {
            return Err(ConfigError::invalid("locator.extensions", "must not be empty"));
        }
        if self.reader.encodings.is_empty() {
            return Err(ConfigError::invalid("reader.encodings", "must not be empty"));
        }
        if self.runner.program.trim().is_empty() {
            return Err(ConfigError::invalid("runner.program", "must not be empty"));
        }
        if self.runner.timeout_secs == Some(0) {
            return Err(ConfigError::invalid(
                "runner.timeout_secs",
                "must be greater than zero",
            ));
        }

        match self.warehouse.backend {
            Dialect::DuckDb => {
                let memory = |p: &Path| p.as_os_str() == ":memory:";
                if !memory(&self.catalog.path) && self.catalog.path == self.warehouse.path {
                    return Err(ConfigError::invalid(
                        "warehouse.path",
                        "must differ from catalog.path",
                    ));
                }
            }
            Dialect::Postgres => {
                if self.warehouse.url.as_deref().is_none_or(str::is_empty) {
                    return Err(ConfigError::invalid(
                        "warehouse.url",
                        "required for the postgres backend",
                    ));
                }
            }
        }

        Ok(())
    }

    /// Working directory for scripts: the runner's, else the locator directory
    pub fn script_working_dir(&self) -> &Path {
        self.runner
            .working_dir
            .as_deref()
            .unwrap_or(&self.locator.directory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::OverrideNamePolicy;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::new();
        assert!(config.validate().is_ok());
        assert_eq!(config.catalog.path, PathBuf::from("dataloom.duckdb"));
        assert_eq!(config.locator.window_secs, 120);
        assert_eq!(config.materialize.batch_size, 1000);
        assert_eq!(config.runner.program, "python");
    }

    #[test]
    fn test_partial_toml() {
        let config = EngineConfig::from_toml_str(
            r#"
            [locator]
            directory = "/srv/imports"
            window_secs = 10

            [reconcile]
            override_name_policy = "on-change"

            [inference]
            dash_policy = "allow"
            "#,
        )
        .expect("parse");

        assert_eq!(config.locator.directory, PathBuf::from("/srv/imports"));
        assert_eq!(config.locator.window_secs, 10);
        assert!(config.locator.scan_fallback);
        assert_eq!(
            config.reconcile.override_name_policy,
            OverrideNamePolicy::OnChange
        );
        assert_eq!(config.materialize.batch_size, 1000);
        assert_eq!(config.script_working_dir(), Path::new("/srv/imports"));
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let err = EngineConfig::from_toml_str("[warehouse]\nbackend = \"oracle\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validation() {
        let mut config = EngineConfig::new();
        config.materialize.batch_size = 0;
        assert!(config.validate().is_err());

        let config = EngineConfig::new().with_catalog_path("warehouse.duckdb");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("warehouse.path"));

        let config = EngineConfig::new()
            .with_catalog_path(":memory:")
            .with_warehouse(WarehouseConfig {
                path: PathBuf::from(":memory:"),
                ..Default::default()
            });
        assert!(config.validate().is_ok());

        let config = EngineConfig::new().with_warehouse(WarehouseConfig {
            backend: Dialect::Postgres,
            ..Default::default()
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let path = dir.path().join("dataloom.toml");
        std::fs::write(&path, "[runner]\nprogram = \"sh\"\nargs = []\n").expect("write");

        let config = EngineConfig::load(&path).expect("load");
        assert_eq!(config.runner.program, "sh");
        assert!(config.runner.args.is_empty());

        let missing = EngineConfig::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Read { .. }));
    }
}
