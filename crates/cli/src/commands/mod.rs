//! CLI command implementations

pub mod column;
pub mod init;
pub mod job;
pub mod run;
pub mod serve;

use std::path::{Path, PathBuf};

use crate::error::CliError;
use dataloom_core::{Catalog, EngineConfig, Job, Schedule};

/// Config file used when `--config` is not given and the file exists
pub const DEFAULT_CONFIG_FILE: &str = "dataloom.toml";

/// Load the engine configuration
///
/// An explicit path must exist. Without one, `dataloom.toml` in the current
/// directory is used when present, else the defaults.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig, CliError> {
    let config = match path {
        Some(path) => EngineConfig::load(path)?,
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            if default.exists() {
                EngineConfig::load(&default)?
            } else {
                let config = EngineConfig::default();
                config.validate()?;
                config
            }
        }
    };
    Ok(config)
}

/// Open the catalog and check it is initialized
pub fn open_catalog(config: &EngineConfig) -> Result<Catalog, CliError> {
    let catalog = Catalog::open(&config.catalog.path.display().to_string())?;
    catalog.ensure_ready()?;
    Ok(catalog)
}

/// Look up a job by name
pub fn require_job(catalog: &Catalog, name: &str) -> Result<Job, CliError> {
    catalog
        .find_job(name)?
        .ok_or_else(|| CliError::NotFound(format!("Job not found: {}", name)))
}

/// Render a schedule as `06:30 MON,FRI`
pub fn format_schedule(schedule: Option<&Schedule>) -> String {
    match schedule {
        Some(schedule) => format!("{} {}", schedule.time.format("%H:%M"), schedule.days),
        None => "-".to_string(),
    }
}
