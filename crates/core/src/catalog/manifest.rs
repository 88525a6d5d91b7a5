//! TOML job manifests
//!
//! ```toml
//! name = "daily-sales"
//! description = "Pull yesterday's sales"
//!
//! [schedule]
//! time = "06:30"
//! days = ["MON", "WED", "FRI"]
//!
//! [[scripts]]
//! name = "extract"
//! path = "extract.py"      # relative to the manifest, or use `content`
//! table = "sales"          # import target; import defaults to on
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use super::error::{CatalogError, CatalogResult};
use super::store::Catalog;
use crate::models::{Job, NewJob, NewScript};
use crate::scheduler::{DaySet, Schedule};

/// A job definition as written on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobManifest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub schedule: Option<ScheduleSpec>,
    #[serde(default)]
    pub scripts: Vec<ScriptSpec>,
}

/// Schedule section of a manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSpec {
    /// `HH:MM` or `HH:MM:SS`
    pub time: String,
    #[serde(default = "DaySet::all")]
    pub days: DaySet,
}

/// One `[[scripts]]` entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptSpec {
    pub name: String,
    #[serde(default)]
    pub order: Option<i32>,
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub table: Option<String>,
    /// Defaults to true when a table is given
    #[serde(default)]
    pub import: Option<bool>,
}

impl JobManifest {
    /// Load a manifest file; script paths resolve against its directory
    pub fn load(path: &Path) -> CatalogResult<Self> {
        let text = fs::read_to_string(path)?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_toml_str(&text, base)
    }

    /// Parse a manifest, inlining script files found under `base_dir`
    pub fn from_toml_str(text: &str, base_dir: &Path) -> CatalogResult<Self> {
        let mut manifest: JobManifest =
            toml::from_str(text).map_err(|e| CatalogError::Manifest(e.to_string()))?;

        if manifest.name.trim().is_empty() {
            return Err(CatalogError::Manifest("job name is empty".to_string()));
        }

        for script in &mut manifest.scripts {
            match (&script.path, &script.content) {
                (Some(_), Some(_)) => {
                    return Err(CatalogError::Manifest(format!(
                        "script '{}' sets both path and content",
                        script.name
                    )));
                }
                (None, None) => {
                    return Err(CatalogError::Manifest(format!(
                        "script '{}' needs a path or content",
                        script.name
                    )));
                }
                (Some(relative), None) => {
                    let full = base_dir.join(relative);
                    let content = fs::read_to_string(&full).map_err(|e| {
                        CatalogError::Manifest(format!("{}: {}", full.display(), e))
                    })?;
                    script.content = Some(content);
                    script.path = None;
                }
                (None, Some(_)) => {}
            }
        }

        Ok(manifest)
    }

    /// Parsed schedule, if the manifest has one
    pub fn schedule(&self) -> CatalogResult<Option<Schedule>> {
        self.schedule
            .as_ref()
            .map(|spec| {
                Schedule::parse_time(&spec.time)
                    .map(|time| Schedule::new(time, spec.days))
                    .map_err(CatalogError::Manifest)
            })
            .transpose()
    }
}

impl ScriptSpec {
    fn to_new_script(&self) -> NewScript {
        let table = self
            .table
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from);
        NewScript {
            name: self.name.clone(),
            content: self.content.clone().unwrap_or_default(),
            order_exec: self.order,
            import_enabled: self.import.unwrap_or(table.is_some()),
            table_name: table,
        }
    }
}

impl Catalog {
    /// Create or update a job and its scripts from a manifest
    ///
    /// Scripts are matched by name. Scripts in the catalog that the manifest
    /// does not mention are left alone. Script order is renumbered at the end.
    pub fn apply_manifest(&self, manifest: &JobManifest) -> CatalogResult<Job> {
        let schedule = manifest.schedule()?;

        let job = match self.find_job(&manifest.name)? {
            Some(existing) => {
                self.update_job(existing.id, manifest.description.as_deref(), schedule.as_ref())?
            }
            None => {
                let mut new_job = NewJob::named(&manifest.name);
                new_job.description = manifest.description.clone();
                new_job.schedule = schedule;
                self.create_job(&new_job)?
            }
        };

        for spec in &manifest.scripts {
            let wanted = spec.to_new_script();
            match self.find_script(job.id, &spec.name)? {
                Some(mut script) => {
                    script.content = wanted.content;
                    if let Some(order) = wanted.order_exec {
                        script.order_exec = order;
                    }
                    script.table_name = wanted.table_name;
                    script.import_enabled = wanted.import_enabled;
                    self.update_script(&script)?;
                }
                None => {
                    self.add_script(job.id, &wanted)?;
                }
            }
        }

        self.reorder_scripts(job.id)?;
        info!(job = %job.name, scripts = manifest.scripts.len(), "Applied job manifest");
        self.require_job(job.id)
    }
}
