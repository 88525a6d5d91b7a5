//! Job execution
//!
//! [`JobExecutor::execute`] runs a job's scripts in order. After each
//! successful script the import sub-pipeline runs for its target table. The
//! first failure, whether a non-zero exit or an import error, halts the job.
//! The ledger is written on every path once the job has been found.

use std::fmt::Write as _;
use std::time::{Duration, Instant};

use tracing::{error, info, info_span, warn};
use uuid::Uuid;

use super::config::EngineConfig;
use super::error::{PipelineError, PipelineResult};
use super::import::{ImportSummary, ScriptImporter};
use super::runner::ScriptRunner;
use crate::catalog::Catalog;
use crate::models::{ExecutionLedger, Job, Script};
use crate::warehouse::{Warehouse, open_warehouse};

/// Result of one job run
#[derive(Debug, Clone, PartialEq)]
pub struct JobOutcome {
    /// Job that ran
    pub job_id: i64,
    /// Identifier of this run
    pub run_id: Uuid,
    /// Every script finished and imported cleanly
    pub success: bool,
    /// Combined output blocks of every script that ran
    pub output: String,
    /// Error text of the halting failure
    pub error: Option<String>,
    /// Wall-clock duration of the run
    pub duration: Duration,
    /// Number of scripts started
    pub scripts_run: usize,
}

impl JobOutcome {
    /// Get formatted duration
    pub fn duration_formatted(&self) -> String {
        let secs = self.duration.as_secs();
        let mins = secs / 60;
        let remaining_secs = secs % 60;

        if mins > 0 {
            format!("{}m {}s", mins, remaining_secs)
        } else {
            format!("{}.{:03}s", secs, self.duration.subsec_millis())
        }
    }
}

/// Whether the run continues after a script
enum ScriptStep {
    Continue,
    Halt(String),
}

/// Runs jobs against a catalog and a warehouse
pub struct JobExecutor {
    catalog: Catalog,
    warehouse: Box<dyn Warehouse + Send>,
    runner: ScriptRunner,
    importer: ScriptImporter,
    config: EngineConfig,
}

impl JobExecutor {
    /// Create an executor over already opened stores
    pub fn new(catalog: Catalog, warehouse: Box<dyn Warehouse + Send>, config: EngineConfig) -> Self {
        Self {
            runner: ScriptRunner::new(config.runner.clone()),
            importer: ScriptImporter::new(&config),
            catalog,
            warehouse,
            config,
        }
    }

    /// Open the configured catalog and warehouse
    ///
    /// The catalog must already be initialized.
    pub fn open(config: EngineConfig) -> PipelineResult<Self> {
        config.validate()?;
        let catalog = Catalog::open(&config.catalog.path.display().to_string())?;
        catalog.ensure_ready()?;
        let warehouse = open_warehouse(&config.warehouse)?;
        Ok(Self::new(catalog, warehouse, config))
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn warehouse(&self) -> &dyn Warehouse {
        self.warehouse.as_ref()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Execute a job by name
    pub fn execute_named(&self, name: &str) -> PipelineResult<JobOutcome> {
        let job = self
            .catalog
            .find_job(name)?
            .ok_or_else(|| PipelineError::JobNotFound(name.to_string()))?;
        self.execute(job.id)
    }

    /// Execute a job
    ///
    /// Only a missing job or a failure to write the ledger is returned as
    /// `Err`. Script and import failures produce an unsuccessful outcome.
    pub fn execute(&self, job_id: i64) -> PipelineResult<JobOutcome> {
        let job = self
            .catalog
            .get_job(job_id)?
            .ok_or_else(|| PipelineError::JobNotFound(job_id.to_string()))?;

        let run_id = Uuid::new_v4();
        let _span = info_span!("job_run", job_id, job = %job.name, run_id = %run_id).entered();
        info!("Starting job");

        let start = Instant::now();
        let mut output = String::new();
        let mut failure = None;
        let mut scripts_run = 0;

        match self.scripts_in_order(&job) {
            Ok(scripts) => {
                for script in &scripts {
                    scripts_run += 1;
                    match self.run_script(script, &run_id, &mut output) {
                        ScriptStep::Continue => {}
                        ScriptStep::Halt(message) => {
                            failure = Some(message);
                            break;
                        }
                    }
                }
            }
            Err(e) => failure = Some(e.to_string()),
        }

        let duration = start.elapsed();
        let success = failure.is_none();
        let ledger = ExecutionLedger::finished(success, failure.clone(), duration.as_millis() as i64);
        self.catalog.record_execution(job.id, &ledger)?;

        match &failure {
            None => info!(scripts_run, duration_ms = duration.as_millis() as u64, "Job succeeded"),
            Some(message) => error!(
                scripts_run,
                duration_ms = duration.as_millis() as u64,
                error = %message,
                "Job failed"
            ),
        }

        Ok(JobOutcome {
            job_id: job.id,
            run_id,
            success,
            output,
            error: failure,
            duration,
            scripts_run,
        })
    }

    fn scripts_in_order(&self, job: &Job) -> PipelineResult<Vec<Script>> {
        if self.catalog.reorder_scripts(job.id)? {
            warn!(job_id = job.id, "Script order had gaps or duplicates; renumbered");
        }
        Ok(self.catalog.list_scripts(job.id)?)
    }

    fn run_script(&self, script: &Script, run_id: &Uuid, output: &mut String) -> ScriptStep {
        let _span = info_span!("script", script = %script.name, order = script.order_exec).entered();

        let slot = match tempfile::Builder::new()
            .prefix(&format!("dataloom-{}-", run_id.simple()))
            .tempdir()
        {
            Ok(slot) => slot,
            Err(e) => {
                return ScriptStep::Halt(format!(
                    "Script {} error:\nUnable to create output directory: {}",
                    script.name, e
                ));
            }
        };

        let result = match self.runner.run(
            &script.content,
            slot.path(),
            self.config.script_working_dir(),
        ) {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "Script did not run");
                let _ = write!(output, "Script {} output:\n\n", script.name);
                return ScriptStep::Halt(format!("Script {} error:\n{}", script.name, e));
            }
        };

        let _ = write!(output, "Script {} output:\n{}\n", script.name, result.stdout);
        if !result.success {
            warn!(exit_code = ?result.exit_code, "Script exited with failure");
            return ScriptStep::Halt(format!("Script {} error:\n{}", script.name, result.stderr));
        }
        info!(duration_ms = result.duration.as_millis() as u64, "Script finished");

        match self
            .importer
            .import(&self.catalog, self.warehouse.as_ref(), script, slot.path())
        {
            Ok(Some(summary)) => {
                append_import_blocks(output, &script.name, &summary);
                ScriptStep::Continue
            }
            Ok(None) => ScriptStep::Continue,
            Err(e) => {
                error!(kind = ?e.kind(), error = %e, "Import failed");
                ScriptStep::Halt(format!(
                    "Error in post-script execution steps for script {}: {}",
                    script.name, e
                ))
            }
        }
    }
}

fn append_import_blocks(output: &mut String, script: &str, summary: &ImportSummary) {
    let _ = write!(
        output,
        "SQL Import {} output:\nImported {} rows into {}\n",
        script, summary.rows, summary.table
    );
    if summary.transformed {
        let _ = write!(
            output,
            "Transform {} output:\nTransform statement applied to {}\n",
            script, summary.table
        );
    }
}
