//! `serve` command: run scheduled jobs until interrupted

use std::sync::{Arc, Mutex};

use tracing::{error, info, warn};

use crate::error::CliError;
use dataloom_core::scheduler::JobCallback;
use dataloom_core::{EngineConfig, JobExecutor, JobScheduler};

/// Handle the `serve` command
pub fn handle_serve(config: EngineConfig) -> Result<(), CliError> {
    let executor = JobExecutor::open(config)?;
    let jobs = executor.catalog().list_jobs()?;
    // One run at a time: the stores are shared by every job
    let executor = Arc::new(Mutex::new(executor));

    let mut scheduler = JobScheduler::new();
    for job in jobs {
        let Some(schedule) = job.schedule else {
            continue;
        };
        let executor = executor.clone();
        let callback: JobCallback = Arc::new(move |job_id| {
            let Ok(executor) = executor.lock() else {
                error!(job_id, "Executor lock poisoned; skipping run");
                return;
            };
            match executor.execute(job_id) {
                Ok(outcome) if outcome.success => {
                    info!(job_id, run_id = %outcome.run_id, "Scheduled run succeeded")
                }
                Ok(outcome) => warn!(
                    job_id,
                    run_id = %outcome.run_id,
                    error = outcome.error.as_deref().unwrap_or(""),
                    "Scheduled run failed"
                ),
                Err(e) => error!(job_id, error = %e, "Scheduled run could not start"),
            }
        });
        let key = scheduler.schedule(job.id, &schedule, callback)?;
        info!(key = %key, job = %job.name, time = %schedule.time, days = %schedule.days, "Scheduled job");
    }

    if scheduler.scheduled_jobs().is_empty() {
        println!("No job has a schedule; nothing to serve.");
        return Ok(());
    }

    scheduler.start()?;
    println!(
        "Serving {} scheduled jobs. Press Ctrl-C to stop.",
        scheduler.scheduled_jobs().len()
    );
    scheduler.wait_for_shutdown_signal()?;
    scheduler.stop();
    println!("Scheduler stopped.");
    Ok(())
}
