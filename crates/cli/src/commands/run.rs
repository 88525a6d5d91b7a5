//! `run` command

use crate::error::CliError;
use dataloom_core::{EngineConfig, JobExecutor};

/// Arguments for the `run` command
pub struct RunArgs {
    /// Job name
    pub name: String,
}

/// Handle the `run` command; returns whether the job succeeded
pub fn handle_run(config: EngineConfig, args: &RunArgs) -> Result<bool, CliError> {
    let executor = JobExecutor::open(config)?;
    let outcome = executor.execute_named(&args.name)?;

    print!("{}", outcome.output);
    if let Some(error) = &outcome.error {
        eprintln!("{}", error.trim_end());
    }

    eprintln!();
    eprintln!(
        "Job {} {} in {} ({} scripts, run {})",
        args.name,
        if outcome.success { "succeeded" } else { "failed" },
        outcome.duration_formatted(),
        outcome.scripts_run,
        outcome.run_id
    );
    Ok(outcome.success)
}
