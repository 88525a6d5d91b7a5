//! `job` commands

use std::path::PathBuf;

use super::{format_schedule, open_catalog, require_job};
use crate::error::CliError;
use dataloom_core::{EngineConfig, JobManifest};

/// Arguments for the `job define` command
pub struct JobDefineArgs {
    /// Manifest file
    pub manifest: PathBuf,
}

/// Arguments for the `job show` and `job reorder` commands
pub struct JobNameArgs {
    /// Job name
    pub name: String,
}

/// Handle the `job define` command
pub fn handle_job_define(config: &EngineConfig, args: &JobDefineArgs) -> Result<(), CliError> {
    let catalog = open_catalog(config)?;
    let manifest = JobManifest::load(&args.manifest)?;
    let job = catalog.apply_manifest(&manifest)?;
    let scripts = catalog.list_scripts(job.id)?;

    println!("Defined job {} ({} scripts)", job.name, scripts.len());
    if job.schedule.is_some() {
        println!("Schedule: {}", format_schedule(job.schedule.as_ref()));
    }
    Ok(())
}

/// Handle the `job list` command
pub fn handle_job_list(config: &EngineConfig, json: bool) -> Result<(), CliError> {
    let catalog = open_catalog(config)?;
    let jobs = catalog.list_jobs()?;

    if json {
        let text = serde_json::to_string_pretty(&jobs)
            .map_err(|e| CliError::InvalidArgument(e.to_string()))?;
        println!("{}", text);
        return Ok(());
    }

    if jobs.is_empty() {
        println!("No jobs defined.");
        println!("Run 'dataloom job define <manifest.toml>' to add one.");
        return Ok(());
    }

    println!("{:<24} {:<20} {:<12} LAST RUN", "NAME", "SCHEDULE", "STATE");
    for job in &jobs {
        let last_run = job
            .ledger
            .last_execution_time
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<24} {:<20} {:<12} {}",
            job.name,
            format_schedule(job.schedule.as_ref()),
            job.ledger.state().to_string(),
            last_run
        );
    }
    Ok(())
}

/// Handle the `job show` command
pub fn handle_job_show(config: &EngineConfig, args: &JobNameArgs) -> Result<(), CliError> {
    let catalog = open_catalog(config)?;
    let job = require_job(&catalog, &args.name)?;

    println!("Job: {}", job.name);
    if let Some(description) = &job.description {
        println!("Description: {}", description);
    }
    println!("Schedule: {}", format_schedule(job.schedule.as_ref()));
    println!();
    println!("Last run:");
    println!("  State:    {}", job.ledger.state());
    if let Some(time) = job.ledger.last_execution_time {
        println!("  Finished: {}", time.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    if let Some(ms) = job.ledger.last_execution_duration_ms {
        println!("  Duration: {}ms", ms);
    }
    if let Some(error) = &job.ledger.last_execution_error {
        println!("  Error:    {}", error.trim_end());
    }

    for script in catalog.list_scripts(job.id)? {
        println!();
        let target = match script.import_target() {
            Some(table) => format!("imports into {}", table),
            None => "no import".to_string(),
        };
        println!("[{}] {} ({})", script.order_exec, script.name, target);

        for table in catalog.list_tables(script.id)? {
            let imported = table
                .last_import
                .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                .unwrap_or_else(|| "never".to_string());
            println!(
                "  Table {}: {} rows (previous {}, drift {:+}), last import {}",
                table.table_name,
                table.row_count,
                table.row_count_prev,
                table.row_drift(),
                imported
            );
            if let Some(sql) = &table.transform_script {
                let state = if table.run_transform { "on" } else { "off" };
                println!("    Transform ({}): {}", state, sql.trim());
            }

            for column in catalog.list_columns(script.id, &table.table_name)? {
                let mut flags = Vec::new();
                if column.primary_key {
                    flags.push("pk".to_string());
                }
                if column.is_unique {
                    flags.push("unique".to_string());
                }
                if let Some(ty) = column.override_data_type {
                    flags.push(format!("type={}", ty));
                }
                if let Some(target_id) = column.foreign_key_reference {
                    if let Some(target) = catalog.get_column(target_id)? {
                        flags.push(format!("-> {}.{}", target.table_name, target.final_name()));
                    }
                }

                let name = if column.final_name() != column.column_name {
                    format!("{} (as {})", column.column_name, column.final_name())
                } else {
                    column.column_name.clone()
                };
                println!(
                    "    - {:<32} {:<12} {}",
                    name,
                    column.detected_data_type.as_deref().unwrap_or("-"),
                    flags.join(" ")
                );
            }
        }
    }
    Ok(())
}

/// Handle the `job reorder` command
pub fn handle_job_reorder(config: &EngineConfig, args: &JobNameArgs) -> Result<(), CliError> {
    let catalog = open_catalog(config)?;
    let job = require_job(&catalog, &args.name)?;

    if catalog.reorder_scripts(job.id)? {
        println!("Renumbered scripts of {}:", job.name);
        for script in catalog.list_scripts(job.id)? {
            println!("  {}. {}", script.order_exec, script.name);
        }
    } else {
        println!("Script order of {} is already contiguous.", job.name);
    }
    Ok(())
}
