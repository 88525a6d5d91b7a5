//! `column set` command

use super::{open_catalog, require_job};
use crate::error::CliError;
use dataloom_core::{EngineConfig, OverrideType};

/// Arguments for the `column set` command
pub struct ColumnSetArgs {
    /// Job name
    pub job: String,
    /// Script name
    pub script: String,
    /// Table name
    pub table: String,
    /// Original column name
    pub column: String,
    /// New final name (empty clears the override)
    pub rename: Option<String>,
    /// Manual type override
    pub data_type: Option<OverrideType>,
    /// Primary key flag
    pub primary_key: Option<bool>,
    /// Referenced column as `TABLE.COLUMN`
    pub references: Option<String>,
    /// Drop the reference
    pub clear_reference: bool,
}

/// Handle the `column set` command
pub fn handle_column_set(config: &EngineConfig, args: &ColumnSetArgs) -> Result<(), CliError> {
    if args.references.is_some() && args.clear_reference {
        return Err(CliError::InvalidArgument(
            "--references and --clear-reference are mutually exclusive".to_string(),
        ));
    }

    let catalog = open_catalog(config)?;
    let job = require_job(&catalog, &args.job)?;
    let script = catalog.find_script(job.id, &args.script)?.ok_or_else(|| {
        CliError::NotFound(format!("Script {} not found in job {}", args.script, job.name))
    })?;
    let mut column = catalog
        .find_column(script.id, &args.table, &args.column)?
        .ok_or_else(|| {
            CliError::NotFound(format!(
                "Column {}.{} not recorded for script {}; run the job once first",
                args.table, args.column, script.name
            ))
        })?;

    if let Some(name) = &args.rename {
        column = catalog.set_override_name(column.id, name)?;
    }
    if let Some(ty) = args.data_type {
        column = catalog.set_override_type(column.id, Some(ty))?;
    }
    if let Some(flag) = args.primary_key {
        column = catalog.set_primary_key(column.id, flag)?;
    }
    if let Some(reference) = &args.references {
        let (table, target_name) = reference.split_once('.').ok_or_else(|| {
            CliError::InvalidArgument(format!("expected TABLE.COLUMN, got {}", reference))
        })?;
        let target = catalog
            .find_column_by_table(table, target_name)?
            .ok_or_else(|| CliError::NotFound(format!("Column {} not found", reference)))?;
        column = catalog.set_reference(column.id, Some(target.id))?;
    }
    if args.clear_reference {
        column = catalog.set_reference(column.id, None)?;
    }

    println!(
        "{}.{}: final name {}, type {}, primary key {}, reference {}",
        column.table_name,
        column.column_name,
        column.final_name(),
        column
            .override_data_type
            .map(|t| t.to_string())
            .unwrap_or_else(|| "inferred".to_string()),
        column.primary_key,
        column
            .foreign_key_reference
            .map(|id| format!("column #{}", id))
            .unwrap_or_else(|| "none".to_string())
    );
    println!("Changes apply on the next run of {}.", job.name);
    Ok(())
}
