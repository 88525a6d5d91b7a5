//! `init` command

use crate::error::CliError;
use dataloom_core::warehouse::open_warehouse;
use dataloom_core::{Catalog, EngineConfig};

/// Handle the `init` command
pub fn handle_init(config: &EngineConfig) -> Result<(), CliError> {
    let path = config.catalog.path.display().to_string();
    let catalog = Catalog::open(&path)?;

    if catalog.is_initialized()? {
        println!("Catalog already initialized at: {}", path);
        println!("Schema version: {}", catalog.schema_version()?);
    } else {
        catalog.init()?;
        println!("Catalog initialized at: {}", path);
    }

    let warehouse = open_warehouse(&config.warehouse)?;
    println!("Warehouse ready ({})", warehouse.dialect());
    Ok(())
}
