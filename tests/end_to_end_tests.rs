//! End-to-end test through the public facade: TOML config, manifest, run

use std::fs;

use tempfile::TempDir;

use dataloom::{Catalog, EngineConfig, ExecutionState, JobManifest, Warehouse, run_job};

#[test]
fn test_manifest_job_runs_from_toml_config() {
    let dir = TempDir::new().expect("temp dir");
    let drop_zone = dir.path().join("drop");
    fs::create_dir(&drop_zone).expect("drop zone");

    let config = EngineConfig::from_toml_str(&format!(
        r#"
[catalog]
path = '{catalog}'

[warehouse]
backend = "duckdb"
path = '{warehouse}'

[locator]
directory = '{drop}'
scan_fallback = false

[runner]
program = "sh"
args = []
script_suffix = ".sh"
timeout_secs = 30
"#,
        catalog = dir.path().join("catalog.duckdb").display(),
        warehouse = dir.path().join("warehouse.duckdb").display(),
        drop = drop_zone.display(),
    ))
    .expect("config");
    config.validate().expect("valid config");

    let manifest = JobManifest::from_toml_str(
        r#"
name = "inventory"

[schedule]
time = "02:00"

[[scripts]]
name = "stock"
table = "stock"
content = """
cat > "$DATALOOM_OUTPUT_DIR/stock.csv" <<'EOF'
sku,quantity,counted_on
A-1,4,2024-03-01
B-2,,2024-03-01
C-3,12,2024-03-02
EOF
"""
"#,
        dir.path(),
    )
    .expect("manifest");

    {
        let catalog = Catalog::open(&config.catalog.path.display().to_string()).expect("catalog");
        catalog.init().expect("init");
        catalog.apply_manifest(&manifest).expect("apply");
    }

    let outcome = run_job(config.clone(), "inventory").expect("run");
    assert!(outcome.success, "{:?}", outcome.error);
    assert_eq!(outcome.scripts_run, 1);
    assert!(outcome.output.contains("SQL Import stock output:\nImported 3 rows into stock\n"));

    let executor = dataloom::JobExecutor::open(config).expect("executor");
    let job = executor
        .catalog()
        .find_job("inventory")
        .expect("find")
        .expect("job");
    assert_eq!(job.ledger.state(), ExecutionState::Succeeded);

    let types = executor.warehouse().column_types("stock").expect("types");
    assert_eq!(
        types,
        vec![
            ("sku".to_string(), "VARCHAR".to_string()),
            ("quantity".to_string(), "INTEGER".to_string()),
            ("counted_on".to_string(), "DATE".to_string()),
        ]
    );
    assert_eq!(executor.warehouse().row_count("stock").expect("count"), 3);
}
