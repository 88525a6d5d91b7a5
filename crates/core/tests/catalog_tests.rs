//! Integration tests for the on-disk job catalog

use std::fs;

use tempfile::TempDir;

use dataloom_core::models::NewColumn;
use dataloom_core::{Catalog, CatalogError, JobManifest, NewJob, NewScript};

fn catalog_path(dir: &TempDir) -> String {
    dir.path().join("catalog.duckdb").display().to_string()
}

#[test]
fn test_uninitialized_catalog_is_rejected() {
    let dir = TempDir::new().expect("temp dir");
    let catalog = Catalog::open(&catalog_path(&dir)).expect("open");

    assert!(!catalog.is_initialized().expect("check"));
    assert!(matches!(
        catalog.ensure_ready(),
        Err(CatalogError::NotInitialized)
    ));

    catalog.init().expect("init");
    catalog.ensure_ready().expect("ready");
}

#[test]
fn test_state_persists_across_reopen() {
    let dir = TempDir::new().expect("temp dir");
    let path = catalog_path(&dir);

    let (job_id, column_id) = {
        let catalog = Catalog::open(&path).expect("open");
        catalog.init().expect("init");
        let job = catalog
            .create_job(&NewJob::named("nightly").with_description("Nightly pull"))
            .expect("job");
        let script = catalog
            .add_script(job.id, &NewScript::new("pull", "echo hi").importing_into("pulls"))
            .expect("script");
        let column = catalog
            .insert_column(&NewColumn {
                script_id: script.id,
                table_name: "pulls".to_string(),
                column_name: "Order Date".to_string(),
                detected_data_type: Some("DATE".to_string()),
                override_column_name: "order_date".to_string(),
                is_unique: false,
            })
            .expect("column");
        (job.id, column.id)
    };

    let catalog = Catalog::open(&path).expect("reopen");
    catalog.ensure_ready().expect("ready");

    let job = catalog.require_job(job_id).expect("job");
    assert_eq!(job.name, "nightly");
    assert_eq!(job.description.as_deref(), Some("Nightly pull"));

    let scripts = catalog.list_scripts(job_id).expect("scripts");
    assert_eq!(scripts.len(), 1);
    assert_eq!(scripts[0].import_target(), Some("pulls"));

    let column = catalog.require_column(column_id).expect("column");
    assert_eq!(column.final_name(), "order_date");
    assert_eq!(column.detected_data_type.as_deref(), Some("DATE"));
}

#[test]
fn test_manifest_file_with_script_path() {
    let dir = TempDir::new().expect("temp dir");
    fs::create_dir(dir.path().join("scripts")).expect("scripts dir");
    fs::write(
        dir.path().join("scripts").join("extract.sh"),
        "echo extracting\n",
    )
    .expect("script file");
    let manifest_path = dir.path().join("sales.toml");
    fs::write(
        &manifest_path,
        r#"
name = "daily-sales"
description = "Pull yesterday's sales"

[schedule]
time = "06:30"
days = ["MON", "FRI"]

[[scripts]]
name = "extract"
path = "scripts/extract.sh"
table = "sales"

[[scripts]]
name = "notify"
content = "echo done"
"#,
    )
    .expect("manifest");

    let catalog = Catalog::memory().expect("catalog");
    catalog.init().expect("init");

    let manifest = JobManifest::load(&manifest_path).expect("load");
    let job = catalog.apply_manifest(&manifest).expect("apply");

    let schedule = job.schedule.expect("schedule");
    assert_eq!(schedule.time.format("%H:%M").to_string(), "06:30");
    assert_eq!(schedule.days.to_string(), "MON,FRI");

    let scripts = catalog.list_scripts(job.id).expect("scripts");
    assert_eq!(scripts.len(), 2);
    assert_eq!(scripts[0].name, "extract");
    assert_eq!(scripts[0].content, "echo extracting\n");
    assert_eq!(scripts[0].import_target(), Some("sales"));
    assert_eq!(scripts[1].name, "notify");
    assert_eq!(scripts[1].import_target(), None);

    // Applying again updates in place
    let again = catalog.apply_manifest(&manifest).expect("reapply");
    assert_eq!(again.id, job.id);
    assert_eq!(catalog.list_jobs().expect("jobs").len(), 1);
    assert_eq!(catalog.list_scripts(job.id).expect("scripts").len(), 2);
}

#[test]
fn test_manifest_with_missing_script_file() {
    let dir = TempDir::new().expect("temp dir");
    let result = JobManifest::from_toml_str(
        r#"
name = "broken"

[[scripts]]
name = "extract"
path = "missing.sh"
"#,
        dir.path(),
    );
    assert!(matches!(result, Err(CatalogError::Manifest(_))));
}

#[test]
fn test_delete_job_removes_owned_rows() {
    let catalog = Catalog::memory().expect("catalog");
    catalog.init().expect("init");

    let job = catalog.create_job(&NewJob::named("temporary")).expect("job");
    let script = catalog
        .add_script(job.id, &NewScript::new("pull", "echo hi").importing_into("pulls"))
        .expect("script");
    catalog.get_or_create_table(script.id, "pulls").expect("table");
    let column = catalog
        .insert_column(&NewColumn {
            script_id: script.id,
            table_name: "pulls".to_string(),
            column_name: "id".to_string(),
            detected_data_type: Some("INTEGER".to_string()),
            override_column_name: "id".to_string(),
            is_unique: true,
        })
        .expect("column");

    assert!(catalog.delete_job(job.id).expect("delete"));
    assert!(catalog.get_job(job.id).expect("get").is_none());
    assert!(catalog.get_script(script.id).expect("get").is_none());
    assert!(catalog.get_column(column.id).expect("get").is_none());
    assert!(catalog.get_table(script.id, "pulls").expect("get").is_none());
    assert!(!catalog.delete_job(job.id).expect("delete again"));
}

#[test]
fn test_duplicate_job_name() {
    let catalog = Catalog::memory().expect("catalog");
    catalog.init().expect("init");

    catalog.create_job(&NewJob::named("once")).expect("first");
    assert!(matches!(
        catalog.create_job(&NewJob::named("once")),
        Err(CatalogError::Duplicate { .. })
    ));
}
