//! Integration tests for keys in the warehouse
//!
//! Covers keys surviving a reopen of the warehouse file, and keys set up
//! through column flags across repeated job runs.

use tempfile::TempDir;

use dataloom_core::inference::SemanticType;
use dataloom_core::pipeline::{EngineConfig, JobExecutor, RunnerConfig, foreign_key_name};
use dataloom_core::staging::LocatorConfig;
use dataloom_core::warehouse::{ColumnDef, ForeignKeyDef, SqlValue, WarehouseConfig};
use dataloom_core::{Catalog, DuckDbWarehouse, NewJob, NewScript, Warehouse};

fn people_columns() -> Vec<ColumnDef> {
    vec![
        ColumnDef::new("id", SemanticType::Integer),
        ColumnDef::new("name", SemanticType::TEXT),
    ]
}

fn seed(warehouse: &DuckDbWarehouse, table: &str, rows: &[(i64, &str)]) {
    let columns = people_columns();
    warehouse.create_table(table, &columns).expect("create");
    let values: Vec<Vec<SqlValue>> = rows
        .iter()
        .map(|(id, name)| vec![SqlValue::Integer(*id), SqlValue::Text(name.to_string())])
        .collect();
    warehouse
        .insert_batch(table, &columns, &values)
        .expect("insert");
}

fn orders_fk() -> ForeignKeyDef {
    ForeignKeyDef {
        name: foreign_key_name("orders", "id"),
        table: "orders".to_string(),
        column: "id".to_string(),
        referenced_table: "customers".to_string(),
        referenced_column: "id".to_string(),
    }
}

#[test]
fn test_keys_survive_reopen() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("warehouse.duckdb").display().to_string();

    {
        let warehouse = DuckDbWarehouse::open(&path).expect("open");
        seed(&warehouse, "customers", &[(1, "a"), (2, "b")]);
        seed(&warehouse, "orders", &[(1, "x")]);
        warehouse
            .add_primary_key("customers", &["id".to_string()])
            .expect("pk");
        warehouse.add_foreign_key(&orders_fk()).expect("fk");
    }

    let warehouse = DuckDbWarehouse::open(&path).expect("reopen");
    assert_eq!(
        warehouse.primary_key("customers").expect("pk"),
        Some(vec!["id".to_string()])
    );
    assert!(
        warehouse
            .foreign_key_exists("orders", &orders_fk().name)
            .expect("exists")
    );
    assert_eq!(warehouse.row_count("customers").expect("count"), 2);
}

#[test]
fn test_foreign_key_rejects_orphan_rows() {
    let warehouse = DuckDbWarehouse::memory().expect("open");
    seed(&warehouse, "customers", &[(1, "a")]);
    seed(&warehouse, "orders", &[(1, "x")]);
    warehouse.add_foreign_key(&orders_fk()).expect("fk");

    let orphan = vec![vec![SqlValue::Integer(42), SqlValue::Text("y".to_string())]];
    assert!(
        warehouse
            .insert_batch("orders", &people_columns(), &orphan)
            .is_err()
    );
    assert_eq!(warehouse.row_count("orders").expect("count"), 1);
}

#[test]
fn test_primary_key_rebuild_keeps_rows() {
    let warehouse = DuckDbWarehouse::memory().expect("open");
    seed(&warehouse, "people", &[(1, "a"), (2, "b"), (3, "c")]);

    warehouse
        .add_primary_key("people", &["id".to_string(), "name".to_string()])
        .expect("composite");
    warehouse.drop_primary_key("people").expect("drop");
    warehouse
        .add_primary_key("people", &["id".to_string()])
        .expect("single");

    assert_eq!(
        warehouse.primary_key("people").expect("pk"),
        Some(vec!["id".to_string()])
    );
    assert_eq!(warehouse.row_count("people").expect("count"), 3);
}

#[test]
fn test_column_flags_become_keys_across_runs() {
    let dir = TempDir::new().expect("temp dir");
    let drop_zone = dir.path().join("drop");
    std::fs::create_dir(&drop_zone).expect("drop zone");
    let config = EngineConfig::new()
        .with_catalog_path(dir.path().join("catalog.duckdb"))
        .with_warehouse(WarehouseConfig {
            path: dir.path().join("warehouse.duckdb"),
            ..Default::default()
        })
        .with_locator(LocatorConfig {
            directory: drop_zone,
            scan_fallback: false,
            ..Default::default()
        })
        .with_runner(RunnerConfig::default().with_program("sh", Vec::new()));

    {
        let catalog = Catalog::open(&config.catalog.path.display().to_string()).expect("catalog");
        catalog.init().expect("init");
    }

    let executor = JobExecutor::open(config).expect("executor");
    let catalog = executor.catalog();
    let job = catalog.create_job(&NewJob::named("shop")).expect("job");
    let customers = catalog
        .add_script(
            job.id,
            &NewScript::new(
                "customers",
                "printf 'id,name\\n1,Ada\\n2,Grace\\n' > \"$DATALOOM_OUTPUT_DIR/customers.csv\"",
            )
            .importing_into("customers"),
        )
        .expect("script");
    let orders = catalog
        .add_script(
            job.id,
            &NewScript::new(
                "orders",
                "printf 'order_id,customer_id\\n10,1\\n11,1\\n12,2\\n' > \"$DATALOOM_OUTPUT_DIR/orders.csv\"",
            )
            .importing_into("orders"),
        )
        .expect("script");

    let first = executor.execute(job.id).expect("first run");
    assert!(first.success, "{:?}", first.error);

    let customer_id = catalog
        .find_column(customers.id, "customers", "id")
        .expect("find")
        .expect("customers.id");
    let order_id = catalog
        .find_column(orders.id, "orders", "order_id")
        .expect("find")
        .expect("orders.order_id");
    let order_customer = catalog
        .find_column(orders.id, "orders", "customer_id")
        .expect("find")
        .expect("orders.customer_id");
    assert!(customer_id.is_unique);
    assert!(!order_customer.is_unique);

    catalog.set_primary_key(order_id.id, true).expect("pk");
    catalog
        .set_reference(order_customer.id, Some(customer_id.id))
        .expect("reference");

    let fk_name = foreign_key_name("orders", "customer_id");
    for _ in 0..2 {
        let outcome = executor.execute(job.id).expect("run");
        assert!(outcome.success, "{:?}", outcome.error);

        let warehouse = executor.warehouse();
        assert_eq!(
            warehouse.primary_key("orders").expect("pk"),
            Some(vec!["order_id".to_string()])
        );
        assert!(warehouse.foreign_key_exists("orders", &fk_name).expect("fk"));
        assert_eq!(warehouse.row_count("orders").expect("count"), 3);
    }
}

#[test]
fn test_reference_to_non_unique_column_fails_the_job() {
    let dir = TempDir::new().expect("temp dir");
    let config = EngineConfig::new()
        .with_catalog_path(dir.path().join("catalog.duckdb"))
        .with_warehouse(WarehouseConfig {
            path: dir.path().join("warehouse.duckdb"),
            ..Default::default()
        })
        .with_locator(LocatorConfig {
            directory: dir.path().to_path_buf(),
            scan_fallback: false,
            ..Default::default()
        })
        .with_runner(RunnerConfig::default().with_program("sh", Vec::new()));
    {
        let catalog = Catalog::open(&config.catalog.path.display().to_string()).expect("catalog");
        catalog.init().expect("init");
    }

    let executor = JobExecutor::open(config).expect("executor");
    let catalog = executor.catalog();
    let job = catalog.create_job(&NewJob::named("dupes")).expect("job");
    let script = catalog
        .add_script(
            job.id,
            &NewScript::new(
                "tags",
                "printf 'tag,owner\\na,1\\na,2\\n' > \"$DATALOOM_OUTPUT_DIR/tags.csv\"",
            )
            .importing_into("tags"),
        )
        .expect("script");
    assert!(executor.execute(job.id).expect("first").success);

    let tag = catalog
        .find_column(script.id, "tags", "tag")
        .expect("find")
        .expect("tag");
    let owner = catalog
        .find_column(script.id, "tags", "owner")
        .expect("find")
        .expect("owner");
    assert!(!tag.is_unique);
    catalog.set_reference(owner.id, Some(tag.id)).expect("reference");

    let outcome = executor.execute(job.id).expect("second");
    assert!(!outcome.success);
    assert!(
        outcome
            .error
            .as_deref()
            .is_some_and(|e| e.starts_with("Error in post-script execution steps for script tags"))
    );
}
