//! End-to-end scenarios for a small office installation
//!
//! Each test writes a `.env` file the way an administrator would, loads it
//! through the configuration layer and runs the sync engine against the
//! file-backed fake host.

use dbsync_core::config::read_env_file;
use dbsync_core::host::{Column, ColumnType, TableSchema};
use dbsync_core::{
    LinkStatus, Reachability, RunMode, RunReport, Settings, SettingsOverrides, SyncEngine,
    TransferOutcome,
};
use dbsync_fs::NormalizedPath;
use dbsync_test_utils::{FakeDatabase, FakeEngine, TestWorkspace};
use pretty_assertions::assert_eq;
use serde_json::json;

/// Load settings from the workspace `.env`, as the CLI does.
fn load(ws: &TestWorkspace) -> Settings {
    let env_file = ws.write_env();
    let pairs = read_env_file(&env_file).unwrap();
    Settings::from_pairs(&pairs, &ws.root(), &SettingsOverrides::default()).unwrap()
}

fn run(ws: &TestWorkspace, host: &FakeEngine, mode: RunMode) -> RunReport {
    SyncEngine::new(load(ws), Box::new(host.clone()))
        .unwrap()
        .run(mode)
        .unwrap()
}

fn secured_link(target: &NormalizedPath, password: &str) -> String {
    format!(";DATABASE={};PWD={}", target.to_windows_string(), password)
}

/// BRASS is the front end; CLIENTES and INVENTARIO hold the data it links.
fn brass_office(ws: &mut TestWorkspace) {
    let clientes = ws.remote_db("clientes.mdb", &FakeDatabase::new().with_password("secret"));
    let inventario = ws.remote_db(
        "inventario.mdb",
        &FakeDatabase::new().with_password("secret"),
    );
    let brass = ws.remote_db(
        "brass.mdb",
        &FakeDatabase::new()
            .with_password("secret")
            .with_link("Clientes", "Clientes", &secured_link(&clientes, "secret"))
            .with_link("Articulos", "Articulos", &secured_link(&inventario, "secret"))
            .with_link("Tarifas", "Tarifas", "ODBC;DSN=Tarifas;UID=brass"),
    );
    ws.add_database("BRASS", &brass);
    ws.add_database("CLIENTES", &clientes);
    ws.add_database("INVENTARIO", &inventario);
    ws.configure("DB_PASSWORD", "secret");
}

fn correos_schema() -> TableSchema {
    TableSchema::new(
        "Correos",
        vec![
            Column::new("Id", ColumnType::Counter),
            Column::new("Remitente", ColumnType::Text).with_size(120),
            Column::new("Fecha", ColumnType::DateTime),
            Column::new("Leido", ColumnType::Boolean),
        ],
    )
}

fn correos_rows(count: usize) -> Vec<Vec<serde_json::Value>> {
    (1..=count)
        .map(|i| {
            vec![
                json!(i),
                json!(format!("cliente{}@example.com", i)),
                json!(format!("2024-03-{:02}T09:30:00", i)),
                json!(i % 2 == 0),
            ]
        })
        .collect()
}

#[test]
fn test_brass_full_run_points_links_at_local_copies() {
    let mut ws = TestWorkspace::new();
    brass_office(&mut ws);
    let host = FakeEngine::new();

    let report = run(&ws, &host, RunMode::Full);

    assert!(report.is_success(), "{:#?}", report);
    assert_eq!(report.succeeded_count(), 3);

    let local = ws.read_local("brass.mdb");
    assert_eq!(
        local.link("Clientes").unwrap().connect,
        secured_link(&ws.local_path("clientes.mdb"), "secret")
    );
    assert_eq!(
        local.link("Articulos").unwrap().connect,
        secured_link(&ws.local_path("inventario.mdb"), "secret")
    );
    assert_eq!(
        local.link("Tarifas").unwrap().connect,
        "ODBC;DSN=Tarifas;UID=brass"
    );

    let links = report.outcome("BRASS").unwrap().links.as_ref().unwrap();
    assert_eq!(links.relinked(), 2);
    assert_eq!(
        links.outcome("Tarifas").unwrap().status,
        LinkStatus::NotFileLink
    );
    assert_eq!(host.opened(), host.closed());
    assert_eq!(host.dropped_open(), 0);
}

#[test]
fn test_correos_keeps_only_latest_records() {
    let mut ws = TestWorkspace::new();
    let correos = ws.remote_db(
        "correos.mdb",
        &FakeDatabase::new().with_table(correos_schema(), correos_rows(12)),
    );
    ws.add_database("CORREOS", &correos);

    let report = run(&ws, &FakeEngine::new(), RunMode::Full);

    assert!(report.is_success());
    match report.outcome("CORREOS").unwrap().transfer.as_ref().unwrap() {
        TransferOutcome::Extracted(extract) => {
            assert_eq!(extract.primary_table.as_deref(), Some("Correos"));
            assert_eq!(extract.rows_copied, 5);
        }
        other => panic!("expected an extraction, got {:?}", other),
    }

    let local = ws.read_local("correos.mdb");
    let table = local.table("Correos").unwrap();
    assert_eq!(table.schema, correos_schema());
    assert_eq!(table.rows, correos_rows(12)[7..].to_vec());
    // the remote keeps every record
    assert_eq!(ws.read_remote("correos.mdb").table("Correos").unwrap().rows.len(), 12);
}

#[test]
fn test_one_unreachable_remote_does_not_stop_the_others() {
    let mut ws = TestWorkspace::new();
    let brass = ws.remote_db("brass.mdb", &FakeDatabase::new());
    let clientes = ws.remote_db("clientes.mdb", &FakeDatabase::new());
    let almacen = ws.offline_path("almacen.mdb");
    ws.add_database("ALMACEN", &almacen);
    ws.add_database("BRASS", &brass);
    ws.add_database("CLIENTES", &clientes);

    let report = run(&ws, &FakeEngine::new(), RunMode::Full);

    assert!(!report.is_success());
    assert_eq!(report.failed_count(), 1);
    assert_eq!(report.succeeded_count(), 2);

    let almacen = report.outcome("ALMACEN").unwrap();
    assert!(matches!(
        almacen.reachability,
        Some(Reachability::Unreachable { .. })
    ));
    assert!(matches!(
        almacen.transfer,
        Some(TransferOutcome::Skipped { .. })
    ));
    assert!(!ws.local_path("almacen.mdb").exists());
    assert!(ws.local_path("brass.mdb").is_file());
    assert!(ws.local_path("clientes.mdb").is_file());
}

#[test]
fn test_links_only_after_full_run_changes_nothing() {
    let mut ws = TestWorkspace::new();
    brass_office(&mut ws);
    let host = FakeEngine::new();
    run(&ws, &host, RunMode::Full);
    let relinks_after_full = host.relinks();
    let before = ws.read_local("brass.mdb");

    let report = run(&ws, &host, RunMode::LinksOnly);

    assert!(report.is_success());
    assert_eq!(report.relinked_tables(), 0);
    assert_eq!(host.relinks(), relinks_after_full);
    assert_eq!(ws.read_local("brass.mdb"), before);
}

#[test]
fn test_links_only_relinks_a_hand_copied_database() {
    let mut ws = TestWorkspace::new();
    let clientes = ws.remote_db("clientes.mdb", &FakeDatabase::new());
    let front = FakeDatabase::new().with_file_link("Clientes", &clientes);
    let brass = ws.remote_db("brass.mdb", &front);
    ws.add_database("BRASS", &brass);
    ws.add_database("CLIENTES", &clientes);
    // copied by hand before dbsync was installed
    ws.local_db("brass.mdb", &front);

    let report = run(&ws, &FakeEngine::new(), RunMode::LinksOnly);

    assert!(report.is_success());
    assert_eq!(report.relinked_tables(), 1);
    assert_eq!(
        ws.read_local("brass.mdb").link_target("Clientes").unwrap(),
        ws.local_path("clientes.mdb").to_windows_string()
    );
}

#[test]
fn test_check_network_reports_without_touching_anything() {
    let mut ws = TestWorkspace::new();
    brass_office(&mut ws);
    let host = FakeEngine::new();

    let report = run(&ws, &host, RunMode::CheckNetwork);

    assert!(report.is_success());
    assert_eq!(host.opened(), 0);
    assert!(!ws.local_dir().exists());
    for outcome in &report.outcomes {
        assert_eq!(outcome.reachability, Some(Reachability::Reachable));
        assert!(outcome.transfer.is_none());
    }
}

#[test]
fn test_run_report_serializes_for_tooling() {
    let mut ws = TestWorkspace::new();
    brass_office(&mut ws);

    let report = run(&ws, &FakeEngine::new(), RunMode::Full);
    let value = serde_json::to_value(&report).unwrap();

    let brass = value["outcomes"]
        .as_array()
        .unwrap()
        .iter()
        .find(|o| o["name"] == "BRASS")
        .unwrap();
    assert_eq!(brass["transfer"]["kind"], "copied");
    assert_eq!(brass["reachability"]["state"], "reachable");
    let statuses: Vec<&str> = brass["links"]["tables"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["status"].as_str().unwrap())
        .collect();
    assert_eq!(statuses, vec!["relinked", "relinked", "not_file_link"]);
}
