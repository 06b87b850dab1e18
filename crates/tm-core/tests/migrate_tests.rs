//! End-to-end migration runs against DuckDB.
//!
//! Each test builds a scratch migrations directory, runs the public
//! `Migrator` API, then checks the ledger and schema via SQL.

use std::path::Path;
use tm_core::test_utils::{ledger_versions, row_count, write_migration, RecordingDatabase};
use tm_core::{CoreError, HistoryStore, Migrator, Version};
use tm_db::{Database, DuckDbBackend};

// ── Helpers ────────────────────────────────────────────────────────────

fn standard_migrations(dir: &Path) {
    write_migration(
        dir,
        "201701261850_create_tenants.sql",
        "CREATE TABLE tenants (id INTEGER PRIMARY KEY, name VARCHAR NOT NULL);",
    );
    write_migration(
        dir,
        "201702072040_create_users.sql",
        "CREATE TABLE users (id INTEGER PRIMARY KEY, tenant_id INTEGER, email VARCHAR);\n\
         CREATE INDEX users_tenant_idx ON users (tenant_id);",
    );
    write_migration(
        dir,
        "201703240710_seed_tenant.sql",
        "INSERT INTO tenants VALUES (1, 'demo');\nINSERT INTO users VALUES (1, 1, 'admin@demo.test');",
    );
}

// ── Happy path ─────────────────────────────────────────────────────────

#[test]
fn fresh_database_gets_every_migration() {
    let dir = tempfile::tempdir().unwrap();
    standard_migrations(dir.path());
    let db = DuckDbBackend::in_memory().unwrap();

    let report = Migrator::new(&db).migrate(dir.path()).unwrap();

    assert_eq!(report.discovered, 3);
    assert_eq!(report.applied_count(), 3);
    assert_eq!(
        ledger_versions(&db),
        vec![201701261850, 201702072040, 201703240710]
    );
    assert_eq!(row_count(&db, "tenants"), 1);
    assert_eq!(row_count(&db, "users"), 1);
}

#[test]
fn second_run_applies_nothing() {
    let dir = tempfile::tempdir().unwrap();
    standard_migrations(dir.path());
    let db = DuckDbBackend::in_memory().unwrap();

    Migrator::new(&db).migrate(dir.path()).unwrap();
    let report = Migrator::new(&db).migrate(dir.path()).unwrap();

    assert_eq!(report.applied_count(), 0);
    assert_eq!(report.previous_version, Some(Version::new(201703240710)));
    assert_eq!(row_count(&db, "tenants"), 1);
}

#[test]
fn rerun_against_file_database_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let migrations = dir.path().join("migrations");
    std::fs::create_dir(&migrations).unwrap();
    standard_migrations(&migrations);
    let db_path = dir.path().join("app.duckdb");

    {
        let db = DuckDbBackend::from_path(&db_path).unwrap();
        assert_eq!(Migrator::new(&db).migrate(&migrations).unwrap().applied_count(), 3);
    }

    let db = DuckDbBackend::from_path(&db_path).unwrap();
    assert_eq!(Migrator::new(&db).migrate(&migrations).unwrap().applied_count(), 0);
    assert_eq!(ledger_versions(&db).len(), 3);
}

#[test]
fn new_release_applies_only_new_files() {
    let dir = tempfile::tempdir().unwrap();
    standard_migrations(dir.path());
    let db = DuckDbBackend::in_memory().unwrap();
    Migrator::new(&db).migrate(dir.path()).unwrap();

    write_migration(
        dir.path(),
        "201704101533_add_user_name.sql",
        "ALTER TABLE users ADD COLUMN name VARCHAR;",
    );
    let report = Migrator::new(&db).migrate(dir.path()).unwrap();

    assert_eq!(report.applied_count(), 1);
    assert_eq!(report.applied[0].file_name, "201704101533_add_user_name.sql");
    assert_eq!(report.current_version(), Some(Version::new(201704101533)));
}

#[test]
fn gaps_in_ledger_are_filled_in_ascending_order() {
    let dir = tempfile::tempdir().unwrap();
    for v in 1..=5 {
        write_migration(
            dir.path(),
            &format!("{v:012}_step.sql"),
            &format!("CREATE TABLE step_{v} (id INT);"),
        );
    }
    let db = DuckDbBackend::in_memory().unwrap();
    let history = HistoryStore::new(&db);
    history.ensure_ledger().unwrap();
    for v in [1, 2, 4] {
        history.record(Version::new(v), "preexisting").unwrap();
    }

    let report = Migrator::new(&db).migrate(dir.path()).unwrap();

    let applied: Vec<i64> = report.applied.iter().map(|m| m.version.as_i64()).collect();
    assert_eq!(applied, vec![3, 5]);
    assert_eq!(ledger_versions(&db), vec![1, 2, 3, 4, 5]);
    // 1, 2 and 4 were only recorded, never run
    assert!(db.query_optional_i64("SELECT COUNT(*) FROM step_1", &[]).is_err());
}

// ── Failure handling ───────────────────────────────────────────────────

#[test]
fn failing_script_halts_the_run() {
    let dir = tempfile::tempdir().unwrap();
    write_migration(dir.path(), "000000000001_ok.sql", "CREATE TABLE first (id INT);");
    write_migration(
        dir.path(),
        "000000000002_broken.sql",
        "CREATE TABLE second (id INT); SELEC oops;",
    );
    write_migration(dir.path(), "000000000003_later.sql", "CREATE TABLE third (id INT);");
    let db = DuckDbBackend::in_memory().unwrap();

    let err = Migrator::new(&db).migrate(dir.path()).unwrap_err();

    match &err {
        CoreError::ScriptExecution { file_name, .. } => {
            assert_eq!(file_name, "000000000002_broken.sql");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.to_string().contains("000000000002_broken.sql"));
    assert_eq!(ledger_versions(&db), vec![1]);
    assert!(db.query_optional_i64("SELECT COUNT(*) FROM second", &[]).is_err());
    assert!(db.query_optional_i64("SELECT COUNT(*) FROM third", &[]).is_err());
}

#[test]
fn fixed_script_is_picked_up_next_run() {
    let dir = tempfile::tempdir().unwrap();
    write_migration(dir.path(), "000000000001_ok.sql", "CREATE TABLE first (id INT);");
    write_migration(dir.path(), "000000000002_fixme.sql", "CREATE TABLE (;");
    let db = DuckDbBackend::in_memory().unwrap();

    assert!(Migrator::new(&db).migrate(dir.path()).is_err());

    write_migration(dir.path(), "000000000002_fixme.sql", "CREATE TABLE second (id INT);");
    let report = Migrator::new(&db).migrate(dir.path()).unwrap();

    assert_eq!(report.applied_count(), 1);
    assert_eq!(ledger_versions(&db), vec![1, 2]);
}

#[test]
fn malformed_name_aborts_before_any_script() {
    for bad in [
        "12345678901_eleven.sql",
        "1234567890123_thirteen.sql",
        "abcdefghijkl_letters.sql",
        "nounderscore.sql",
    ] {
        let dir = tempfile::tempdir().unwrap();
        write_migration(dir.path(), "000000000001_ok.sql", "CREATE TABLE ok (id INT);");
        write_migration(dir.path(), bad, "CREATE TABLE bad (id INT);");
        let db = RecordingDatabase::new();

        let err = Migrator::new(&db).migrate(dir.path()).unwrap_err();
        assert!(
            matches!(
                err,
                CoreError::InvalidVersionFormat { .. } | CoreError::InvalidVersionValue { .. }
            ),
            "{bad}: unexpected error {err:?}"
        );
        assert!(db.calls().is_empty(), "{bad}: database was touched");
    }
}

#[test]
fn concurrent_apply_loses_on_ledger_key() {
    let dir = tempfile::tempdir().unwrap();
    write_migration(dir.path(), "000000000001_a.sql", "CREATE TABLE a (id INT);");
    let db = DuckDbBackend::in_memory().unwrap();
    let migrator = Migrator::new(&db);
    let files = migrator.discover(dir.path()).unwrap();

    // Another instance committed version 1 between our resolve and apply.
    let history = HistoryStore::new(&db);
    history.ensure_ledger().unwrap();
    history.record(Version::new(1), "000000000001_a.sql").unwrap();

    let err = tm_core::MigrationRunner::new(&db)
        .apply(&files[0], "CREATE TABLE a (id INT);")
        .unwrap_err();
    assert!(matches!(err, CoreError::DuplicateVersion { .. }));
    assert!(db.query_optional_i64("SELECT COUNT(*) FROM a", &[]).is_err());
}

// ── Empty / no-op runs ─────────────────────────────────────────────────

#[test]
fn nothing_pending_runs_no_statements() {
    let dir = tempfile::tempdir().unwrap();
    standard_migrations(dir.path());
    let db = RecordingDatabase::new();
    Migrator::new(&db).migrate(dir.path()).unwrap();
    db.clear_calls();

    let report = Migrator::new(&db).migrate(dir.path()).unwrap();

    assert_eq!(report.applied_count(), 0);
    assert_eq!(db.count_containing("INSERT"), 0);
    assert_eq!(db.count_containing("BEGIN"), 0);
    assert_eq!(db.count_containing("CREATE TABLE tenants"), 0);
}

#[test]
fn legacy_floor_reported_when_ledger_empty() {
    let dir = tempfile::tempdir().unwrap();
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute_batch("CREATE TABLE schema_migrations (version BIGINT); INSERT INTO schema_migrations VALUES (7);")
        .unwrap();

    let report = Migrator::new(&db).migrate(dir.path()).unwrap();
    assert_eq!(report.applied_count(), 0);
    assert_eq!(report.previous_version, Some(Version::new(7)));
    assert_eq!(
        HistoryStore::new(&db).last_applied_version().unwrap(),
        Some(Version::new(7))
    );
}
