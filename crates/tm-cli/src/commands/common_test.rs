use super::*;

fn global(project_dir: &Path) -> GlobalArgs {
    GlobalArgs {
        verbose: false,
        project_dir: project_dir.display().to_string(),
        config: None,
        migrations_dir: None,
        database: None,
    }
}

#[test]
fn target_defaults_without_config() {
    let dir = tempfile::tempdir().unwrap();
    let target = resolve_target(&global(dir.path())).unwrap();

    assert_eq!(target.migrations_dir, dir.path().join("migrations"));
    assert_eq!(target.database, ":memory:");
    assert!(target.is_memory());
}

#[test]
fn target_reads_project_config() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("tidemark.yml"),
        "migrations_path: sql\ndatabase:\n  path: app.duckdb\n",
    )
    .unwrap();

    let target = resolve_target(&global(dir.path())).unwrap();
    assert_eq!(target.migrations_dir, dir.path().join("sql"));
    assert_eq!(
        target.database,
        dir.path().join("app.duckdb").display().to_string()
    );
}

#[test]
fn flags_override_config() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("tidemark.yml"), "migrations_path: sql\n").unwrap();

    let mut args = global(dir.path());
    args.migrations_dir = Some("/opt/migrations".to_string());
    args.database = Some("/var/lib/app.duckdb".to_string());

    let target = resolve_target(&args).unwrap();
    assert_eq!(target.migrations_dir, PathBuf::from("/opt/migrations"));
    assert_eq!(target.database, "/var/lib/app.duckdb");
}

#[test]
fn explicit_config_must_exist() {
    let dir = tempfile::tempdir().unwrap();
    let mut args = global(dir.path());
    args.config = Some(dir.path().join("missing.yml").display().to_string());

    assert!(resolve_target(&args).is_err());
}

#[test]
fn version_label_formats_none() {
    assert_eq!(version_label(None), "none");
    assert_eq!(version_label(Some(Version::new(42))), "42");
}
