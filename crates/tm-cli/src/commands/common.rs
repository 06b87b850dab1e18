//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tm_core::config::MEMORY_DATABASE;
use tm_core::{Config, Version};
use tm_db::DuckDbBackend;

use crate::cli::GlobalArgs;

/// Where a command reads migrations from and which database it targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Target {
    pub(crate) migrations_dir: PathBuf,
    pub(crate) database: String,
}

/// Load the config and apply command-line overrides.
pub(crate) fn resolve_target(global: &GlobalArgs) -> Result<Target> {
    let root = Path::new(&global.project_dir);
    let config = match &global.config {
        Some(path) => Config::load(Path::new(path)),
        None => Config::load_from_dir(root),
    }
    .context("Failed to load configuration")?;

    let migrations_dir = match &global.migrations_dir {
        Some(dir) => PathBuf::from(dir),
        None => config.migrations_path_absolute(root),
    };
    let database = match &global.database {
        Some(db) => db.clone(),
        None => config.database_path_absolute(root),
    };

    Ok(Target {
        migrations_dir,
        database,
    })
}

impl Target {
    pub(crate) fn is_memory(&self) -> bool {
        self.database == MEMORY_DATABASE
    }
}

/// Open the target database.
pub(crate) fn open_database(target: &Target) -> Result<DuckDbBackend> {
    if target.is_memory() {
        eprintln!("[warn] Using an in-memory database; nothing will persist after this run");
    }
    DuckDbBackend::new(&target.database)
        .with_context(|| format!("Failed to open database: {}", target.database))
}

/// Print any serializable report as pretty JSON.
pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
    println!("{json}");
    Ok(())
}

/// Display form of an optional version.
pub(crate) fn version_label(version: Option<Version>) -> String {
    version.map_or_else(|| "none".to_string(), |v| v.to_string())
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
