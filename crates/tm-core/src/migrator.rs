//! Migration orchestration: discover, resolve, apply.
//!
//! A run moves through discovery, resolution and application in that order
//! and stops at the first error. Nothing is retried; the next invocation
//! starts again from discovery and only sees versions that never committed.

use crate::error::{CoreError, CoreResult};
use crate::history::HistoryStore;
use crate::resolver::resolve_pending;
use crate::runner::MigrationRunner;
use crate::version::{parse_version, MigrationFile, Version};
use serde::Serialize;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use tm_db::Database;

/// Outcome of a successful [`Migrator::migrate`] run.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    /// Number of migration files found in the directory
    pub discovered: usize,
    /// Last applied version before this run (ledger or legacy table)
    pub previous_version: Option<Version>,
    /// Migrations applied by this run, ascending
    pub applied: Vec<MigrationFile>,
}

impl MigrationReport {
    pub fn applied_count(&self) -> usize {
        self.applied.len()
    }

    /// Version the database is at after the run.
    pub fn current_version(&self) -> Option<Version> {
        self.applied
            .last()
            .map(|m| m.version)
            .max(self.previous_version)
    }
}

/// Read-only view of where the database stands against a directory.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub discovered: Vec<MigrationFile>,
    pub current_version: Option<Version>,
    pub applied: Vec<Version>,
    pub pending: Vec<MigrationFile>,
}

/// Discovered files plus the ones still to apply.
struct Plan {
    files: BTreeMap<Version, MigrationFile>,
    current_version: Option<Version>,
    pending: Vec<MigrationFile>,
}

/// Drives a migration run against an injected database.
pub struct Migrator<'a> {
    history: HistoryStore<'a>,
    runner: MigrationRunner<'a>,
}

impl<'a> Migrator<'a> {
    pub fn new(db: &'a dyn Database) -> Self {
        Self {
            history: HistoryStore::new(db),
            runner: MigrationRunner::new(db),
        }
    }

    /// List and parse every migration file in `dir`, sorted by version.
    ///
    /// Sub-directories are skipped. Any file whose name does not parse, or
    /// whose version is already taken by another file, fails the whole call.
    pub fn discover(&self, dir: &Path) -> CoreResult<Vec<MigrationFile>> {
        Ok(discover_files(dir)?.into_values().collect())
    }

    /// Apply every pending migration in `dir`, in ascending version order.
    pub fn migrate(&self, dir: &Path) -> CoreResult<MigrationReport> {
        log::info!("Running migrations from {}", dir.display());
        let plan = self.plan(dir)?;

        let mut applied = Vec::with_capacity(plan.pending.len());
        for migration in &plan.pending {
            log::info!("Running version {} ({})", migration.version, migration.file_name);

            if let Err(err) = self.apply_one(migration) {
                log::warn!(
                    "Migration {} failed after {} applied this run; remaining migrations were not attempted",
                    migration.file_name,
                    applied.len()
                );
                return Err(err);
            }
            applied.push(migration.clone());
        }

        if applied.is_empty() {
            log::info!("Migrations are already up to date.");
        } else {
            log::info!("{} migrations have been applied.", applied.len());
        }

        Ok(MigrationReport {
            discovered: plan.files.len(),
            previous_version: plan.current_version,
            applied,
        })
    }

    /// Report discovered, applied and pending migrations without running any.
    pub fn status(&self, dir: &Path) -> CoreResult<StatusReport> {
        let plan = self.plan(dir)?;

        let applied = plan
            .files
            .keys()
            .copied()
            .filter(|v| !plan.pending.iter().any(|m| m.version == *v))
            .collect();

        Ok(StatusReport {
            discovered: plan.files.into_values().collect(),
            current_version: plan.current_version,
            applied,
            pending: plan.pending,
        })
    }

    fn plan(&self, dir: &Path) -> CoreResult<Plan> {
        let files = discover_files(dir)?;
        log::info!("Found total of {} migration files.", files.len());

        self.history.ensure_ledger()?;
        let current_version = self.history.last_applied_version()?;
        match current_version {
            Some(v) => log::info!("Current version is {v}"),
            None => log::info!("Current version is none"),
        }

        let discovered: Vec<Version> = files.keys().copied().collect();
        let pending: BTreeSet<Version> = resolve_pending(&self.history, &discovered)?
            .into_iter()
            .collect();
        // walk the discovered files so every pending version maps to its file
        let pending = files
            .values()
            .filter(|m| pending.contains(&m.version))
            .cloned()
            .collect();

        Ok(Plan {
            files,
            current_version,
            pending,
        })
    }

    fn apply_one(&self, migration: &MigrationFile) -> CoreResult<()> {
        let script = fs::read_to_string(&migration.path).map_err(|source| CoreError::FileRead {
            path: migration.path.clone(),
            source,
        })?;
        self.runner.apply(migration, &script)
    }
}

fn discover_files(dir: &Path) -> CoreResult<BTreeMap<Version, MigrationFile>> {
    let discovery_err = |source: std::io::Error| CoreError::Discovery {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = BTreeMap::new();
    for entry in fs::read_dir(dir).map_err(discovery_err)? {
        let entry = entry.map_err(discovery_err)?;
        let path = entry.path();
        if path.is_dir() {
            continue;
        }

        let file_name = entry.file_name().to_string_lossy().into_owned();
        let version = parse_version(&file_name)?;

        match files.entry(version) {
            Entry::Vacant(slot) => {
                slot.insert(MigrationFile {
                    version,
                    file_name,
                    path,
                });
            }
            Entry::Occupied(existing) => {
                // read_dir order is platform-defined; report the pair sorted
                let mut names = [existing.get().file_name.clone(), file_name];
                names.sort();
                let [first, second] = names;
                return Err(CoreError::DuplicateVersionInDirectory {
                    version,
                    first,
                    second,
                });
            }
        }
    }
    Ok(files)
}

#[cfg(test)]
#[path = "migrator_test.rs"]
mod tests;
