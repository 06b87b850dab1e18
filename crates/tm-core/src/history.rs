//! The `migrations_history` ledger.
//!
//! One row per applied version. Rows are only ever inserted; the primary key
//! on `version` is what stops two runs from applying the same migration.

use crate::error::{CoreError, CoreResult};
use crate::version::Version;
use std::collections::BTreeSet;
use tm_db::{Database, SqlParam};

/// DDL for the ledger table.
pub const LEDGER_DDL: &str = "CREATE TABLE IF NOT EXISTS migrations_history (
    version  BIGINT PRIMARY KEY,
    filename VARCHAR(100) NULL,
    date     TIMESTAMPTZ NOT NULL DEFAULT NOW()
)";

/// Deprecated single-row table consulted when the ledger is empty.
pub const LEGACY_TABLE: &str = "schema_migrations";

/// Upper bound on bound parameters per `IN (...)` lookup.
const IN_CLAUSE_CHUNK: usize = 500;

/// Reads and writes the applied-migrations ledger.
pub struct HistoryStore<'a> {
    db: &'a dyn Database,
}

impl<'a> HistoryStore<'a> {
    pub fn new(db: &'a dyn Database) -> Self {
        Self { db }
    }

    /// Create the ledger table if it does not exist yet.
    pub fn ensure_ledger(&self) -> CoreResult<()> {
        self.db
            .execute_batch(LEDGER_DDL)
            .map_err(CoreError::LedgerBootstrap)
    }

    /// Highest version in the ledger, falling back to the legacy table when
    /// the ledger is empty.
    pub fn last_applied_version(&self) -> CoreResult<Option<Version>> {
        let max = self
            .db
            .query_optional_i64("SELECT MAX(version) FROM migrations_history", &[])
            .map_err(CoreError::LedgerBootstrap)?;

        match max {
            Some(v) => Ok(Some(Version::new(v))),
            None => Ok(self.legacy_last_version()),
        }
    }

    /// Advisory read of the deprecated `schema_migrations` table.
    ///
    /// Never fails: a missing table or unreadable value means there is no
    /// legacy version.
    pub fn legacy_last_version(&self) -> Option<Version> {
        let sql = format!("SELECT version FROM {LEGACY_TABLE} LIMIT 1");
        match self.db.query_optional_i64(&sql, &[]) {
            Ok(value) => value.map(Version::new),
            Err(e) => {
                log::debug!("No legacy version available from {LEGACY_TABLE}: {e}");
                None
            }
        }
    }

    /// The subset of `candidates` already recorded in the ledger.
    pub fn applied_versions(&self, candidates: &BTreeSet<Version>) -> CoreResult<BTreeSet<Version>> {
        let mut applied = BTreeSet::new();
        if candidates.is_empty() {
            return Ok(applied);
        }

        let candidates: Vec<Version> = candidates.iter().copied().collect();
        for chunk in candidates.chunks(IN_CLAUSE_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql =
                format!("SELECT version FROM migrations_history WHERE version IN ({placeholders})");
            let params: Vec<SqlParam> = chunk.iter().map(|v| SqlParam::Int(v.as_i64())).collect();

            let rows = self
                .db
                .query_i64s(&sql, &params)
                .map_err(CoreError::PendingResolution)?;
            applied.extend(rows.into_iter().map(Version::new));
        }
        Ok(applied)
    }

    /// Insert the ledger row for an applied migration.
    ///
    /// Runs on whatever transaction is open on the handle.
    pub fn record(&self, version: Version, file_name: &str) -> CoreResult<()> {
        self.db
            .execute(
                "INSERT INTO migrations_history (version, filename) VALUES (?, ?)",
                &[SqlParam::Int(version.as_i64()), SqlParam::from(file_name)],
            )
            .map_err(|e| {
                if e.is_constraint_violation() {
                    CoreError::DuplicateVersion {
                        version,
                        file_name: file_name.to_string(),
                    }
                } else {
                    CoreError::LedgerRecord {
                        version,
                        file_name: file_name.to_string(),
                        source: e,
                    }
                }
            })?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "history_test.rs"]
mod tests;
