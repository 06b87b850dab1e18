//! Applies a single migration inside its own transaction.

use crate::error::{CoreError, CoreResult};
use crate::history::HistoryStore;
use crate::version::MigrationFile;
use tm_db::{with_transaction, Database, DbError};

/// Failure inside the migration transaction: either BEGIN/COMMIT itself or
/// one of the steps.
enum TxError {
    Db(DbError),
    Step(CoreError),
}

impl From<DbError> for TxError {
    fn from(err: DbError) -> Self {
        TxError::Db(err)
    }
}

impl From<CoreError> for TxError {
    fn from(err: CoreError) -> Self {
        TxError::Step(err)
    }
}

/// Executes migration scripts and records them in the ledger.
pub struct MigrationRunner<'a> {
    db: &'a dyn Database,
}

impl<'a> MigrationRunner<'a> {
    pub fn new(db: &'a dyn Database) -> Self {
        Self { db }
    }

    /// Run `script` and insert the ledger row for `migration` atomically.
    ///
    /// On any failure the transaction is rolled back, so neither the schema
    /// change nor the ledger row survives.
    pub fn apply(&self, migration: &MigrationFile, script: &str) -> CoreResult<()> {
        log::debug!(
            "Applying {} on {}",
            migration.file_name,
            self.db.db_type()
        );

        let result = with_transaction(self.db, |tx| -> Result<(), TxError> {
            tx.execute_batch(script)
                .map_err(|source| CoreError::ScriptExecution {
                    version: migration.version,
                    file_name: migration.file_name.clone(),
                    source,
                })?;
            HistoryStore::new(tx).record(migration.version, &migration.file_name)?;
            Ok(())
        });

        result.map_err(|err| match err {
            TxError::Step(err) => err,
            TxError::Db(source) => CoreError::Transaction {
                version: migration.version,
                file_name: migration.file_name.clone(),
                source,
            },
        })
    }
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;
