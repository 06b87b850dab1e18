//! Shared test utilities for tm-core

use std::fs;
use std::path::Path;
use std::sync::Mutex;
use tm_db::{DbError, DbResult, Database, DuckDbBackend, SqlParam};

/// One call made against a [`RecordingDatabase`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Batch(String),
    Execute(String),
    Query(String),
}

impl Call {
    pub fn sql(&self) -> &str {
        match self {
            Call::Batch(sql) | Call::Execute(sql) | Call::Query(sql) => sql,
        }
    }
}

/// In-memory DuckDB wrapper that records every call and can be told to fail
/// statements containing a given fragment.
pub struct RecordingDatabase {
    inner: DuckDbBackend,
    calls: Mutex<Vec<Call>>,
    fail_on: Mutex<Option<String>>,
}

impl RecordingDatabase {
    pub fn new() -> Self {
        Self {
            inner: DuckDbBackend::in_memory().unwrap(),
            calls: Mutex::new(Vec::new()),
            fail_on: Mutex::new(None),
        }
    }

    /// Make every statement containing `fragment` fail with an execution error.
    pub fn fail_on(&self, fragment: &str) {
        *self.fail_on.lock().unwrap() = Some(fragment.to_string());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Number of recorded calls whose SQL contains `fragment`.
    pub fn count_containing(&self, fragment: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.sql().contains(fragment))
            .count()
    }

    /// Direct access to the wrapped backend, bypassing recording.
    pub fn inner(&self) -> &DuckDbBackend {
        &self.inner
    }

    fn record(&self, call: Call) -> DbResult<()> {
        let injected = self
            .fail_on
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|fragment| call.sql().contains(fragment.as_str()));
        let sql = call.sql().to_string();
        self.calls.lock().unwrap().push(call);
        if injected {
            return Err(DbError::ExecutionError(format!("injected failure: {sql}")));
        }
        Ok(())
    }
}

impl Default for RecordingDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl Database for RecordingDatabase {
    fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.record(Call::Batch(sql.to_string()))?;
        self.inner.execute_batch(sql)
    }

    fn execute(&self, sql: &str, params: &[SqlParam]) -> DbResult<usize> {
        self.record(Call::Execute(sql.to_string()))?;
        self.inner.execute(sql, params)
    }

    fn query_i64s(&self, sql: &str, params: &[SqlParam]) -> DbResult<Vec<i64>> {
        self.record(Call::Query(sql.to_string()))?;
        self.inner.query_i64s(sql, params)
    }

    fn query_optional_i64(&self, sql: &str, params: &[SqlParam]) -> DbResult<Option<i64>> {
        self.record(Call::Query(sql.to_string()))?;
        self.inner.query_optional_i64(sql, params)
    }

    fn db_type(&self) -> &'static str {
        "recording"
    }
}

/// Write a migration file into `dir`.
pub fn write_migration(dir: &Path, file_name: &str, sql: &str) {
    fs::write(dir.join(file_name), sql).unwrap();
}

/// Versions currently in the ledger, ascending.
pub fn ledger_versions(db: &dyn Database) -> Vec<i64> {
    db.query_i64s("SELECT version FROM migrations_history ORDER BY version", &[])
        .unwrap()
}

/// Count rows of a table.
pub fn row_count(db: &dyn Database, table: &str) -> i64 {
    db.query_optional_i64(&format!("SELECT COUNT(*) FROM {table}"), &[])
        .unwrap()
        .unwrap_or(0)
}
