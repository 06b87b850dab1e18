//! Database trait definition

use crate::error::{DbError, DbResult};

/// A bound parameter for [`Database::execute`] and the query helpers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlParam {
    Int(i64),
    Text(String),
    Null,
}

impl From<i64> for SqlParam {
    fn from(v: i64) -> Self {
        SqlParam::Int(v)
    }
}

impl From<&str> for SqlParam {
    fn from(v: &str) -> Self {
        SqlParam::Text(v.to_string())
    }
}

impl From<String> for SqlParam {
    fn from(v: String) -> Self {
        SqlParam::Text(v)
    }
}

impl<T: Into<SqlParam>> From<Option<T>> for SqlParam {
    fn from(v: Option<T>) -> Self {
        v.map_or(SqlParam::Null, Into::into)
    }
}

/// Database capability consumed by the migration engine.
///
/// All calls block. A transaction opened with [`begin`](Database::begin)
/// covers every statement issued on the same handle until it is committed or
/// rolled back.
pub trait Database: Send + Sync {
    /// Execute one or more raw SQL statements with no parameters
    fn execute_batch(&self, sql: &str) -> DbResult<()>;

    /// Execute a single parameterized statement, returns affected rows
    fn execute(&self, sql: &str, params: &[SqlParam]) -> DbResult<usize>;

    /// Run a parameterized query and read the first column of every row as
    /// an integer. NULL values are skipped.
    fn query_i64s(&self, sql: &str, params: &[SqlParam]) -> DbResult<Vec<i64>>;

    /// Run a parameterized query and read the first column of the first row.
    ///
    /// Returns `None` for an empty result or a NULL value.
    fn query_optional_i64(&self, sql: &str, params: &[SqlParam]) -> DbResult<Option<i64>>;

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;

    /// Open a transaction on this handle
    fn begin(&self) -> DbResult<()> {
        self.execute_batch("BEGIN TRANSACTION")
            .map_err(|e| DbError::TransactionError(format!("BEGIN failed: {e}")))
    }

    /// Commit the open transaction
    fn commit(&self) -> DbResult<()> {
        self.execute_batch("COMMIT")
            .map_err(|e| DbError::TransactionError(format!("COMMIT failed: {e}")))
    }

    /// Roll back the open transaction
    fn rollback(&self) -> DbResult<()> {
        self.execute_batch("ROLLBACK")
            .map_err(|e| DbError::TransactionError(format!("ROLLBACK failed: {e}")))
    }
}

/// Execute `body` between `BEGIN` and `COMMIT`, rolling back on error.
///
/// A failed `COMMIT` is also rolled back. Errors from `body` are returned
/// unchanged so callers keep their own error types; `E` only needs to absorb
/// the [`DbError`] raised by `BEGIN`/`COMMIT`.
pub fn with_transaction<D, F, T, E>(db: &D, body: F) -> Result<T, E>
where
    D: Database + ?Sized,
    F: FnOnce(&D) -> Result<T, E>,
    E: From<DbError>,
{
    db.begin()?;

    match body(db) {
        Ok(value) => {
            if let Err(commit_err) = db.commit() {
                if let Err(rollback_err) = db.rollback() {
                    log::warn!("ROLLBACK after failed COMMIT also failed: {rollback_err}");
                }
                return Err(commit_err.into());
            }
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = db.rollback() {
                log::warn!("ROLLBACK failed: {rollback_err}");
            }
            Err(err)
        }
    }
}
