//! Error types for tm-core

use crate::version::Version;
use std::path::PathBuf;
use thiserror::Error;
use tm_db::DbError;

/// Core error type for Tidemark
#[derive(Error, Debug)]
pub enum CoreError {
    /// C001: Configuration file not found
    #[error("[C001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// C002: Failed to parse configuration file
    #[error("[C002] Failed to parse config: {message}")]
    ConfigParseError { message: String },

    /// C003: Invalid configuration value
    #[error("[C003] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// C004: Configuration file exists but could not be read
    #[error("[C004] Failed to read config file: {path}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// M001: Migrations directory could not be listed
    #[error("[M001] Failed to read migrations directory '{}'", path.display())]
    Discovery {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// M002: File name has no `_` separator or a prefix that is not 12 characters
    #[error("[M002] Migration file must have exactly 12 chars for version: '{file_name}' is invalid")]
    InvalidVersionFormat { file_name: String },

    /// M003: Version prefix is not a number
    #[error("[M003] Failed to convert version prefix '{prefix}' of '{file_name}' to a number")]
    InvalidVersionValue { file_name: String, prefix: String },

    /// M004: Two files in the directory share a version
    #[error("[M004] Duplicate migration version {version}: '{first}' and '{second}'")]
    DuplicateVersionInDirectory {
        version: Version,
        first: String,
        second: String,
    },

    /// M005: Ledger table could not be created or read
    #[error("[M005] Failed to bootstrap migrations_history")]
    LedgerBootstrap(#[source] DbError),

    /// M006: Query for already-applied versions failed
    #[error("[M006] Failed to get pending migrations")]
    PendingResolution(#[source] DbError),

    /// M007: Migration file disappeared or is unreadable
    #[error("[M007] Failed to read migration file '{}'", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// M008: The migration script failed
    #[error("[M008] Failed to run migration '{file_name}' (version {version})")]
    ScriptExecution {
        version: Version,
        file_name: String,
        #[source]
        source: DbError,
    },

    /// M009: Inserting the ledger row failed
    #[error("[M009] Failed to record migration '{file_name}' (version {version})")]
    LedgerRecord {
        version: Version,
        file_name: String,
        #[source]
        source: DbError,
    },

    /// M010: Version already present in the ledger
    #[error("[M010] Migration version {version} ('{file_name}') is already recorded; another run may have applied it")]
    DuplicateVersion { version: Version, file_name: String },

    /// M011: BEGIN or COMMIT failed around a migration
    #[error("[M011] Transaction failed for migration '{file_name}' (version {version})")]
    Transaction {
        version: Version,
        file_name: String,
        #[source]
        source: DbError,
    },
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;

impl From<serde_yaml::Error> for CoreError {
    fn from(err: serde_yaml::Error) -> Self {
        CoreError::ConfigParseError {
            message: err.to_string(),
        }
    }
}
