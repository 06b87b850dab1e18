//! tm-core - versioned SQL migrations for Tidemark
//!
//! Discovers `<12-digit-version>_<description>.sql` files, works out which
//! versions are missing from the `migrations_history` ledger, and applies
//! them one transaction at a time in ascending order.

pub mod config;
pub mod error;
pub mod history;
pub mod migrator;
pub mod resolver;
pub mod runner;
pub mod version;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;

pub use config::Config;
pub use error::{CoreError, CoreResult};
pub use history::HistoryStore;
pub use migrator::{MigrationReport, Migrator, StatusReport};
pub use resolver::resolve_pending;
pub use runner::MigrationRunner;
pub use version::{parse_version, MigrationFile, Version};
