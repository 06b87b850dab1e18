//! Migration file names and their version prefixes.

use crate::error::{CoreError, CoreResult};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Number of characters in a version prefix.
pub const VERSION_WIDTH: usize = 12;

/// Separator between the version prefix and the description.
pub const VERSION_SEPARATOR: char = '_';

/// Numeric version of a migration, e.g. `202401150930`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn as_i64(self) -> i64 {
        self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A migration script found on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationFile {
    pub version: Version,
    pub file_name: String,
    #[serde(skip)]
    pub path: PathBuf,
}

/// Parse the version prefix of a migration file name.
///
/// The prefix is everything before the first `_` and must be exactly
/// [`VERSION_WIDTH`] ASCII digits.
pub fn parse_version(file_name: &str) -> CoreResult<Version> {
    let Some((prefix, _)) = file_name.split_once(VERSION_SEPARATOR) else {
        return Err(CoreError::InvalidVersionFormat {
            file_name: file_name.to_string(),
        });
    };

    if prefix.chars().count() != VERSION_WIDTH {
        return Err(CoreError::InvalidVersionFormat {
            file_name: file_name.to_string(),
        });
    }

    let invalid_value = || CoreError::InvalidVersionValue {
        file_name: file_name.to_string(),
        prefix: prefix.to_string(),
    };

    // i64::from_str accepts a leading sign, which is not a valid version
    if !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid_value());
    }

    prefix
        .parse::<i64>()
        .map(Version)
        .map_err(|_| invalid_value())
}

#[cfg(test)]
#[path = "version_test.rs"]
mod tests;
