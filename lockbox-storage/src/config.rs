//! DuckDB backend configuration.

use crate::error::{StorageError, StorageResult};
use serde::{Deserialize, Serialize};

/// Resource limits applied to an on-disk DuckDB connection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Value for `PRAGMA memory_limit` (e.g., "64MB").
    pub memory_limit: String,

    /// Value for `PRAGMA threads`.
    pub threads: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            // DuckDB defaults to ~80% of RAM per connection
            memory_limit: "64MB".to_string(),
            threads: 1,
        }
    }
}

const SIZE_UNITS: [&str; 6] = ["KB", "MB", "GB", "KiB", "MiB", "GiB"];

impl StoreConfig {
    /// Checks that the values can be spliced into PRAGMA statements.
    ///
    /// `memory_limit` must be a positive integer followed by a size unit,
    /// e.g. `512MB` or `2GiB`; `threads` must be at least 1.
    pub fn validate(&self) -> StorageResult<()> {
        if !is_size(&self.memory_limit) {
            return Err(StorageError::Config(format!(
                "memory_limit must look like 64MB, got {:?}",
                self.memory_limit
            )));
        }
        if self.threads == 0 {
            return Err(StorageError::Config("threads must be at least 1".into()));
        }
        Ok(())
    }
}

fn is_size(value: &str) -> bool {
    let digits_end = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let (number, unit) = value.split_at(digits_end);
    !number.is_empty() && number.bytes().any(|b| b != b'0') && SIZE_UNITS.contains(&unit)
}
