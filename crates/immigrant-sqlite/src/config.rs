use std::path::PathBuf;
use std::time::Duration;

use immigrant_core::config::PATH_KEY;
use immigrant_core::{DriverConfig, DriverError};

use crate::schema::TrackerSchema;

/// Overrides the tracker DDL, for dialects whose `CREATE TABLE` differs.
pub const TRACKER_DDL_KEY: &str = "tracker_ddl";
pub const BUSY_TIMEOUT_KEY: &str = "busy_timeout_ms";

/// Path that opens a private in-memory database.
pub const IN_MEMORY_PATH: &str = ":memory:";

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

/// Settings read from a [`DriverConfig`] by the SQLite driver.
#[derive(Clone, Debug)]
pub struct SqliteConfig {
    pub path: PathBuf,
    pub busy_timeout: Duration,
    pub schema: TrackerSchema,
}

impl SqliteConfig {
    /// Keys: `path` (required), `tracker_ddl`, `busy_timeout_ms`.
    /// `fallback_schema` is used when `tracker_ddl` is absent.
    pub fn from_driver_config(
        config: &DriverConfig,
        fallback_schema: &TrackerSchema,
    ) -> Result<Self, DriverError> {
        let path = config.require(PATH_KEY)?;
        if path.trim().is_empty() {
            return Err(DriverError::Config("path is empty".into()));
        }

        let busy_timeout_ms = config
            .get_parsed::<u64>(BUSY_TIMEOUT_KEY)?
            .unwrap_or(DEFAULT_BUSY_TIMEOUT_MS);

        let schema = match config.get(TRACKER_DDL_KEY) {
            Some(ddl) => TrackerSchema::custom(ddl),
            None => fallback_schema.clone(),
        };

        Ok(Self {
            path: PathBuf::from(path),
            busy_timeout: Duration::from_millis(busy_timeout_ms),
            schema,
        })
    }

    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str() == IN_MEMORY_PATH
    }
}
