/// SQL for the migration state tracker.
/// The table name and column layout are read by external tools inspecting
/// migration history and must not change.
pub const TRACKER_TABLE: &str = "imm_sequence_tracker";

pub const SQLITE_TRACKER_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS imm_sequence_tracker (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    revisionID VARCHAR(256) NOT NULL,
    revisionJSON TEXT NOT NULL
);
"#;

pub const PRAGMAS: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
PRAGMA synchronous = NORMAL;
"#;

/// Dialect-specific statement that creates the tracking table.
///
/// Must be safe to run against a database that already has the table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackerSchema {
    create_statement: String,
}

impl TrackerSchema {
    pub fn sqlite() -> Self {
        Self {
            create_statement: SQLITE_TRACKER_DDL.to_string(),
        }
    }

    /// Use caller-supplied DDL. It has to produce `imm_sequence_tracker`
    /// with the `id`, `revisionID` and `revisionJSON` columns.
    pub fn custom(create_statement: impl Into<String>) -> Self {
        Self {
            create_statement: create_statement.into(),
        }
    }

    pub fn create_statement(&self) -> &str {
        &self.create_statement
    }
}

impl Default for TrackerSchema {
    fn default() -> Self {
        Self::sqlite()
    }
}
