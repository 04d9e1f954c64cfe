use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DriverError;

/// Which statement list of a revision a unit of work runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Migrate,
    Rollback,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Migrate => f.write_str("migrate"),
            Self::Rollback => f.write_str("rollback"),
        }
    }
}

/// An immutable, identified unit of forward and reverse schema statements.
///
/// The JSON form uses the `ID` / `Migrate` / `Rollback` field names; it is
/// both the revision file format and the payload stored by state trackers.
/// Forward and reverse lists are expected to undo each other, which is
/// never checked.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Revision {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Migrate", default)]
    migrate: Vec<String>,
    #[serde(rename = "Rollback", default)]
    rollback: Vec<String>,
}

impl Revision {
    pub fn new<M, R>(id: impl Into<String>, migrate: M, rollback: R) -> Self
    where
        M: IntoIterator,
        M::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            id: id.into(),
            migrate: migrate.into_iter().map(Into::into).collect(),
            rollback: rollback.into_iter().map(Into::into).collect(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn migrate_statements(&self) -> &[String] {
        &self.migrate
    }

    pub fn rollback_statements(&self) -> &[String] {
        &self.rollback
    }

    /// Statements for the given direction, in execution order.
    pub fn statements(&self, direction: Direction) -> &[String] {
        match direction {
            Direction::Migrate => &self.migrate,
            Direction::Rollback => &self.rollback,
        }
    }

    pub fn to_json(&self) -> Result<String, DriverError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self, DriverError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Load a revision from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, DriverError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| DriverError::Io(format!("read {}: {e}", path.display())))?;
        Self::from_json(&raw)
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Durable record of one applied revision.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackedEntry {
    /// Store-assigned ordering key; the highest one is HEAD.
    pub sequence: i64,
    pub revision_id: String,
    pub revision: Revision,
}
