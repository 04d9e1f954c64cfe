//! State tracker: the `imm_sequence_tracker` table holding one row per
//! applied revision. The row with the highest `id` is HEAD.

use immigrant_core::{DriverError, Revision, TrackedEntry};
use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, warn};

use crate::schema::TrackerSchema;

const SELECT_HEAD: &str =
    "SELECT id, revisionID, revisionJSON FROM imm_sequence_tracker ORDER BY id DESC LIMIT 1";
const SELECT_HISTORY: &str =
    "SELECT id, revisionID, revisionJSON FROM imm_sequence_tracker ORDER BY id ASC";
const INSERT_ENTRY: &str =
    "INSERT INTO imm_sequence_tracker (revisionID, revisionJSON) VALUES (?1, ?2)";
const DELETE_ENTRY: &str = "DELETE FROM imm_sequence_tracker WHERE id = ?1";

/// A tracker row as stored, before the payload is decoded.
struct RawEntry {
    id: i64,
    revision_id: Option<String>,
    revision_json: Option<String>,
}

impl RawEntry {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            revision_id: row.get(1)?,
            revision_json: row.get(2)?,
        })
    }

    fn decode(self) -> Result<TrackedEntry, DriverError> {
        let sequence = self.id;
        let corrupt = |detail: String| DriverError::CorruptEntry { sequence, detail };
        let revision_id = self
            .revision_id
            .ok_or_else(|| corrupt("revisionID is NULL".into()))?;
        let raw = self
            .revision_json
            .as_deref()
            .ok_or_else(|| corrupt("revisionJSON is NULL".into()))?;
        let revision: Revision =
            serde_json::from_str(raw).map_err(|e| corrupt(format!("invalid JSON: {e}")))?;
        if revision.id() != revision_id {
            return Err(corrupt(format!(
                "revisionID {revision_id} does not match payload ID {}",
                revision.id()
            )));
        }
        Ok(TrackedEntry {
            sequence,
            revision_id,
            revision,
        })
    }
}

/// Create the tracking table if it does not exist yet.
pub fn init_state_manager(conn: &Connection, schema: &TrackerSchema) -> Result<(), DriverError> {
    conn.execute_batch(schema.create_statement())
        .map_err(|e| DriverError::Tracker(format!("create tracker table: {e}")))?;
    debug!("state tracker ready");
    Ok(())
}

/// The entry with the highest sequence.
pub fn head(conn: &Connection) -> Result<TrackedEntry, DriverError> {
    let raw = conn
        .query_row(SELECT_HEAD, [], RawEntry::from_row)
        .optional()
        .map_err(|e| DriverError::StateUnavailable(e.to_string()))?;
    match raw {
        Some(raw) => raw.decode(),
        None => Err(DriverError::HeadDoesNotExist),
    }
}

/// Every tracked entry, oldest first.
pub fn history(conn: &Connection) -> Result<Vec<TrackedEntry>, DriverError> {
    raw_history(conn)?.into_iter().map(RawEntry::decode).collect()
}

/// Revisions to seed a driver's ledger with, oldest first.
///
/// A row whose payload cannot be decoded is mirrored by its stored ID with
/// no statements, so one damaged historical row does not block `init`.
/// `head` and `history` still report it as `CorruptEntry`.
pub fn ledger_revisions(conn: &Connection) -> Result<Vec<Revision>, DriverError> {
    let revisions = raw_history(conn)?
        .into_iter()
        .map(|raw| {
            let sequence = raw.id;
            let stored_id = raw.revision_id.clone().unwrap_or_default();
            match raw.decode() {
                Ok(entry) => entry.revision,
                Err(e) => {
                    warn!(sequence, error = %e, "undecodable tracker entry mirrored by ID");
                    Revision::new(stored_id, Vec::<String>::new(), Vec::<String>::new())
                }
            }
        })
        .collect();
    Ok(revisions)
}

fn raw_history(conn: &Connection) -> Result<Vec<RawEntry>, DriverError> {
    let mut stmt = conn
        .prepare(SELECT_HISTORY)
        .map_err(|e| DriverError::StateUnavailable(e.to_string()))?;
    let rows = stmt
        .query_map([], RawEntry::from_row)
        .map_err(|e| DriverError::StateUnavailable(e.to_string()))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| DriverError::StateUnavailable(e.to_string()))?;
    Ok(rows)
}

/// Append `revision` and return its sequence.
pub fn record(conn: &Connection, revision: &Revision) -> Result<i64, DriverError> {
    let payload = revision.to_json()?;
    conn.execute(INSERT_ENTRY, rusqlite::params![revision.id(), payload])
        .map_err(|e| DriverError::Tracker(format!("record {}: {e}", revision.id())))?;
    Ok(conn.last_insert_rowid())
}

/// Delete the HEAD entry, which must belong to `expected`. Removes exactly
/// one row.
pub fn remove_head(conn: &Connection, expected: &Revision) -> Result<TrackedEntry, DriverError> {
    let entry = match head(conn) {
        Ok(entry) => entry,
        Err(DriverError::HeadDoesNotExist) => return Err(DriverError::NoRevisionsApplied),
        Err(e) => return Err(e),
    };
    if entry.revision_id != expected.id() {
        return Err(DriverError::HeadMismatch {
            head: entry.revision_id,
            requested: expected.id().to_string(),
        });
    }

    let deleted = conn
        .execute(DELETE_ENTRY, [entry.sequence])
        .map_err(|e| DriverError::Tracker(format!("remove {}: {e}", entry.revision_id)))?;
    if deleted != 1 {
        return Err(DriverError::Tracker(format!(
            "expected to remove 1 entry, removed {deleted}"
        )));
    }
    Ok(entry)
}
