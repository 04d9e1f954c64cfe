use std::path::Path;

use immigrant_core::{
    Direction, Driver, DriverConfig, DriverError, Ledger, Lifecycle, Revision, TrackedEntry,
};
use rusqlite::Connection;
use tracing::{debug, info, instrument};

use crate::config::SqliteConfig;
use crate::database::{Database, TransactionControlGuard};
use crate::schema::TrackerSchema;
use crate::tracker;

/// Live state of an initialized driver.
struct Bound {
    db: Database,
    ledger: Ledger,
}

/// Driver backed by a SQLite database.
///
/// Each migrate/rollback runs in one SQLite transaction together with the
/// tracker write, so a revision's statements and its history entry commit
/// or vanish as a unit. The ledger is loaded from the tracker at `init` and
/// only updated after a commit.
pub struct SqliteDriver {
    inner: Lifecycle<Bound>,
    schema: TrackerSchema,
}

impl SqliteDriver {
    pub fn new() -> Self {
        Self {
            inner: Lifecycle::default(),
            schema: TrackerSchema::sqlite(),
        }
    }

    /// Use `schema` to create the tracker unless the config sets `tracker_ddl`.
    pub fn with_schema(schema: TrackerSchema) -> Self {
        Self {
            inner: Lifecycle::default(),
            schema,
        }
    }

    /// Tracked history, oldest first, read from the database.
    pub fn history(&self) -> Result<Vec<TrackedEntry>, DriverError> {
        tracker::history(self.inner.ready()?.db.conn())
    }

    /// Number of applied revisions according to the ledger.
    pub fn applied_count(&self) -> Result<usize, DriverError> {
        Ok(self.inner.ready()?.ledger.len())
    }

    pub fn path(&self) -> Result<&Path, DriverError> {
        Ok(self.inner.ready()?.db.path())
    }

    fn bind(&self, config: &DriverConfig) -> Result<Bound, DriverError> {
        let config = SqliteConfig::from_driver_config(config, &self.schema)?;
        let db = Database::open(&config)?;
        tracker::init_state_manager(db.conn(), &config.schema)?;
        let ledger = Ledger::from_revisions(tracker::ledger_revisions(db.conn())?);
        Ok(Bound { db, ledger })
    }
}

impl Default for SqliteDriver {
    fn default() -> Self {
        Self::new()
    }
}

/// Execute one direction of `revision`, stopping at the first failure.
/// Statements may not end the enclosing transaction.
fn run_unit(conn: &Connection, revision: &Revision, direction: Direction) -> Result<(), DriverError> {
    let _guard = TransactionControlGuard::install(conn);
    for (index, statement) in revision.statements(direction).iter().enumerate() {
        let failed = |message: String| DriverError::Statement {
            revision: revision.id().to_string(),
            direction,
            index,
            statement: statement.clone(),
            message,
        };
        debug!(index, statement = %statement, "executing");
        conn.execute_batch(statement)
            .map_err(|e| failed(e.to_string()))?;
        if conn.is_autocommit() {
            return Err(failed("statement ended the enclosing transaction".into()));
        }
    }
    Ok(())
}

impl Driver for SqliteDriver {
    #[instrument(skip_all, name = "sqlite.init")]
    fn init(&mut self, config: &DriverConfig) -> Result<(), DriverError> {
        self.inner.ensure_uninitialized()?;
        match self.bind(config) {
            Ok(bound) => {
                info!(applied = bound.ledger.len(), "driver initialized");
                self.inner.bind(bound);
                Ok(())
            }
            Err(e) => {
                self.inner.fail(e.to_string());
                Err(e)
            }
        }
    }

    #[instrument(skip_all, name = "sqlite.migrate", fields(revision = %revision))]
    fn migrate(&mut self, revision: &Revision) -> Result<(), DriverError> {
        let bound = self.inner.ready_mut()?;
        let sequence = bound.db.with_tx(|conn| {
            run_unit(conn, revision, Direction::Migrate)?;
            tracker::record(conn, revision)
        })?;
        bound.ledger.push(revision.clone());
        info!(sequence, "revision applied");
        Ok(())
    }

    #[instrument(skip_all, name = "sqlite.rollback", fields(revision = %revision))]
    fn rollback(&mut self, revision: &Revision) -> Result<(), DriverError> {
        let bound = self.inner.ready_mut()?;
        bound.ledger.require_head(revision)?;
        let removed = bound.db.with_tx(|conn| {
            run_unit(conn, revision, Direction::Rollback)?;
            tracker::remove_head(conn, revision)
        })?;
        bound.ledger.pop();
        info!(sequence = removed.sequence, "revision rolled back");
        Ok(())
    }

    fn state(&self) -> Result<Revision, DriverError> {
        let bound = self.inner.ready()?;
        tracker::head(bound.db.conn()).map(|entry| entry.revision)
    }

    fn close(&mut self) -> Result<(), DriverError> {
        match self.inner.close() {
            Some(bound) => bound.db.close(),
            None => Ok(()),
        }
    }
}
