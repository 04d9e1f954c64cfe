use std::path::{Path, PathBuf};

use immigrant_core::DriverError;
use rusqlite::hooks::{AuthAction, AuthContext, Authorization};
use rusqlite::Connection;
use tracing::{debug, info};

use crate::config::SqliteConfig;
use crate::schema;

/// SQLite connection exclusively owned by one driver.
pub struct Database {
    conn: Connection,
    path: PathBuf,
}

impl Database {
    /// Open or create the database described by `config`.
    pub fn open(config: &SqliteConfig) -> Result<Self, DriverError> {
        let conn = if config.is_in_memory() {
            Connection::open_in_memory()
                .map_err(|e| DriverError::Connection(e.to_string()))?
        } else {
            if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .map_err(|e| DriverError::Connection(format!("create dir: {e}")))?;
            }
            Connection::open(&config.path)
                .map_err(|e| DriverError::Connection(e.to_string()))?
        };

        conn.busy_timeout(config.busy_timeout)
            .map_err(|e| DriverError::Connection(format!("busy timeout: {e}")))?;

        // First statement that touches the file; an unreadable path fails here.
        conn.execute_batch(schema::PRAGMAS)
            .map_err(|e| DriverError::Connection(format!("pragmas: {e}")))?;

        info!(path = %config.path.display(), "database opened");

        Ok(Self {
            conn,
            path: config.path.clone(),
        })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Run `f` inside one transaction. Commits only if `f` succeeds; any
    /// error rolls the whole unit back.
    pub fn with_tx<F, T>(&mut self, f: F) -> Result<T, DriverError>
    where
        F: FnOnce(&Connection) -> Result<T, DriverError>,
    {
        let tx = self
            .conn
            .transaction()
            .map_err(|e| DriverError::Transaction(format!("begin: {e}")))?;

        // Dropping an uncommitted transaction rolls it back.
        let value = f(&*tx)?;

        tx.commit()
            .map_err(|e| DriverError::Transaction(format!("commit: {e}")))?;
        Ok(value)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn close(self) -> Result<(), DriverError> {
        let path = self.path;
        self.conn
            .close()
            .map_err(|(_, e)| DriverError::Connection(format!("close: {e}")))?;
        debug!(path = %path.display(), "database closed");
        Ok(())
    }
}

/// Refuses transaction control (`BEGIN`, `COMMIT`, `END`, `ROLLBACK`) on
/// `conn` until dropped. Statements are rejected when prepared, before they
/// can end the enclosing transaction.
pub struct TransactionControlGuard<'c> {
    conn: &'c Connection,
}

impl<'c> TransactionControlGuard<'c> {
    pub fn install(conn: &'c Connection) -> Self {
        conn.authorizer(Some(deny_transaction_control));
        Self { conn }
    }
}

impl Drop for TransactionControlGuard<'_> {
    fn drop(&mut self) {
        self.conn
            .authorizer(None::<fn(AuthContext<'_>) -> Authorization>);
    }
}

fn deny_transaction_control(ctx: AuthContext<'_>) -> Authorization {
    match ctx.action {
        AuthAction::Transaction { .. } => Authorization::Deny,
        _ => Authorization::Allow,
    }
}
