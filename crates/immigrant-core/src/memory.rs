use std::collections::HashSet;

use tracing::{debug, instrument};

use crate::config::DriverConfig;
use crate::driver::Driver;
use crate::error::DriverError;
use crate::ledger::Ledger;
use crate::lifecycle::Lifecycle;
use crate::revision::{Direction, Revision};

/// Driver whose ledger is the only state. Used to test callers of the
/// [`Driver`] contract without a real backend.
#[derive(Debug, Default)]
pub struct MemoryDriver {
    ledger: Lifecycle<Ledger>,
    failing: HashSet<String>,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make any unit containing `statement` fail at that statement.
    pub fn fail_on(mut self, statement: impl Into<String>) -> Self {
        self.failing.insert(statement.into());
        self
    }

    /// Applied revisions, oldest first.
    pub fn applied(&self) -> Result<Vec<Revision>, DriverError> {
        Ok(self.ledger.ready()?.iter().cloned().collect())
    }

    pub fn applied_count(&self) -> Result<usize, DriverError> {
        Ok(self.ledger.ready()?.len())
    }

    fn check_statements(&self, revision: &Revision, direction: Direction) -> Result<(), DriverError> {
        for (index, statement) in revision.statements(direction).iter().enumerate() {
            if self.failing.contains(statement) {
                return Err(DriverError::Statement {
                    revision: revision.id().to_string(),
                    direction,
                    index,
                    statement: statement.clone(),
                    message: "injected failure".into(),
                });
            }
            debug!(index, statement = %statement, "statement accepted");
        }
        Ok(())
    }
}

impl Driver for MemoryDriver {
    #[instrument(skip_all, name = "memory.init")]
    fn init(&mut self, _config: &DriverConfig) -> Result<(), DriverError> {
        self.ledger.ensure_uninitialized()?;
        self.ledger.bind(Ledger::new());
        Ok(())
    }

    #[instrument(skip_all, name = "memory.migrate", fields(revision = %revision))]
    fn migrate(&mut self, revision: &Revision) -> Result<(), DriverError> {
        self.ledger.ready()?;
        self.check_statements(revision, Direction::Migrate)?;
        self.ledger.ready_mut()?.push(revision.clone());
        Ok(())
    }

    #[instrument(skip_all, name = "memory.rollback", fields(revision = %revision))]
    fn rollback(&mut self, revision: &Revision) -> Result<(), DriverError> {
        self.ledger.ready()?.require_head(revision)?;
        self.check_statements(revision, Direction::Rollback)?;
        self.ledger.ready_mut()?.pop();
        Ok(())
    }

    fn state(&self) -> Result<Revision, DriverError> {
        self.ledger
            .ready()?
            .head()
            .cloned()
            .ok_or(DriverError::HeadDoesNotExist)
    }

    fn close(&mut self) -> Result<(), DriverError> {
        self.ledger.close();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r1() -> Revision {
        Revision::new("r1", ["create table t"], ["drop table t"])
    }

    fn ready() -> MemoryDriver {
        let mut driver = MemoryDriver::new();
        driver.init(&DriverConfig::new()).unwrap();
        driver
    }

    #[test]
    fn migrate_state_rollback_scenario() {
        let mut driver = ready();

        driver.migrate(&r1()).unwrap();
        assert_eq!(driver.applied_count().unwrap(), 1);
        assert_eq!(driver.state().unwrap(), r1());

        driver.rollback(&r1()).unwrap();
        assert_eq!(driver.applied_count().unwrap(), 0);

        let err = driver.rollback(&r1()).unwrap_err();
        assert_eq!(err, DriverError::NoRevisionsApplied);
        assert_eq!(err.to_string(), "No revisions applied.");
    }

    #[test]
    fn fresh_driver_has_no_head() {
        let driver = ready();
        assert_eq!(driver.state().unwrap_err(), DriverError::HeadDoesNotExist);
    }

    #[test]
    fn state_tracks_latest_and_previous() {
        let mut driver = ready();
        let r2 = Revision::new("r2", ["alter table t add c"], ["alter table t drop c"]);
        driver.migrate(&r1()).unwrap();
        driver.migrate(&r2).unwrap();
        assert_eq!(driver.state().unwrap().id(), "r2");

        driver.rollback(&r2).unwrap();
        assert_eq!(driver.state().unwrap().id(), "r1");
    }

    #[test]
    fn rollback_of_non_head_is_rejected() {
        let mut driver = ready();
        let r2 = Revision::new("r2", ["x"], ["y"]);
        driver.migrate(&r1()).unwrap();
        driver.migrate(&r2).unwrap();

        let err = driver.rollback(&r1()).unwrap_err();
        assert!(matches!(err, DriverError::HeadMismatch { .. }));
        assert_eq!(driver.applied_count().unwrap(), 2);
    }

    #[test]
    fn injected_failure_leaves_ledger_untouched() {
        let mut driver = MemoryDriver::new().fail_on("boom");
        driver.init(&DriverConfig::new()).unwrap();
        driver.migrate(&r1()).unwrap();

        let bad = Revision::new("r2", ["ok", "boom", "never"], ["undo"]);
        let err = driver.migrate(&bad).unwrap_err();
        assert!(matches!(err, DriverError::Statement { index: 1, .. }));
        assert_eq!(driver.applied().unwrap(), vec![r1()]);
        assert_eq!(driver.state().unwrap(), r1());
    }

    #[test]
    fn operations_before_init_fail() {
        let mut driver = MemoryDriver::new();
        assert_eq!(driver.migrate(&r1()).unwrap_err(), DriverError::NotInitialized);
        assert_eq!(driver.rollback(&r1()).unwrap_err(), DriverError::NotInitialized);
        assert_eq!(driver.state().unwrap_err(), DriverError::NotInitialized);
    }

    #[test]
    fn double_init_fails() {
        let mut driver = ready();
        assert_eq!(
            driver.init(&DriverConfig::new()).unwrap_err(),
            DriverError::AlreadyInitialized
        );
    }

    #[test]
    fn close_is_idempotent_and_final() {
        let mut driver = ready();
        driver.close().unwrap();
        driver.close().unwrap();
        assert_eq!(driver.migrate(&r1()).unwrap_err(), DriverError::Closed);
        assert_eq!(driver.state().unwrap_err(), DriverError::Closed);
    }

    #[test]
    fn usable_through_trait_object() {
        let mut driver: Box<dyn Driver> = Box::new(MemoryDriver::new());
        driver.init(&DriverConfig::new()).unwrap();
        driver.migrate(&r1()).unwrap();
        assert_eq!(driver.state().unwrap().id(), "r1");
        driver.close().unwrap();
    }
}
