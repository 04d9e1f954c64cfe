use crate::config::DriverConfig;
use crate::error::DriverError;
use crate::revision::Revision;

/// Contract every storage backend implements.
///
/// Lifecycle: constructed uninitialized, bound once by [`Driver::init`],
/// used for any number of migrate/rollback/state calls, released by
/// [`Driver::close`]. Calls outside that window return
/// [`DriverError::NotInitialized`], [`DriverError::Closed`] or
/// [`DriverError::Unusable`].
///
/// Implementations are driven by a single caller; the handle is not shared
/// across threads.
pub trait Driver: Send {
    /// Bind to the backend described by `config`. A failure here leaves the
    /// instance permanently unusable.
    fn init(&mut self, config: &DriverConfig) -> Result<(), DriverError>;

    /// Apply `revision`'s forward statements as one atomic unit and record
    /// it as HEAD. On failure nothing is applied and nothing is recorded.
    fn migrate(&mut self, revision: &Revision) -> Result<(), DriverError>;

    /// Apply `revision`'s reverse statements as one atomic unit and drop
    /// the most recent history entry. `revision` must be the current HEAD.
    fn rollback(&mut self, revision: &Revision) -> Result<(), DriverError>;

    /// The most recently applied revision.
    ///
    /// [`DriverError::HeadDoesNotExist`] means nothing is applied;
    /// [`DriverError::StateUnavailable`] means the backend could not answer.
    fn state(&self) -> Result<Revision, DriverError>;

    /// Release the backend handle. Calling it again is a no-op.
    fn close(&mut self) -> Result<(), DriverError>;
}

impl<D: Driver + ?Sized> Driver for Box<D> {
    fn init(&mut self, config: &DriverConfig) -> Result<(), DriverError> {
        (**self).init(config)
    }

    fn migrate(&mut self, revision: &Revision) -> Result<(), DriverError> {
        (**self).migrate(revision)
    }

    fn rollback(&mut self, revision: &Revision) -> Result<(), DriverError> {
        (**self).rollback(revision)
    }

    fn state(&self) -> Result<Revision, DriverError> {
        (**self).state()
    }

    fn close(&mut self) -> Result<(), DriverError> {
        (**self).close()
    }
}
