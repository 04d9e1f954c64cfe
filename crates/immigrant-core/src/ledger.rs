use crate::error::DriverError;
use crate::revision::Revision;

/// In-memory mirror of applied revisions, oldest first.
/// Only ever holds what the backend has committed.
#[derive(Clone, Debug, Default)]
pub struct Ledger {
    revisions: Vec<Revision>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_revisions(revisions: Vec<Revision>) -> Self {
        Self { revisions }
    }

    pub fn push(&mut self, revision: Revision) {
        self.revisions.push(revision);
    }

    pub fn pop(&mut self) -> Option<Revision> {
        self.revisions.pop()
    }

    pub fn head(&self) -> Option<&Revision> {
        self.revisions.last()
    }

    /// Check that `revision` may be rolled back: something is applied and
    /// it is the current HEAD.
    pub fn require_head(&self, revision: &Revision) -> Result<&Revision, DriverError> {
        let head = self.head().ok_or(DriverError::NoRevisionsApplied)?;
        if head.id() != revision.id() {
            return Err(DriverError::HeadMismatch {
                head: head.id().to_string(),
                requested: revision.id().to_string(),
            });
        }
        Ok(head)
    }

    pub fn len(&self) -> usize {
        self.revisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.revisions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Revision> {
        self.revisions.iter()
    }
}
